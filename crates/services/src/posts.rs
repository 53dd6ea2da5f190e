//! # Post Service
//!
//! Reading, editing, deleting and liking posts. Creation lives in
//! [`crate::ingestion`].

use std::collections::HashSet;
use std::sync::Arc;

use domains::{
    CommentRepository, Identity, LikeRepository, LikeStatus, LikeTarget, Post, PostPage,
    PostRepository, Result, ServiceError, Sidebar, Tag, TagRepository,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::ingestion::validator;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        tags: Arc<dyn TagRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            posts,
            tags,
            comments,
            likes,
        }
    }

    /// Newest first. An unknown tag slug is reported as `NotFound`.
    pub async fn feed(&self, tag: Option<&str>) -> Result<(Option<Tag>, Vec<Post>)> {
        let tag = match tag {
            Some(slug) => Some(
                self.tags
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Tag", slug.to_string()))?,
            ),
            None => None,
        };
        let posts = self.posts.list(tag.as_ref().map(|t| t.slug.clone())).await?;
        Ok((tag, posts))
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<PostPage> {
        let post = self.find(id).await?;
        let comments = self.comments.list_for_post(id).await?;
        Ok(PostPage { post, comments })
    }

    /// Posts with at least one like, most liked first.
    pub async fn top_posts(&self) -> Result<Vec<Post>> {
        Ok(self.posts.top_by_likes(None).await?)
    }

    pub async fn sidebar(&self) -> Result<Sidebar> {
        Ok(Sidebar {
            categories: self.tags.list().await?,
            top_posts: self.posts.top_by_likes(None).await?,
            top_comments: self.comments.top_by_likes(None).await?,
        })
    }

    #[instrument(skip(self, identity, caption, tags), fields(user = %identity.username))]
    pub async fn edit(
        &self,
        identity: &Identity,
        id: Uuid,
        caption: &str,
        tags: &[String],
    ) -> Result<Post> {
        let post = self.find(id).await?;
        if !post.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("only the author may edit a post".into()));
        }

        let known: HashSet<String> = self.tags.list().await?.into_iter().map(|t| t.slug).collect();
        let (body, tag_slugs) = validator::validate_edit(caption, tags, &known)?;

        self.posts.update_body_and_tags(id, body, tag_slugs).await?;
        info!(post_id = %id, "post edited");
        self.find(id).await
    }

    #[instrument(skip(self, identity), fields(user = %identity.username))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<()> {
        let post = self.find(id).await?;
        if !post.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("only the author may delete a post".into()));
        }
        if !self.posts.delete(id).await? {
            return Err(ServiceError::NotFound("Post", id.to_string()));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Adds the like when absent, removes it when present.
    #[instrument(skip(self, identity), fields(user = %identity.username))]
    pub async fn toggle_like(&self, identity: &Identity, id: Uuid) -> Result<LikeStatus> {
        let post = self.find(id).await?;
        if post.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("you cannot like your own post".into()));
        }
        Ok(self.likes.toggle(LikeTarget::Post(id), identity.id).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        Author, MockCommentRepository, MockLikeRepository, MockPostRepository,
        MockTagRepository,
    };

    fn identity(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: name.into(),
            email: None,
        }
    }

    fn post_by(owner: &Identity) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "Sunset".into(),
            artist: "Jane".into(),
            url: "https://example.com/photo/1".into(),
            image: "https://live.staticflickr.com/x.jpg".into(),
            body: "nice".into(),
            author: Some(Author {
                id: owner.id,
                username: owner.username.clone(),
            }),
            tags: vec![],
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    fn nature() -> Tag {
        Tag {
            slug: "nature".into(),
            name: "Nature".into(),
            position: None,
            icon: None,
        }
    }

    struct Mocks {
        posts: MockPostRepository,
        tags: MockTagRepository,
        comments: MockCommentRepository,
        likes: MockLikeRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                posts: MockPostRepository::new(),
                tags: MockTagRepository::new(),
                comments: MockCommentRepository::new(),
                likes: MockLikeRepository::new(),
            }
        }

        fn service(self) -> PostService {
            PostService::new(
                Arc::new(self.posts),
                Arc::new(self.tags),
                Arc::new(self.comments),
                Arc::new(self.likes),
            )
        }
    }

    #[tokio::test]
    async fn feed_with_unknown_tag_is_not_found() {
        let mut m = Mocks::new();
        m.tags.expect_find_by_slug().returning(|_| Ok(None));
        m.posts.expect_list().never();

        let err = m.service().feed(Some("space")).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Tag", "space".into()));
    }

    #[tokio::test]
    async fn feed_filters_by_known_tag() {
        let mut m = Mocks::new();
        m.tags.expect_find_by_slug().returning(|_| Ok(Some(nature())));
        m.posts
            .expect_list()
            .withf(|tag| tag.as_deref() == Some("nature"))
            .returning(|_| Ok(vec![]));

        let (tag, posts) = m.service().feed(Some("nature")).await.unwrap();
        assert_eq!(tag.map(|t| t.slug), Some("nature".to_string()));
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn only_owner_may_delete() {
        let owner = identity("jane");
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.posts.expect_delete().never();

        let err = m.service().delete(&identity("mallory"), id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owner_deletes_post() {
        let owner = identity("jane");
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.posts.expect_delete().times(1).returning(|_| Ok(true));

        m.service().delete(&owner, id).await.unwrap();
    }

    #[tokio::test]
    async fn edit_validates_before_writing() {
        let owner = identity("jane");
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.tags.expect_list().returning(|| Ok(vec![nature()]));
        m.posts.expect_update_body_and_tags().never();

        let err = m
            .service()
            .edit(&owner, id, "  ", &["nature".into()])
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(v) => assert_eq!(v.fields(), vec!["caption"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn edit_replaces_caption_and_tags() {
        let owner = identity("jane");
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.tags.expect_list().returning(|| Ok(vec![nature()]));
        m.posts
            .expect_update_body_and_tags()
            .withf(move |pid, body, tags| *pid == id && body == "better" && tags == &vec!["nature".to_string()])
            .times(1)
            .returning(|_, _, _| Ok(()));

        m.service()
            .edit(&owner, id, " better ", &["nature".into()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn authors_cannot_like_their_own_post() {
        let owner = identity("jane");
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.likes.expect_toggle().never();

        let err = m.service().toggle_like(&owner, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn others_toggle_like() {
        let owner = identity("jane");
        let fan = identity("sam");
        let fan_id = fan.id;
        let post = post_by(&owner);
        let id = post.id;

        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        m.likes
            .expect_toggle()
            .withf(move |target, user| *target == LikeTarget::Post(id) && *user == fan_id)
            .returning(|_, _| Ok(LikeStatus { liked: true, count: 1 }));

        let status = m.service().toggle_like(&fan, id).await.unwrap();
        assert_eq!(status, LikeStatus { liked: true, count: 1 });
    }

    #[tokio::test]
    async fn get_missing_post_is_not_found() {
        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(|_| Ok(None));
        m.comments.expect_list_for_post().never();

        let id = Uuid::new_v4();
        let err = m.service().get(id).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Post", id.to_string()));
    }
}
