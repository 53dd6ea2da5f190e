//! # Comment Service
//!
//! Comments hang off posts, replies hang off comments. Both are owner-deleted
//! and liked the same way posts are.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Comment, CommentRepository, Identity, LikeRepository, LikeStatus, LikeTarget, NewComment,
    NewReply, PostRepository, Reply, Result, ServiceError, ValidationErrors,
};
use tracing::{info, instrument};
use uuid::Uuid;

pub const MAX_BODY_LEN: usize = 150;

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
        }
    }

    #[instrument(skip(self, identity, body), fields(user = %identity.username))]
    pub async fn add_comment(&self, identity: &Identity, post_id: Uuid, body: &str) -> Result<Comment> {
        let body = check_body(body)?;
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("Post", post_id.to_string()));
        }
        let comment = self
            .comments
            .create_comment(NewComment {
                id: Uuid::new_v4(),
                post_id,
                author_id: identity.id,
                body,
                created_at: Utc::now(),
            })
            .await?;
        info!(comment_id = %comment.id, %post_id, "comment added");
        Ok(comment)
    }

    /// Returns the reply together with the post it belongs to.
    #[instrument(skip(self, identity, body), fields(user = %identity.username))]
    pub async fn add_reply(
        &self,
        identity: &Identity,
        comment_id: Uuid,
        body: &str,
    ) -> Result<(Uuid, Reply)> {
        let body = check_body(body)?;
        let parent = self.find_comment(comment_id).await?;
        let reply = self
            .comments
            .create_reply(NewReply {
                id: Uuid::new_v4(),
                comment_id,
                author_id: identity.id,
                body,
                created_at: Utc::now(),
            })
            .await?;
        info!(reply_id = %reply.id, %comment_id, "reply added");
        Ok((parent.post_id, reply))
    }

    /// Deletes the comment and its replies; returns the owning post id.
    #[instrument(skip(self, identity), fields(user = %identity.username))]
    pub async fn delete_comment(&self, identity: &Identity, id: Uuid) -> Result<Uuid> {
        let comment = self.find_comment(id).await?;
        if !comment.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("only the author may delete a comment".into()));
        }
        if !self.comments.delete_comment(id).await? {
            return Err(ServiceError::NotFound("Comment", id.to_string()));
        }
        info!(comment_id = %id, "comment deleted");
        Ok(comment.post_id)
    }

    /// Deletes the reply; returns the post the parent comment belongs to.
    #[instrument(skip(self, identity), fields(user = %identity.username))]
    pub async fn delete_reply(&self, identity: &Identity, id: Uuid) -> Result<Uuid> {
        let reply = self.find_reply(id).await?;
        if !reply.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("only the author may delete a reply".into()));
        }
        let parent = self.find_comment(reply.comment_id).await?;
        if !self.comments.delete_reply(id).await? {
            return Err(ServiceError::NotFound("Reply", id.to_string()));
        }
        info!(reply_id = %id, "reply deleted");
        Ok(parent.post_id)
    }

    pub async fn toggle_comment_like(&self, identity: &Identity, id: Uuid) -> Result<LikeStatus> {
        let comment = self.find_comment(id).await?;
        if comment.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("you cannot like your own comment".into()));
        }
        Ok(self.likes.toggle(LikeTarget::Comment(id), identity.id).await?)
    }

    pub async fn toggle_reply_like(&self, identity: &Identity, id: Uuid) -> Result<LikeStatus> {
        let reply = self.find_reply(id).await?;
        if reply.is_owned_by(identity.id) {
            return Err(ServiceError::Forbidden("you cannot like your own reply".into()));
        }
        Ok(self.likes.toggle(LikeTarget::Reply(id), identity.id).await?)
    }

    /// Comments with at least one like, most liked first.
    pub async fn top_comments(&self, author: Option<Uuid>) -> Result<Vec<Comment>> {
        Ok(self.comments.top_by_likes(author).await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Comment> {
        self.comments
            .find_comment(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment", id.to_string()))
    }

    async fn find_reply(&self, id: Uuid) -> Result<Reply> {
        self.comments
            .find_reply(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Reply", id.to_string()))
    }
}

fn check_body(body: &str) -> std::result::Result<String, ValidationErrors> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ValidationErrors::single("body", "This field is required."));
    }
    let len = body.chars().count();
    if len > MAX_BODY_LEN {
        return Err(ValidationErrors::single(
            "body",
            format!("Ensure this value has at most {MAX_BODY_LEN} characters (it has {len})."),
        ));
    }
    Ok(body.to_string())
}
