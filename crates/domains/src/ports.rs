//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Mocks are generated for tests and for crates enabling the `testing` feature.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::{AuthError, FetchError, PersistenceError};
use crate::models::{
    Comment, Identity, LikeStatus, LikeTarget, NewComment, NewPost, NewReply, Post, Profile,
    ProfileChanges, Reply, Tag,
};

type StoreResult<T> = std::result::Result<T, PersistenceError>;

/// Data persistence contract for posts and their tag associations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Writes the post and every tag association atomically.
    async fn create_with_tags(&self, post: NewPost) -> StoreResult<Post>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Post>>;
    /// Newest first, optionally restricted to one tag.
    async fn list(&self, tag: Option<String>) -> StoreResult<Vec<Post>>;
    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Post>>;
    /// Posts with at least one like, most liked first.
    async fn top_by_likes(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Post>>;
    /// Posts liked by `user_id`, most recent like first.
    async fn liked_by(&self, user_id: Uuid) -> StoreResult<Vec<Post>>;
    /// Replaces caption and tag set atomically.
    async fn update_body_and_tags(
        &self,
        id: Uuid,
        body: String,
        tag_slugs: Vec<String>,
    ) -> StoreResult<()>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Data persistence contract for tags.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Tag>>;
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Tag>>;
    /// Inserts or replaces by slug.
    async fn upsert(&self, tag: Tag) -> StoreResult<()>;
}

/// Data persistence contract for comments and replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn create_reply(&self, reply: NewReply) -> StoreResult<Reply>;
    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    async fn find_reply(&self, id: Uuid) -> StoreResult<Option<Reply>>;
    /// Comments of a post with their replies, newest first.
    async fn list_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>>;
    /// Comments with at least one like, most liked first.
    async fn top_by_likes(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_reply(&self, id: Uuid) -> StoreResult<bool>;
}

/// Like join records for posts, comments and replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Adds the like when absent, removes it when present.
    async fn toggle(&self, target: LikeTarget, user_id: Uuid) -> StoreResult<LikeStatus>;
}

/// Local user records and their profiles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Upserts the user; creates the profile on first sight and mirrors the
    /// identity's email onto it afterwards.
    async fn register(&self, identity: Identity) -> StoreResult<Profile>;
    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    async fn find_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>>;
    /// Returns the id of the user owning `email`, if any.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Uuid>>;
    /// Writes the profile and mirrors the email onto the user record.
    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> StoreResult<Profile>;
    async fn delete_user(&self, user_id: Uuid) -> StoreResult<bool>;
}

/// Retrieval of remote HTML documents.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Turns a presented credential into an authenticated principal.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> std::result::Result<Identity, AuthError>;
}
