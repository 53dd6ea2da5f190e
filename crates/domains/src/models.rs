//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Gallery.
//! Posts, comments and replies use UUID v4 identifiers; users carry the
//! identifier handed out by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}

/// Display data for the owner of a post, comment or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

/// A category attachable to posts (e.g. "nature", "city").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique URL slug, also the identifier used by submissions
    pub slug: String,
    pub name: String,
    /// Lower values are listed first; tags without a position go last
    pub position: Option<i64>,
    /// Path or URL of the tag icon
    pub icon: Option<String>,
}

/// A persisted post: an externally sourced image paired with a caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    /// The page the metadata was extracted from
    pub url: String,
    /// The cover image found on that page
    pub image: String,
    pub body: String,
    /// `None` once the owning user has been deleted
    pub author: Option<Author>,
    pub tags: Vec<Tag>,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author.as_ref().is_some_and(|a| a.id == user_id)
    }

    pub fn tag_slugs(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.slug.as_str()).collect()
    }
}

/// A fully assembled post ready to be written together with its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub url: String,
    pub image: String,
    pub body: String,
    pub author_id: Uuid,
    pub tag_slugs: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: Option<Author>,
    pub body: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    /// Newest first; empty when loaded outside of a post page
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author.as_ref().is_some_and(|a| a.id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author: Option<Author>,
    pub body: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author.as_ref().is_some_and(|a| a.id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The entity a like join record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Post(Uuid),
    Comment(Uuid),
    Reply(Uuid),
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub count: i64,
}

/// Supplementary display data, one-to-one with a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Mirrored with the user record in both directions
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The display name if set, otherwise the username.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Replacement values for the editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
}

/// Raw field values of a post submission, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSubmission {
    pub url: String,
    pub caption: String,
    pub tags: Vec<String>,
}

/// A submission whose fields passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub url: String,
    pub caption: String,
    /// Deduplicated, in submission order
    pub tags: Vec<String>,
}

/// The three fields pulled out of a remote photo page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub image: String,
    pub title: String,
    pub artist: String,
}

/// Progress of a single submission through the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStage {
    Received,
    Validated,
    Fetched,
    Extracted,
    Persisted,
}

impl std::fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IngestionStage::Received => "received",
            IngestionStage::Validated => "validated",
            IngestionStage::Fetched => "fetched",
            IngestionStage::Extracted => "extracted",
            IngestionStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Everything the sidebar of every page shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sidebar {
    pub categories: Vec<Tag>,
    pub top_posts: Vec<Post>,
    pub top_comments: Vec<Comment>,
}

/// A post together with its discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// A profile together with the posts shown beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePage {
    pub profile: Profile,
    pub posts: Vec<Post>,
}
