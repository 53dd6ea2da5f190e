//! # Record Assembler
//!
//! Merges validated input, extracted metadata and the submitting identity
//! into a post, then hands it to the store in one atomic write.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    ExtractedMetadata, Identity, NewPost, PersistenceError, Post, PostRepository,
    ValidatedSubmission,
};
use uuid::Uuid;

/// Builds the persistable record. Every field is populated.
pub fn assemble(
    submission: ValidatedSubmission,
    metadata: ExtractedMetadata,
    author: &Identity,
) -> NewPost {
    NewPost {
        id: Uuid::new_v4(),
        title: metadata.title,
        artist: metadata.artist,
        url: submission.url,
        image: metadata.image,
        body: submission.caption,
        author_id: author.id,
        tag_slugs: submission.tags,
        created_at: Utc::now(),
    }
}

pub struct RecordAssembler {
    posts: Arc<dyn PostRepository>,
}

impl RecordAssembler {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Persists post and tag associations; either both land or neither does.
    pub async fn commit(
        &self,
        submission: ValidatedSubmission,
        metadata: ExtractedMetadata,
        author: &Identity,
    ) -> Result<Post, PersistenceError> {
        self.posts
            .create_with_tags(assemble(submission, metadata, author))
            .await
    }
}
