use std::sync::Arc;

use domains::IdentityProvider;
use services::{CommentService, IngestionService, PostService, ProfileService};

use crate::metrics::Metrics;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub metrics: Arc<Metrics>,
}
