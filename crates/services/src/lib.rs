//! # Services
//!
//! Application logic of Rusty-Gallery. Every service talks to the outside
//! world exclusively through the ports declared in `domains`.

pub mod comments;
pub mod ingestion;
pub mod posts;
pub mod profiles;

pub use comments::CommentService;
pub use ingestion::{IngestionService, InvalidSelector, MetadataExtractor};
pub use posts::PostService;
pub use profiles::{ProfileService, ProfileTab, TabContent};
