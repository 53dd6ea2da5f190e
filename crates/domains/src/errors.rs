//! # Errors
//!
//! Centralized error taxonomy for the Rusty-Gallery ecosystem.
//! Ingestion failures carry the stage at which the pipeline stopped;
//! everything else goes through `ServiceError`.

use serde::Serialize;
use thiserror::Error;

use crate::models::IngestionStage;

/// A single offending form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every offending field of one submission, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// First message recorded for `field`, if any.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fields: {}", self.fields().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Retrieval of the remote page failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The remote answered with a non-2xx status
    #[error("remote answered with status {0}")]
    Status(u16),

    /// No complete response within the configured timeout
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// DNS, connect or transport failure
    #[error("network failure: {0}")]
    Network(String),

    /// The body could not be read as text
    #[error("unreadable response body: {0}")]
    Body(String),
}

/// One of the three required metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Image,
    Title,
    Artist,
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MetadataField::Image => "image",
            MetadataField::Title => "title",
            MetadataField::Artist => "artist",
        })
    }
}

/// The fetched page did not have the expected structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("page has no {0}")]
    MissingField(MetadataField),
}

/// Store-level failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row being updated or referenced does not exist
    #[error("{0} not found")]
    Missing(String),

    /// Infrastructure failure (e.g. pool closed, disk full)
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Failure to establish who is making the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    Expired,
}

/// Why a submission was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestFailure {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl IngestFailure {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestFailure::Validation(_) => "validation_failed",
            IngestFailure::Fetch(_) => "fetch_failed",
            IngestFailure::Extraction(_) => "extraction_failed",
            IngestFailure::Persistence(_) => "persistence_failed",
        }
    }
}

/// Terminal failure of the ingestion pipeline. No post is visible afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("ingestion failed after reaching {reached}: {cause}")]
pub struct IngestError {
    /// The last stage that completed; the step that failed is `cause`
    pub reached: IngestionStage,
    pub cause: IngestFailure,
}

impl IngestError {
    pub fn new(reached: IngestionStage, cause: impl Into<IngestFailure>) -> Self {
        Self {
            reached,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.cause.kind()
    }
}

/// The primary error type for post, comment and profile operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Field-level input problems
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found (e.g. Post, Comment, Profile)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// The caller may not touch this resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// A specialized Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
