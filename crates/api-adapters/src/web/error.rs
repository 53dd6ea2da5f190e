use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{AuthError, IngestError, IngestFailure, ServiceError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with. Mapped to a status and a JSON body
/// `{"error": {"code", "message"}}` in one place.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("metrics encoding failed")]
    Encode(#[from] std::fmt::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Service(ServiceError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::Service(ServiceError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Service(ServiceError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ingest(e) => ingest_status(e),
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Render(_) | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Service(ServiceError::Validation(_)) => "validation_failed",
            ApiError::Service(ServiceError::NotFound(..)) => "not_found",
            ApiError::Service(ServiceError::Forbidden(_)) => "forbidden",
            ApiError::Service(ServiceError::Persistence(_)) => "persistence_failed",
            ApiError::Ingest(e) => e.kind(),
            ApiError::Auth(_) => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Render(_) | ApiError::Encode(_) => "internal",
        }
    }

    /// Store and rendering failures are logged, never shown.
    fn public_message(&self) -> String {
        match self {
            ApiError::Service(ServiceError::Persistence(_))
            | ApiError::Ingest(IngestError {
                cause: IngestFailure::Persistence(_),
                ..
            })
            | ApiError::Render(_)
            | ApiError::Encode(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Validation and extraction are the submitter's problem, a failed fetch is
/// the remote's, a failed write is ours.
pub fn ingest_status(err: &IngestError) -> StatusCode {
    match &err.cause {
        IngestFailure::Validation(_) | IngestFailure::Extraction(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IngestFailure::Fetch(_) => StatusCode::BAD_GATEWAY,
        IngestFailure::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let mut body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        });
        if let ApiError::Service(ServiceError::Validation(errors)) = &self {
            body["error"]["fields"] = json!(errors.errors());
        }

        (status, Json(body)).into_response()
    }
}
