//! Machine-facing endpoints.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use domains::Tag;
use serde_json::{json, Value};

use crate::metrics;
use crate::web::error::ApiError;
use crate::web::state::AppState;

pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.posts.tags().await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.encode()?;
    Ok(([(CONTENT_TYPE, metrics::CONTENT_TYPE)], body))
}
