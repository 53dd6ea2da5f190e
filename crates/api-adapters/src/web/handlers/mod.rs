//! # Handlers
//!
//! Thin glue: extract, call one service, render or redirect.

pub mod comments;
pub mod posts;
pub mod profiles;
pub mod system;

use askama::Template;
use axum::response::{Html, Redirect};
use uuid::Uuid;

use super::error::ApiError;

pub(super) fn render(template: impl Template) -> Result<Html<String>, ApiError> {
    Ok(Html(template.render()?))
}

pub(super) fn to_post(id: Uuid) -> Redirect {
    Redirect::to(&format!("/posts/{id}"))
}

/// First value of a repeated urlencoded field, empty when absent.
pub(super) fn first(fields: &[(String, String)], name: &str) -> String {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// Every value of a repeated urlencoded field, in order.
pub(super) fn all(fields: &[(String, String)], name: &str) -> Vec<String> {
    fields
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .collect()
}
