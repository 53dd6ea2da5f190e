//! Comment and reply actions. Every write redirects back to the post.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::{Form, Json};
use domains::LikeStatus;
use serde::Deserialize;
use uuid::Uuid;

use super::to_post;
use crate::web::error::ApiError;
use crate::web::extract::CurrentUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BodyForm {
    #[serde(default)]
    pub body: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<BodyForm>,
) -> Result<Redirect, ApiError> {
    state.comments.add_comment(&user, post_id, &form.body).await?;
    Ok(to_post(post_id))
}

pub async fn add_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<BodyForm>,
) -> Result<Redirect, ApiError> {
    let (post_id, _) = state.comments.add_reply(&user, comment_id, &form.body).await?;
    Ok(to_post(post_id))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, ApiError> {
    let post_id = state.comments.delete_comment(&user, id).await?;
    Ok(to_post(post_id))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, ApiError> {
    let post_id = state.comments.delete_reply(&user, id).await?;
    Ok(to_post(post_id))
}

pub async fn like_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<LikeStatus>, ApiError> {
    let status = state.comments.toggle_comment_like(&user, id).await?;
    state.metrics.record_like("comment", status.liked);
    Ok(Json(status))
}

pub async fn like_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<LikeStatus>, ApiError> {
    let status = state.comments.toggle_reply_like(&user, id).await?;
    state.metrics.record_like("reply", status.liked);
    Ok(Json(status))
}
