//! Feeds, the submission form and single-post actions.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use domains::{Identity, IngestFailure, LikeStatus, PostSubmission};
use tracing::debug;
use uuid::Uuid;

use super::{all, first, render, to_post};
use crate::web::error::{ingest_status, ApiError};
use crate::web::extract::{CurrentUser, HxRequest, MaybeUser};
use crate::web::state::AppState;
use crate::web::views::{
    cards, CommentView, FeedPartial, FormErrors, HomePage, PostCard, PostFormPage, PostPageView,
    SidebarView, TagOption, Viewer,
};

const LATEST: &str = "Latest posts";
const SAVE_FAILED: &str = "The post could not be saved. Please try again.";

pub async fn home(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    HxRequest(hx): HxRequest,
) -> Result<Response, ApiError> {
    feed(&state, viewer, hx, None).await
}

pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    MaybeUser(viewer): MaybeUser,
    HxRequest(hx): HxRequest,
) -> Result<Response, ApiError> {
    feed(&state, viewer, hx, Some(&slug)).await
}

async fn feed(
    state: &AppState,
    viewer: Option<Identity>,
    hx: bool,
    slug: Option<&str>,
) -> Result<Response, ApiError> {
    let (tag, posts) = state.posts.feed(slug).await?;
    if hx {
        return Ok(render(FeedPartial { posts: cards(&posts) })?.into_response());
    }

    let sidebar = state.posts.sidebar().await?;
    let page = HomePage {
        viewer: Viewer::of(viewer.as_ref()),
        heading: tag.map(|t| t.name).unwrap_or_else(|| LATEST.to_string()),
        posts: cards(&posts),
        sidebar: SidebarView::build(&sidebar, slug),
    };
    Ok(render(page)?.into_response())
}

pub async fn new_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let page = PostFormPage {
        viewer: Viewer::of(Some(&user)),
        url: String::new(),
        caption: String::new(),
        tags: TagOption::list(&state.posts.tags().await?, &[]),
        errors: FormErrors::default(),
    };
    Ok(render(page)?.into_response())
}

/// Runs the ingestion pipeline. On failure the form comes back filled in,
/// with the status telling which side was at fault.
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let submission = PostSubmission {
        url: first(&fields, "url"),
        caption: first(&fields, "caption"),
        tags: all(&fields, "tags"),
    };

    let err = match state.ingestion.submit(&user, submission.clone()).await {
        Ok(post) => {
            state.metrics.record_ingestion("persisted");
            return Ok(to_post(post.id).into_response());
        }
        Err(err) => err,
    };
    state.metrics.record_ingestion(err.kind());

    let errors = match &err.cause {
        IngestFailure::Validation(fields) => FormErrors::from_validation(fields),
        IngestFailure::Persistence(_) => FormErrors::general(SAVE_FAILED),
        other => FormErrors::general(other.to_string()),
    };
    let page = PostFormPage {
        viewer: Viewer::of(Some(&user)),
        tags: TagOption::list(&state.posts.tags().await?, &submission.tags),
        url: submission.url,
        caption: submission.caption,
        errors,
    };
    Ok((ingest_status(&err), render(page)?).into_response())
}

pub async fn show_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Response, ApiError> {
    let page = state.posts.get(id).await?;
    let sidebar = state.posts.sidebar().await?;
    let all_tags = state.posts.tags().await?;

    let viewer_id = viewer.as_ref().map(|v| v.id);
    let is_owner = viewer_id.is_some_and(|v| page.post.is_owned_by(v));
    let selected: Vec<String> = page.post.tag_slugs().into_iter().map(String::from).collect();

    let view = PostPageView {
        viewer: Viewer::of(viewer.as_ref()),
        post: PostCard::from(&page.post),
        comments: CommentView::list(&page.comments, viewer_id),
        can_edit: is_owner,
        can_like: viewer.is_some() && !is_owner,
        tags: TagOption::list(&all_tags, &selected),
        sidebar: SidebarView::build(&sidebar, None),
    };
    Ok(render(view)?.into_response())
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let post = state
        .posts
        .edit(&user, id, &first(&fields, "caption"), &all(&fields, "tags"))
        .await?;
    Ok(to_post(post.id))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, ApiError> {
    state.posts.delete(&user, id).await?;
    Ok(Redirect::to("/"))
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<LikeStatus>, ApiError> {
    let status = state.posts.toggle_like(&user, id).await?;
    debug!(post_id = %id, liked = status.liked, "post like toggled");
    state.metrics.record_like("post", status.liked);
    Ok(Json(status))
}
