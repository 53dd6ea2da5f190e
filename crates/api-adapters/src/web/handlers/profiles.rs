//! Profile pages and account management.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use domains::{ProfileChanges, ServiceError};
use serde::Deserialize;
use services::{ProfileTab, TabContent};

use super::render;
use crate::web::error::ApiError;
use crate::web::extract::{CurrentUser, HxRequest, MaybeUser};
use crate::web::state::AppState;
use crate::web::views::{
    cards, CommentView, CommentsPartial, FeedPartial, ProfilePageView, ProfileView, Viewer,
};

#[derive(Debug, Default, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

pub async fn show_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<TabQuery>,
    MaybeUser(viewer): MaybeUser,
    HxRequest(hx): HxRequest,
) -> Result<Response, ApiError> {
    let tab = query
        .tab
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<ProfileTab>().map(|parsed| (t, parsed)))
        .transpose()
        .map_err(ServiceError::from)?;

    let page = state.profiles.profile(&username).await?;
    let viewer_id = viewer.as_ref().map(|v| v.id);

    let (tab_name, content) = match tab {
        Some((name, tab)) => (name, state.profiles.tab(&username, tab).await?),
        None => (String::new(), TabContent::Posts(page.posts)),
    };

    if hx {
        let fragment = match content {
            TabContent::Posts(posts) => render(FeedPartial { posts: cards(&posts) })?,
            TabContent::Comments(comments) => render(CommentsPartial {
                comments: CommentView::list(&comments, viewer_id),
            })?,
        };
        return Ok(fragment.into_response());
    }

    let (posts, comments, show_comments) = match content {
        TabContent::Posts(posts) => (cards(&posts), Vec::new(), false),
        TabContent::Comments(comments) => {
            (Vec::new(), CommentView::list(&comments, viewer_id), true)
        }
    };
    let view = ProfilePageView {
        viewer: Viewer::of(viewer.as_ref()),
        is_own: viewer_id == Some(page.profile.user_id),
        profile: ProfileView::from(&page.profile),
        tab: tab_name,
        posts,
        comments,
        show_comments,
    };
    Ok(render(view)?.into_response())
}

pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(changes): Form<ProfileChanges>,
) -> Result<Redirect, ApiError> {
    let profile = state.profiles.update(&user, changes).await?;
    Ok(Redirect::to(&format!("/profile/{}", profile.username)))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, ApiError> {
    state.profiles.delete_account(&user).await?;
    Ok(Redirect::to("/"))
}
