//! Request extractors: who is asking, and whether htmx is asking.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use domains::{AuthError, Identity};

use super::error::ApiError;
use super::state::AppState;

/// Cookie carrying the same bearer token for plain browser requests.
pub const TOKEN_COOKIE: &str = "gallery_token";

/// An authenticated caller. The local user record is created or refreshed
/// on every extraction.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

/// Like [`CurrentUser`], but anonymous requests are let through. A token that
/// is present and bad is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

/// `true` when the request carries `HX-Request: true`.
#[derive(Debug, Clone, Copy)]
pub struct HxRequest(pub bool);

fn bearer_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

async fn resolve(token: &str, state: &AppState) -> Result<Identity, ApiError> {
    let identity = state.identity.authenticate(token).await?;
    state.profiles.register(&identity).await?;
    Ok(identity)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingCredentials)?;
        Ok(CurrentUser(resolve(&token, state).await?))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(MaybeUser(Some(resolve(&token, state).await?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for HxRequest {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let hx = parts
            .headers
            .get("hx-request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Ok(HxRequest(hx))
    }
}
