//! # Web
//!
//! Routing and orchestration between HTTP requests and the services.

mod error;
mod extract;
mod handlers;
mod state;
mod views;

pub use error::ApiError;
pub use extract::{CurrentUser, HxRequest, MaybeUser};
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Every route of the gallery.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Feeds
        .route("/", get(handlers::posts::home))
        .route("/category/{slug}", get(handlers::posts::category))
        // Posts
        .route("/posts/new", get(handlers::posts::new_post))
        .route("/posts", post(handlers::posts::create_post))
        .route("/posts/{id}", get(handlers::posts::show_post))
        .route("/posts/{id}/edit", post(handlers::posts::edit_post))
        .route("/posts/{id}/delete", post(handlers::posts::delete_post))
        .route("/posts/{id}/like", post(handlers::posts::like_post))
        // Comments and replies
        .route("/posts/{id}/comments", post(handlers::comments::add_comment))
        .route("/comments/{id}/replies", post(handlers::comments::add_reply))
        .route("/comments/{id}/delete", post(handlers::comments::delete_comment))
        .route("/comments/{id}/like", post(handlers::comments::like_comment))
        .route("/replies/{id}/delete", post(handlers::comments::delete_reply))
        .route("/replies/{id}/like", post(handlers::comments::like_reply))
        // Profiles
        .route("/profile/{username}", get(handlers::profiles::show_profile))
        .route("/profile/edit", post(handlers::profiles::edit_profile))
        .route("/profile/delete", post(handlers::profiles::delete_profile))
        // Machine endpoints
        .route("/api/tags", get(handlers::system::tags))
        .route("/health", get(handlers::system::health))
        .route("/metrics", get(handlers::system::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
