//! Assembles the real router over an in-memory database, a JWT provider and
//! a canned page fetcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use api_adapters::{router, AppState, Metrics};
use async_trait::async_trait;
use auth_adapters::JwtIdentityProvider;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domains::{FetchError, Identity, PageFetcher, Tag, TagRepository};
use http_body_util::BodyExt;
use secrecy::SecretString;
use services::{CommentService, IngestionService, MetadataExtractor, PostService, ProfileService};
use sqlx::SqlitePool;
use storage_adapters::{
    connect, migrate, SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo, SqliteTagRepo,
    SqliteUserRepo,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const PHOTO_URL: &str = "https://example.com/photo/1";
const SECRET: &str = "integration-secret";

/// The Flickr-like fixture page. `artist: false` drops the owner link.
pub fn photo_page(artist: bool) -> String {
    let owner = if artist {
        r#"<a class="owner-name" href="/people/jane">Jane</a>"#
    } else {
        ""
    };
    format!(
        r#"<html><head>
            <meta property="og:site_name" content="Flickr">
            <meta property="og:image" content="https://live.staticflickr.com/x.jpg">
        </head><body>
            <h1 class="photo-title">Sunset</h1>
            {owner}
        </body></html>"#
    )
}

/// Serves canned pages; every other URL answers 404.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
}

impl StubFetcher {
    pub fn page(mut self, url: &str, result: Result<String, FetchError>) -> Self {
        self.pages.insert(url.to_string(), result);
        self
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub posts: Arc<SqlitePostRepo>,
    pub comments: Arc<SqliteCommentRepo>,
    pub users: Arc<SqliteUserRepo>,
    tokens: JwtIdentityProvider,
}

impl TestApp {
    pub async fn new(fetcher: StubFetcher) -> Self {
        let pool = connect("sqlite::memory:", 1).await.unwrap();
        migrate(&pool).await.unwrap();

        let posts = Arc::new(SqlitePostRepo::new(pool.clone()));
        let tags = Arc::new(SqliteTagRepo::new(pool.clone()));
        let comments = Arc::new(SqliteCommentRepo::new(pool.clone()));
        let likes = Arc::new(SqliteLikeRepo::new(pool.clone()));
        let users = Arc::new(SqliteUserRepo::new(pool.clone()));

        for (position, slug) in ["nature", "city"].into_iter().enumerate() {
            tags.upsert(Tag {
                slug: slug.into(),
                name: slug.to_uppercase(),
                position: Some(position as i64),
                icon: None,
            })
            .await
            .unwrap();
        }

        let secret = SecretString::from(SECRET.to_string());
        let state = AppState {
            ingestion: Arc::new(IngestionService::new(
                tags.clone(),
                Arc::new(fetcher),
                MetadataExtractor::with_defaults().unwrap(),
                posts.clone(),
            )),
            posts: Arc::new(PostService::new(
                posts.clone(),
                tags,
                comments.clone(),
                likes.clone(),
            )),
            comments: Arc::new(CommentService::new(posts.clone(), comments.clone(), likes)),
            profiles: Arc::new(ProfileService::new(
                users.clone(),
                posts.clone(),
                comments.clone(),
            )),
            identity: Arc::new(JwtIdentityProvider::new(&secret)),
            metrics: Arc::new(Metrics::new()),
        };

        Self {
            router: router(state),
            pool,
            posts,
            comments,
            users,
            tokens: JwtIdentityProvider::new(&secret),
        }
    }

    pub fn token(&self, identity: &Identity) -> String {
        self.tokens
            .issue_token(identity, chrono::Duration::hours(1))
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Submits the urlencoded `body` to `POST /posts` as `author`.
    pub async fn submit(&self, author: &Identity, body: &str) -> Response {
        self.send(form("/posts", Some(&self.token(author)), body)).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub fn identity(username: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        username: username.into(),
        email: None,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The id in a `303 See Other` to `/posts/{id}`.
pub fn redirected_post(response: &Response) -> Uuid {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    location
        .strip_prefix("/posts/")
        .and_then(|id| id.parse().ok())
        .unwrap()
}

pub const SUBMISSION: &str = "url=https%3A%2F%2Fexample.com%2Fphoto%2F1&caption=nice&tags=nature";
