//! Router-level tests over mocked ports.

use std::sync::Arc;

use api_adapters::{router, AppState, Metrics};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use domains::{
    Author, AuthError, Identity, MockCommentRepository, MockIdentityProvider, MockLikeRepository,
    MockPageFetcher, MockPostRepository, MockTagRepository, MockUserRepository, Post, Profile,
    Tag,
};
use http_body_util::BodyExt;
use services::{CommentService, IngestionService, MetadataExtractor, PostService, ProfileService};
use tower::ServiceExt;
use uuid::Uuid;

const TOKEN: &str = "good-token";

fn jane() -> Identity {
    Identity {
        id: Uuid::from_u128(1),
        username: "jane".into(),
        email: None,
    }
}

fn nature() -> Tag {
    Tag {
        slug: "nature".into(),
        name: "Nature".into(),
        position: Some(1),
        icon: None,
    }
}

fn post_by(author: &Identity) -> Post {
    Post {
        id: Uuid::from_u128(42),
        title: "Sunset".into(),
        artist: "Jane".into(),
        url: "https://example.com/photo/1".into(),
        image: "https://live.staticflickr.com/x.jpg".into(),
        body: "nice".into(),
        author: Some(Author {
            id: author.id,
            username: author.username.clone(),
        }),
        tags: vec![nature()],
        like_count: 0,
        created_at: Utc::now(),
    }
}

struct Mocks {
    posts: MockPostRepository,
    tags: MockTagRepository,
    comments: MockCommentRepository,
    likes: MockLikeRepository,
    users: MockUserRepository,
    fetcher: MockPageFetcher,
}

impl Mocks {
    /// Tags and the identity round-trip are always wired.
    fn new() -> Self {
        let mut tags = MockTagRepository::new();
        tags.expect_list().returning(|| Ok(vec![nature()]));
        tags.expect_find_by_slug()
            .returning(|slug| Ok((slug == "nature").then(nature)));

        let mut users = MockUserRepository::new();
        users.expect_register().returning(|identity| {
            Ok(Profile {
                user_id: identity.id,
                username: identity.username,
                display_name: None,
                avatar: None,
                bio: None,
                location: None,
                email: identity.email,
                created_at: Utc::now(),
            })
        });

        Self {
            posts: MockPostRepository::new(),
            tags,
            comments: MockCommentRepository::new(),
            likes: MockLikeRepository::new(),
            users,
            fetcher: MockPageFetcher::new(),
        }
    }

    fn into_app(self) -> (Router, Arc<Metrics>) {
        let posts = Arc::new(self.posts);
        let tags = Arc::new(self.tags);
        let comments = Arc::new(self.comments);
        let likes = Arc::new(self.likes);
        let users = Arc::new(self.users);

        let mut identity = MockIdentityProvider::new();
        identity.expect_authenticate().returning(|token| {
            if token == TOKEN {
                Ok(jane())
            } else {
                Err(AuthError::InvalidToken("bad signature".into()))
            }
        });

        let metrics = Arc::new(Metrics::new());
        let state = AppState {
            ingestion: Arc::new(IngestionService::new(
                tags.clone(),
                Arc::new(self.fetcher),
                MetadataExtractor::with_defaults().unwrap(),
                posts.clone(),
            )),
            posts: Arc::new(PostService::new(
                posts.clone(),
                tags.clone(),
                comments.clone(),
                likes.clone(),
            )),
            comments: Arc::new(CommentService::new(posts.clone(), comments.clone(), likes)),
            profiles: Arc::new(ProfileService::new(users, posts, comments)),
            identity: Arc::new(identity),
            metrics: metrics.clone(),
        };
        (router(state), metrics)
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = Mocks::new().into_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("\"ok\""));
}

#[tokio::test]
async fn submitting_needs_a_token() {
    let (app, _) = Mocks::new().into_app();
    let request = Request::post("/posts")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("url=https%3A%2F%2Fexample.com&caption=nice&tags=nature"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_token_is_rejected_even_on_public_pages() {
    let (app, _) = Mocks::new().into_app();
    let request = Request::get("/")
        .header(header::AUTHORIZATION, "Bearer forged")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_submission_rerenders_form() {
    let mut mocks = Mocks::new();
    mocks.fetcher.expect_fetch().never();
    mocks.posts.expect_create_with_tags().never();
    let (app, metrics) = mocks.into_app();

    let response = app
        .oneshot(form("/posts", "url=not-a-url&caption=&tags=nature"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Enter a valid URL."));
    assert!(html.contains("This field is required."));
    assert!(html.contains("value=\"not-a-url\""));
    assert!(metrics
        .encode()
        .unwrap()
        .contains("gallery_post_ingestions_total{outcome=\"validation_failed\"} 1"));
}

#[tokio::test]
async fn successful_submission_redirects_to_post() {
    let mut mocks = Mocks::new();
    mocks.fetcher.expect_fetch().times(1).returning(|_| {
        Ok(r#"<html><head><meta content="https://live.staticflickr.com/x.jpg"></head>
            <body><h1 class="photo-title">Sunset</h1><a class="owner-name">Jane</a></body></html>"#
            .to_string())
    });
    mocks
        .posts
        .expect_create_with_tags()
        .times(1)
        .returning(|new| {
            let mut post = post_by(&jane());
            post.id = new.id;
            Ok(post)
        });
    let (app, metrics) = mocks.into_app();

    let response = app
        .oneshot(form(
            "/posts",
            "url=https%3A%2F%2Fexample.com%2Fphoto%2F1&caption=nice&tags=nature",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("/posts/"));
    assert!(metrics
        .encode()
        .unwrap()
        .contains("gallery_post_ingestions_total{outcome=\"persisted\"} 1"));
}

#[tokio::test]
async fn htmx_gets_the_feed_fragment() {
    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_list()
        .returning(|_| Ok(vec![post_by(&jane())]));
    let (app, _) = mocks.into_app();

    let request = Request::get("/category/nature")
        .header("HX-Request", "true")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Sunset"));
    assert!(!html.contains("<html"));
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let (app, _) = Mocks::new().into_app();
    let response = app
        .oneshot(Request::get("/category/space").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn liking_own_post_is_forbidden() {
    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_find_by_id()
        .returning(|_| Ok(Some(post_by(&jane()))));
    mocks.likes.expect_toggle().never();
    let (app, _) = mocks.into_app();

    let response = app
        .oneshot(form(&format!("/posts/{}/like", Uuid::from_u128(42)), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_profile_tab_is_rejected() {
    let (app, _) = Mocks::new().into_app();
    let response = app
        .oneshot(
            Request::get("/profile/jane?tab=everything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
