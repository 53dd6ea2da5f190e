//! # Rusty-Gallery Binary
//!
//! Loads the settings, wires the adapters into the services and serves the
//! router until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, Metrics};
use auth_adapters::JwtIdentityProvider;
use configs::{LogFormat, LoggingSettings, Settings};
use services::{CommentService, IngestionService, MetadataExtractor, PostService, ProfileService};
use storage_adapters::{
    connect, migrate, HttpPageFetcher, SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo,
    SqliteTagRepo, SqliteUserRepo,
};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.logging);

    // 1. Store
    let pool = connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("opening database")?;
    migrate(&pool).await.context("running migrations")?;
    info!(url = %settings.database.url, "database ready");

    let posts = Arc::new(SqlitePostRepo::new(pool.clone()));
    let tags = Arc::new(SqliteTagRepo::new(pool.clone()));
    let comments = Arc::new(SqliteCommentRepo::new(pool.clone()));
    let likes = Arc::new(SqliteLikeRepo::new(pool.clone()));
    let users = Arc::new(SqliteUserRepo::new(pool));

    // 2. Ingestion collaborators
    let fetcher = HttpPageFetcher::new(settings.fetch.timeout(), &settings.fetch.user_agent)
        .context("building HTTP client")?;
    let extractor = MetadataExtractor::new(
        settings.extractor.image_prefix.clone(),
        &settings.extractor.title_selector,
        &settings.extractor.artist_selector,
    )
    .context("parsing extractor selectors")?;

    // 3. Services
    let state = AppState {
        ingestion: Arc::new(IngestionService::new(
            tags.clone(),
            Arc::new(fetcher),
            extractor,
            posts.clone(),
        )),
        posts: Arc::new(PostService::new(
            posts.clone(),
            tags,
            comments.clone(),
            likes.clone(),
        )),
        comments: Arc::new(CommentService::new(posts.clone(), comments.clone(), likes)),
        profiles: Arc::new(ProfileService::new(users, posts, comments)),
        identity: Arc::new(JwtIdentityProvider::new(&settings.auth.jwt_secret)),
        metrics: Arc::new(Metrics::new()),
    };

    // 4. Serve
    let addr = settings.server.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Rusty-Gallery listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down cleanly");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
