//! # Seed
//!
//! Prepares a fresh database: default categories plus a demo user, whose
//! bearer token is printed so the gallery can be used right away.
//!
//! ```text
//! APP__AUTH__JWT_SECRET=dev seed [username]
//! ```

use anyhow::Context;
use auth_adapters::JwtIdentityProvider;
use configs::Settings;
use domains::{Identity, Tag, TagRepository, UserRepository};
use storage_adapters::{connect, migrate, SqliteTagRepo, SqliteUserRepo};
use tracing::info;
use uuid::Uuid;

const DEFAULT_USER: &str = "demo";

/// slug, display name
const CATEGORIES: &[(&str, &str)] = &[
    ("nature", "Nature"),
    ("city", "City"),
    ("people", "People"),
    ("animals", "Animals"),
    ("architecture", "Architecture"),
    ("abstract", "Abstract"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Settings::load().context("loading configuration")?;
    let pool = connect(&settings.database.url, 1).await?;
    migrate(&pool).await?;

    let tags = SqliteTagRepo::new(pool.clone());
    for (position, (slug, name)) in CATEGORIES.iter().enumerate() {
        tags.upsert(Tag {
            slug: slug.to_string(),
            name: name.to_string(),
            position: Some(position as i64 + 1),
            icon: None,
        })
        .await
        .with_context(|| format!("seeding tag {slug}"))?;
    }
    info!(count = CATEGORIES.len(), "categories seeded");

    let username = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_USER.to_string());
    let identity = Identity {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, username.as_bytes()),
        username,
        email: None,
    };
    SqliteUserRepo::new(pool)
        .register(identity.clone())
        .await
        .context("registering demo user")?;

    let token = JwtIdentityProvider::new(&settings.auth.jwt_secret)
        .issue_token(&identity, chrono::Duration::days(30))?;
    info!(user = %identity.username, "demo user ready");
    println!("{token}");
    Ok(())
}
