//! # SQLite Implementation
//!
//! Maps the relational model onto the `domains` models. UUIDs are stored as
//! 16-byte BLOBs, timestamps as RFC 3339 TEXT. Foreign keys are always on so
//! that deleting a parent cascades to its children.

mod comments;
mod likes;
mod posts;
mod tags;
mod users;

use std::str::FromStr;

use domains::PersistenceError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use comments::SqliteCommentRepo;
pub use likes::SqliteLikeRepo;
pub use posts::SqlitePostRepo;
pub use tags::SqliteTagRepo;
pub use users::SqliteUserRepo;

/// Opens a pool on `url`, creating the file if needed.
///
/// In-memory databases live as long as their connection does, so they get a
/// single connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, PersistenceError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(map_sqlx)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    pool.connect_with(options).await.map_err(map_sqlx)
}

/// Applies the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), PersistenceError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| PersistenceError::Storage(e.to_string()))
}

pub(crate) fn map_sqlx(err: sqlx::Error) -> PersistenceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PersistenceError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PersistenceError::Missing("referenced row".into())
        }
        sqlx::Error::RowNotFound => PersistenceError::Missing("row".into()),
        _ => PersistenceError::Storage(err.to_string()),
    }
}
