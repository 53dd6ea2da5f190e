//! # Storage Adapters
//!
//! Outbound adapters of Rusty-Gallery: the SQLite store (`db-sqlite`) and the
//! HTTP page fetcher used by post ingestion (`fetch-http`).

#[cfg(feature = "fetch-http")]
pub mod fetch;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "fetch-http")]
pub use fetch::HttpPageFetcher;
#[cfg(feature = "db-sqlite")]
pub use sqlite::{
    connect, migrate, SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo, SqliteTagRepo,
    SqliteUserRepo,
};
