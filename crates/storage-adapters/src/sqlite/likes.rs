use async_trait::async_trait;
use chrono::Utc;
use domains::{LikeRepository, LikeStatus, LikeTarget, PersistenceError};
use sqlx::sqlite::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::map_sqlx;

/// Join table and target column for each likeable entity.
fn table_of(target: LikeTarget) -> (&'static str, &'static str, Uuid) {
    match target {
        LikeTarget::Post(id) => ("post_likes", "post_id", id),
        LikeTarget::Comment(id) => ("comment_likes", "comment_id", id),
        LikeTarget::Reply(id) => ("reply_likes", "reply_id", id),
    }
}

pub struct SqliteLikeRepo {
    pool: SqlitePool,
}

impl SqliteLikeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for SqliteLikeRepo {
    /// Check, flip and count inside one transaction.
    async fn toggle(&self, target: LikeTarget, user_id: Uuid) -> Result<LikeStatus, PersistenceError> {
        let (table, column, id) = table_of(target);
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let removed = sqlx::query(&format!("DELETE FROM {table} WHERE {column} = ? AND user_id = ?"))
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .rows_affected();

        if removed == 0 {
            sqlx::query(&format!(
                "INSERT INTO {table} ({column}, user_id, created_at) VALUES (?, ?, ?)"
            ))
            .bind(id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        let status = LikeStatus {
            liked: removed == 0,
            count,
        };
        debug!(?target, liked = status.liked, count, "like toggled");
        Ok(status)
    }
}
