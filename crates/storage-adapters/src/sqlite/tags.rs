use async_trait::async_trait;
use domains::{PersistenceError, Tag, TagRepository};
use sqlx::sqlite::SqlitePool;

use super::map_sqlx;

#[derive(sqlx::FromRow)]
struct TagRow {
    slug: String,
    name: String,
    position: Option<i64>,
    icon: Option<String>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            slug: row.slug,
            name: row.name,
            position: row.position,
            icon: row.icon,
        }
    }
}

pub struct SqliteTagRepo {
    pool: SqlitePool,
}

impl SqliteTagRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for SqliteTagRepo {
    /// Positioned tags first, then by name.
    async fn list(&self) -> Result<Vec<Tag>, PersistenceError> {
        let rows: Vec<TagRow> = sqlx::query_as(
            "SELECT slug, name, position, icon FROM tags
             ORDER BY position IS NULL, position, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, PersistenceError> {
        let row: Option<TagRow> =
            sqlx::query_as("SELECT slug, name, position, icon FROM tags WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        Ok(row.map(Tag::from))
    }

    async fn upsert(&self, tag: Tag) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO tags (slug, name, position, icon) VALUES (?, ?, ?, ?)
             ON CONFLICT(slug) DO UPDATE SET
                 name = excluded.name, position = excluded.position, icon = excluded.icon",
        )
        .bind(&tag.slug)
        .bind(&tag.name)
        .bind(tag.position)
        .bind(&tag.icon)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
