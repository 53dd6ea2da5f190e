use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Author, NewPost, PersistenceError, Post, PostRepository, Tag};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::map_sqlx;

type StoreResult<T> = Result<T, PersistenceError>;

const SELECT_POSTS: &str = "
    SELECT p.id, p.title, p.artist, p.url, p.image, p.body, p.created_at,
           p.author_id, u.username AS author_name,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    artist: String,
    url: String,
    image: String,
    body: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_name: Option<String>,
    like_count: i64,
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    slug: String,
    name: String,
    position: Option<i64>,
    icon: Option<String>,
}

pub(crate) fn author(id: Option<Uuid>, username: Option<String>) -> Option<Author> {
    match (id, username) {
        (Some(id), Some(username)) => Some(Author { id, username }),
        _ => None,
    }
}

pub struct SqlitePostRepo {
    pool: SqlitePool,
}

impl SqlitePostRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Attaches tags to each row with one extra query.
    async fn hydrate(&self, rows: Vec<PostRow>) -> StoreResult<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT pt.post_id, t.slug, t.name, t.position, t.icon
             FROM post_tags pt JOIN tags t ON t.slug = pt.tag_slug
             WHERE pt.post_id IN (",
        );
        let mut ids = qb.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        ids.push_unseparated(") ORDER BY t.position IS NULL, t.position, t.name");

        let tag_rows: Vec<PostTagRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for t in tag_rows {
            tags.entry(t.post_id).or_default().push(Tag {
                slug: t.slug,
                name: t.name,
                position: t.position,
                icon: t.icon,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                tags: tags.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                artist: row.artist,
                url: row.url,
                image: row.image,
                body: row.body,
                author: author(row.author_id, row.author_name),
                like_count: row.like_count,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepo {
    /// Post row and tag rows share one transaction. Dropping `tx` on any
    /// error rolls both back, so no post is ever visible without its tags.
    async fn create_with_tags(&self, post: NewPost) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // 1. Insert Post
        sqlx::query(
            "INSERT INTO posts (id, title, artist, url, image, body, author_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.artist)
        .bind(&post.url)
        .bind(&post.image)
        .bind(&post.body)
        .bind(post.author_id)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        // 2. Insert tag associations
        for slug in &post.tag_slugs {
            sqlx::query("INSERT INTO post_tags (post_id, tag_slug) VALUES (?, ?)")
                .bind(post.id)
                .bind(slug)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }

        tx.commit().await.map_err(map_sqlx)?;
        debug!(post_id = %post.id, tags = post.tag_slugs.len(), "post committed");

        self.find_by_id(post.id)
            .await?
            .ok_or_else(|| PersistenceError::Missing(format!("post {}", post.id)))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(&format!("{SELECT_POSTS} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, tag: Option<String>) -> StoreResult<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "{SELECT_POSTS}
             WHERE ?1 IS NULL OR EXISTS (
                 SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_slug = ?1)
             ORDER BY p.created_at DESC"
        ))
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.hydrate(rows).await
    }

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "{SELECT_POSTS} WHERE p.author_id = ? ORDER BY p.created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.hydrate(rows).await
    }

    async fn top_by_likes(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "{SELECT_POSTS}
             WHERE EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id)
               AND (?1 IS NULL OR p.author_id = ?1)
             ORDER BY like_count DESC, p.created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.hydrate(rows).await
    }

    async fn liked_by(&self, user_id: Uuid) -> StoreResult<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "{SELECT_POSTS}
             JOIN post_likes pl ON pl.post_id = p.id
             WHERE pl.user_id = ?
             ORDER BY pl.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.hydrate(rows).await
    }

    async fn update_body_and_tags(
        &self,
        id: Uuid,
        body: String,
        tag_slugs: Vec<String>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let updated = sqlx::query("UPDATE posts SET body = ? WHERE id = ?")
            .bind(&body)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(PersistenceError::Missing(format!("post {id}")));
        }

        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        for slug in &tag_slugs {
            sqlx::query("INSERT INTO post_tags (post_id, tag_slug) VALUES (?, ?)")
                .bind(id)
                .bind(slug)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }

        tx.commit().await.map_err(map_sqlx)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
