use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Comment, CommentRepository, NewComment, NewReply, PersistenceError, Reply};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::map_sqlx;
use super::posts::author;

type StoreResult<T> = Result<T, PersistenceError>;

const SELECT_COMMENTS: &str = "
    SELECT c.id, c.post_id, c.body, c.created_at,
           c.author_id, u.username AS author_name,
           (SELECT COUNT(*) FROM comment_likes l WHERE l.comment_id = c.id) AS like_count
    FROM comments c
    LEFT JOIN users u ON u.id = c.author_id";

const SELECT_REPLIES: &str = "
    SELECT r.id, r.comment_id, r.body, r.created_at,
           r.author_id, u.username AS author_name,
           (SELECT COUNT(*) FROM reply_likes l WHERE l.reply_id = r.id) AS like_count
    FROM replies r
    LEFT JOIN users u ON u.id = r.author_id";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_name: Option<String>,
    like_count: i64,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author: author(row.author_id, row.author_name),
            body: row.body,
            like_count: row.like_count,
            created_at: row.created_at,
            replies: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReplyRow {
    id: Uuid,
    comment_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_name: Option<String>,
    like_count: i64,
}

impl From<ReplyRow> for Reply {
    fn from(row: ReplyRow) -> Self {
        Reply {
            id: row.id,
            comment_id: row.comment_id,
            author: author(row.author_id, row.author_name),
            body: row.body,
            like_count: row.like_count,
            created_at: row.created_at,
        }
    }
}

pub struct SqliteCommentRepo {
    pool: SqlitePool,
}

impl SqliteCommentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Loads the replies of `comments` and nests them, newest first.
    async fn with_replies(&self, comments: Vec<Comment>) -> StoreResult<Vec<Comment>> {
        if comments.is_empty() {
            return Ok(comments);
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{SELECT_REPLIES} WHERE r.comment_id IN ("));
        let mut ids = qb.separated(", ");
        for comment in &comments {
            ids.push_bind(comment.id);
        }
        ids.push_unseparated(") ORDER BY r.created_at DESC");

        let rows: Vec<ReplyRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut replies: HashMap<Uuid, Vec<Reply>> = HashMap::new();
        for row in rows {
            replies.entry(row.comment_id).or_default().push(row.into());
        }

        Ok(comments
            .into_iter()
            .map(|mut c| {
                c.replies = replies.remove(&c.id).unwrap_or_default();
                c
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepo {
    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        sqlx::query("INSERT INTO comments (id, post_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(comment.author_id)
            .bind(&comment.body)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        self.find_comment(comment.id)
            .await?
            .ok_or_else(|| PersistenceError::Missing(format!("comment {}", comment.id)))
    }

    async fn create_reply(&self, reply: NewReply) -> StoreResult<Reply> {
        sqlx::query("INSERT INTO replies (id, comment_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(reply.id)
            .bind(reply.comment_id)
            .bind(reply.author_id)
            .bind(&reply.body)
            .bind(reply.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        self.find_reply(reply.id)
            .await?
            .ok_or_else(|| PersistenceError::Missing(format!("reply {}", reply.id)))
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(&format!("{SELECT_COMMENTS} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Comment::from))
    }

    async fn find_reply(&self, id: Uuid) -> StoreResult<Option<Reply>> {
        let row: Option<ReplyRow> = sqlx::query_as(&format!("{SELECT_REPLIES} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Reply::from))
    }

    async fn list_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "{SELECT_COMMENTS} WHERE c.post_id = ? ORDER BY c.created_at DESC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.with_replies(rows.into_iter().map(Comment::from).collect())
            .await
    }

    async fn top_by_likes(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "{SELECT_COMMENTS}
             WHERE EXISTS (SELECT 1 FROM comment_likes l WHERE l.comment_id = c.id)
               AND (?1 IS NULL OR c.author_id = ?1)
             ORDER BY like_count DESC, c.created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_reply(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM replies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{new_post, pool, tag, user};
    use crate::sqlite::SqlitePostRepo;
    use domains::PostRepository;

    async fn seeded() -> (SqlitePool, Uuid, domains::Identity) {
        let pool = pool().await;
        tag(&pool, "nature", None).await;
        let jane = user(&pool, "jane").await;
        let post = SqlitePostRepo::new(pool.clone())
            .create_with_tags(new_post(&jane, &["nature"]))
            .await
            .unwrap();
        (pool, post.id, jane)
    }

    fn comment(post_id: Uuid, author_id: Uuid, body: &str, age_secs: i64) -> NewComment {
        NewComment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body: body.into(),
            created_at: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn lists_comments_with_nested_replies() {
        let (pool, post_id, jane) = seeded().await;
        let repo = SqliteCommentRepo::new(pool);

        let first = repo.create_comment(comment(post_id, jane.id, "first", 60)).await.unwrap();
        let second = repo.create_comment(comment(post_id, jane.id, "second", 0)).await.unwrap();
        repo.create_reply(NewReply {
            id: Uuid::new_v4(),
            comment_id: first.id,
            author_id: jane.id,
            body: "reply".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let listed = repo.list_for_post(post_id).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert!(listed[0].replies.is_empty());
        assert_eq!(listed[1].replies.len(), 1);
        assert_eq!(listed[1].replies[0].body, "reply");
        assert_eq!(listed[1].author.as_ref().unwrap().username, "jane");
    }

    #[tokio::test]
    async fn deleting_comment_removes_replies() {
        let (pool, post_id, jane) = seeded().await;
        let repo = SqliteCommentRepo::new(pool);
        let parent = repo.create_comment(comment(post_id, jane.id, "c", 0)).await.unwrap();
        let reply = repo
            .create_reply(NewReply {
                id: Uuid::new_v4(),
                comment_id: parent.id,
                author_id: jane.id,
                body: "r".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(repo.delete_comment(parent.id).await.unwrap());
        assert!(repo.find_reply(reply.id).await.unwrap().is_none());
        assert!(!repo.delete_reply(reply.id).await.unwrap());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_rejected() {
        let (pool, _, jane) = seeded().await;
        let err = SqliteCommentRepo::new(pool)
            .create_comment(comment(Uuid::new_v4(), jane.id, "orphan", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Missing(_)));
    }
}
