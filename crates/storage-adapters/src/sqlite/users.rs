use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Identity, PersistenceError, Profile, ProfileChanges, UserRepository};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::map_sqlx;

type StoreResult<T> = Result<T, PersistenceError>;

const SELECT_PROFILES: &str = "
    SELECT p.user_id, u.username, p.display_name, p.avatar, p.bio, p.location,
           p.email, p.created_at
    FROM profiles p
    JOIN users u ON u.id = p.user_id";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    username: String,
    display_name: Option<String>,
    avatar: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            username: row.username,
            display_name: row.display_name,
            avatar: row.avatar,
            bio: row.bio,
            location: row.location,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn require_profile(&self, user_id: Uuid) -> StoreResult<Profile> {
        self.find_profile(user_id)
            .await?
            .ok_or_else(|| PersistenceError::Missing(format!("profile of user {user_id}")))
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepo {
    /// Upserts user and profile. The first statement must be a write so the
    /// transaction never has to upgrade a read lock.
    async fn register(&self, identity: Identity) -> StoreResult<Profile> {
        let email = identity
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query(
            "INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username",
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        // An address already claimed by someone else is not mirrored.
        let email = match email {
            Some(email) => {
                let owner: Option<Uuid> = sqlx::query_scalar(
                    "SELECT id FROM users WHERE email = ?1 AND id <> ?2
                     UNION SELECT user_id FROM profiles WHERE email = ?1 AND user_id <> ?2
                     LIMIT 1",
                )
                .bind(&email)
                .bind(identity.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx)?;
                if owner.is_some() {
                    warn!(user_id = %identity.id, "identity email belongs to another user, not mirrored");
                    None
                } else {
                    Some(email)
                }
            }
            None => None,
        };

        sqlx::query("UPDATE users SET email = COALESCE(?, email) WHERE id = ?")
            .bind(&email)
            .bind(identity.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let created = sqlx::query(
            "INSERT INTO profiles (user_id, email, created_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET email = COALESCE(excluded.email, profiles.email)",
        )
        .bind(identity.id)
        .bind(&email)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        debug!(user_id = %identity.id, rows = created.rows_affected(), "user registered");
        self.require_profile(identity.id).await
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!("{SELECT_PROFILES} WHERE p.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Profile::from))
    }

    async fn find_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!("{SELECT_PROFILES} WHERE u.username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Profile::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM users WHERE email = ?1
             UNION SELECT user_id FROM profiles WHERE email = ?1
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    /// Profile and user email change together or not at all.
    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> StoreResult<Profile> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let updated = sqlx::query(
            "UPDATE profiles
             SET display_name = ?, avatar = ?, bio = ?, location = ?, email = ?
             WHERE user_id = ?",
        )
        .bind(&changes.display_name)
        .bind(&changes.avatar)
        .bind(&changes.bio)
        .bind(&changes.location)
        .bind(&changes.email)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(PersistenceError::Missing(format!("profile of user {user_id}")));
        }

        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(&changes.email)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        self.require_profile(user_id).await
    }

    async fn delete_user(&self, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
