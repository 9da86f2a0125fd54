//! Session persistence. Only the SHA-256 of the cookie token is stored;
//! expired rows are ignored by lookups and swept lazily.

use chrono::{Duration, Utc};

use crate::db::{DbPool, Session, User};

#[derive(Clone)]
pub struct SessionStore {
    pool: DbPool,
}

impl SessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<Session, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query_as(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(user_id)
        .bind(token_hash)
        .bind((now + ttl).to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
    }

    /// Resolve an unexpired session token hash to its account.
    pub async fn find_live_user(&self, token_hash: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT u.* FROM users u
             JOIN sessions s ON s.user_id = u.id
             WHERE s.token_hash = ? AND s.expires_at > ?",
        )
        .bind(token_hash)
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&self.pool)
        .await
    }

    /// Idempotent: deleting a token that has no session row is a no-op.
    pub async fn delete_by_token_hash(&self, token_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
