use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::Session;

#[derive(Clone)]
pub struct SessionRepo {
    pool: PgPool,
}

impl SessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<Session> {
        sqlx::query_as!(
            Session,
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, created_at, expires_at, last_seen
            "#,
            token,
            user_id,
            expires_at,
        )
        .fetch_one(&self.pool)
        .await
        .context("inserting session")
    }

    pub async fn find(&self, token: &str) -> Result<Option<Session>> {
        sqlx::query_as!(
            Session,
            "SELECT token, user_id, created_at, expires_at, last_seen FROM sessions WHERE token = $1",
            token,
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading session")
    }

    /// Sliding expiry: extends `expires_at` and bumps `last_seen` on every
    /// validated use (spec.md §3).
    pub async fn touch(&self, token: &str, new_expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        sqlx::query!(
            "UPDATE sessions SET expires_at = $1, last_seen = $2 WHERE token = $3",
            new_expires_at,
            now,
            token,
        )
        .execute(&self.pool)
        .await
        .context("touching session")?;
        Ok(())
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query!("DELETE FROM sessions WHERE token = $1", token)
            .execute(&self.pool)
            .await
            .context("deleting session")?;
        Ok(())
    }

    /// Periodic sweep of expired rows (spec.md §4.8).
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query!("DELETE FROM sessions WHERE expires_at <= $1", now)
            .execute(&self.pool)
            .await
            .context("sweeping expired sessions")?;
        Ok(result.rows_affected())
    }
}
