use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::domain::User;

#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, username: &str, password_hash: &str) -> Result<User> {
        sqlx::query_as!(
            User,
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
            username,
            password_hash,
        )
        .fetch_one(&self.pool)
        .await
        .context("inserting user")
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as!(
            User,
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
            username,
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading user by username")
    }

    /// Cascades to sessions, folders, images, and shares via FK constraints
    /// (spec.md §3's deletion invariant).
    pub async fn delete(&self, user_id: i64) -> Result<()> {
        sqlx::query!("DELETE FROM users WHERE id = $1", user_id)
            .execute(&self.pool)
            .await
            .context("deleting user")?;
        Ok(())
    }
}
