use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::domain::FolderShare;

#[derive(Clone)]
pub struct ShareRepo {
    pool: PgPool,
}

impl ShareRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, folder_id: i64, shared_with_user_id: i64) -> Result<Option<FolderShare>> {
        sqlx::query_as!(
            FolderShare,
            r#"
            SELECT id, folder_id, owner_id, shared_with_user_id, permission, created_at
            FROM folder_shares
            WHERE folder_id = $1 AND shared_with_user_id = $2
            "#,
            folder_id,
            shared_with_user_id,
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading folder share")
    }

    /// Upserts the share record on `(folder_id, shared_with_user_id)`
    /// (spec.md §3's uniqueness invariant).
    pub async fn upsert(
        &self,
        folder_id: i64,
        owner_id: i64,
        shared_with_user_id: i64,
        permission: &str,
    ) -> Result<FolderShare> {
        sqlx::query_as!(
            FolderShare,
            r#"
            INSERT INTO folder_shares (folder_id, owner_id, shared_with_user_id, permission)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (folder_id, shared_with_user_id)
            DO UPDATE SET permission = EXCLUDED.permission
            RETURNING id, folder_id, owner_id, shared_with_user_id, permission, created_at
            "#,
            folder_id,
            owner_id,
            shared_with_user_id,
            permission,
        )
        .fetch_one(&self.pool)
        .await
        .context("upserting folder share")
    }
}
