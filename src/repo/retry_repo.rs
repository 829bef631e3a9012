use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::retry_record::{
    FailedEmbedRequest, FailedIndexDeletion, PendingImage, RequestStatus, RetryQueueStats,
};

/// Durable store behind the retry queue (spec.md §4.3, C4). Two tables,
/// atomic claims via `UPDATE ... WHERE status = $expected ... RETURNING`
/// so concurrent retry loops never double-process a row (spec.md §5).
#[derive(Clone)]
pub struct RetryQueueRepo {
    pool: PgPool,
}

impl RetryQueueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_failed_embed(
        &self,
        user_id: i64,
        folder_id: i64,
        images: &[PendingImage],
        error: &str,
    ) -> Result<i64> {
        let payload = serde_json::to_value(images).context("serializing embed payload")?;

        let row = sqlx::query!(
            r#"
            INSERT INTO failed_embed_requests
                (user_id, folder_id, images_payload, image_count, status, retry_count, error_message)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING id
            "#,
            user_id,
            folder_id,
            payload,
            images.len() as i32,
            RequestStatus::Pending.as_db_str(),
            error,
        )
        .fetch_one(&self.pool)
        .await
        .context("inserting failed embed request")?;

        Ok(row.id)
    }

    pub async fn insert_failed_delete(
        &self,
        user_id: i64,
        folder_id: i64,
        error: &str,
    ) -> Result<i64> {
        let row = sqlx::query!(
            r#"
            INSERT INTO failed_index_deletions (user_id, folder_id, status, retry_count, error_message)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING id
            "#,
            user_id,
            folder_id,
            RequestStatus::Pending.as_db_str(),
            error,
        )
        .fetch_one(&self.pool)
        .await
        .context("inserting failed index deletion")?;

        Ok(row.id)
    }

    /// Claims up to `limit` PENDING embed rows by flipping them to
    /// IN_PROGRESS in a single statement, oldest first.
    pub async fn claim_pending_embeds(&self, limit: i64) -> Result<Vec<FailedEmbedRequest>> {
        let rows = sqlx::query!(
            r#"
            UPDATE failed_embed_requests
            SET status = $1
            WHERE id IN (
                SELECT id FROM failed_embed_requests
                WHERE status = $2
                ORDER BY created_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, user_id, folder_id, images_payload, image_count,
                      status, retry_count, created_at, last_retry_at, error_message
            "#,
            RequestStatus::InProgress.as_db_str(),
            RequestStatus::Pending.as_db_str(),
            limit,
        )
        .fetch_all(&self.pool)
        .await
        .context("claiming pending embed requests")?;

        rows.into_iter()
            .map(|r| {
                let images: Vec<PendingImage> =
                    serde_json::from_value(r.images_payload).context("decoding embed payload")?;
                let status = RequestStatus::from_str(&r.status)
                    .map_err(anyhow::Error::msg)
                    .context("decoding embed request status")?;
                Ok(FailedEmbedRequest {
                    id: r.id,
                    user_id: r.user_id,
                    folder_id: r.folder_id,
                    images,
                    image_count: r.image_count,
                    status,
                    retry_count: r.retry_count,
                    created_at: r.created_at,
                    last_retry_at: r.last_retry_at,
                    error_message: r.error_message,
                })
            })
            .collect()
    }

    pub async fn claim_pending_deletes(&self, limit: i64) -> Result<Vec<FailedIndexDeletion>> {
        let rows = sqlx::query!(
            r#"
            UPDATE failed_index_deletions
            SET status = $1
            WHERE id IN (
                SELECT id FROM failed_index_deletions
                WHERE status = $2
                ORDER BY created_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, user_id, folder_id, status, retry_count, created_at, last_retry_at, error_message
            "#,
            RequestStatus::InProgress.as_db_str(),
            RequestStatus::Pending.as_db_str(),
            limit,
        )
        .fetch_all(&self.pool)
        .await
        .context("claiming pending index deletions")?;

        rows.into_iter()
            .map(|r| {
                let status = RequestStatus::from_str(&r.status)
                    .map_err(anyhow::Error::msg)
                    .context("decoding index deletion status")?;
                Ok(FailedIndexDeletion {
                    id: r.id,
                    user_id: r.user_id,
                    folder_id: r.folder_id,
                    status,
                    retry_count: r.retry_count,
                    created_at: r.created_at,
                    last_retry_at: r.last_retry_at,
                    error_message: r.error_message,
                })
            })
            .collect()
    }

    pub async fn mark_embed_succeeded(&self, id: i64) -> Result<()> {
        sqlx::query!(
            "UPDATE failed_embed_requests SET status = $1 WHERE id = $2",
            RequestStatus::Succeeded.as_db_str(),
            id
        )
        .execute(&self.pool)
        .await
        .context("marking embed request succeeded")?;
        Ok(())
    }

    pub async fn mark_embed_failed_or_retry(
        &self,
        id: i64,
        retry_count: i32,
        max_attempts: i32,
        error: &str,
    ) -> Result<()> {
        let new_status = if retry_count >= max_attempts {
            RequestStatus::Failed.as_db_str()
        } else {
            RequestStatus::Pending.as_db_str()
        };

        sqlx::query!(
            r#"
            UPDATE failed_embed_requests
            SET status = $1, retry_count = $2, last_retry_at = $3, error_message = $4
            WHERE id = $5
            "#,
            new_status,
            retry_count,
            Utc::now(),
            error,
            id,
        )
        .execute(&self.pool)
        .await
        .context("updating embed retry state")?;

        Ok(())
    }

    pub async fn mark_delete_succeeded(&self, id: i64) -> Result<()> {
        sqlx::query!(
            "UPDATE failed_index_deletions SET status = $1 WHERE id = $2",
            RequestStatus::Succeeded.as_db_str(),
            id
        )
        .execute(&self.pool)
        .await
        .context("marking index deletion succeeded")?;
        Ok(())
    }

    pub async fn mark_delete_failed_or_retry(
        &self,
        id: i64,
        retry_count: i32,
        max_attempts: i32,
        error: &str,
    ) -> Result<()> {
        let new_status = if retry_count >= max_attempts {
            RequestStatus::Failed.as_db_str()
        } else {
            RequestStatus::Pending.as_db_str()
        };

        sqlx::query!(
            r#"
            UPDATE failed_index_deletions
            SET status = $1, retry_count = $2, last_retry_at = $3, error_message = $4
            WHERE id = $5
            "#,
            new_status,
            retry_count,
            Utc::now(),
            error,
            id,
        )
        .execute(&self.pool)
        .await
        .context("updating index deletion retry state")?;

        Ok(())
    }

    pub async fn delete_old_succeeded(&self, retention_days: i64) -> Result<u64> {
        let embeds = sqlx::query!(
            "DELETE FROM failed_embed_requests WHERE status = $1 AND created_at < NOW() - ($2 || ' days')::interval",
            RequestStatus::Succeeded.as_db_str(),
            retention_days.to_string(),
        )
        .execute(&self.pool)
        .await
        .context("cleaning up succeeded embed requests")?
        .rows_affected();

        let deletes = sqlx::query!(
            "DELETE FROM failed_index_deletions WHERE status = $1 AND created_at < NOW() - ($2 || ' days')::interval",
            RequestStatus::Succeeded.as_db_str(),
            retention_days.to_string(),
        )
        .execute(&self.pool)
        .await
        .context("cleaning up succeeded index deletions")?
        .rows_affected();

        Ok(embeds + deletes)
    }

    pub async fn stats(&self) -> Result<RetryQueueStats> {
        let embeds = sqlx::query!(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = $1) as "pending!",
                COUNT(*) FILTER (WHERE status = $2) as "failed!"
            FROM failed_embed_requests
            "#,
            RequestStatus::Pending.as_db_str(),
            RequestStatus::Failed.as_db_str(),
        )
        .fetch_one(&self.pool)
        .await
        .context("loading embed retry stats")?;

        let deletions = sqlx::query!(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = $1) as "pending!",
                COUNT(*) FILTER (WHERE status = $2) as "failed!"
            FROM failed_index_deletions
            "#,
            RequestStatus::Pending.as_db_str(),
            RequestStatus::Failed.as_db_str(),
        )
        .fetch_one(&self.pool)
        .await
        .context("loading index deletion retry stats")?;

        Ok(RetryQueueStats {
            pending_embeds: embeds.pending,
            failed_embeds: embeds.failed,
            pending_index_deletions: deletions.pending,
            failed_index_deletions: deletions.failed,
        })
    }
}
