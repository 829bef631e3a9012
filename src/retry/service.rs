use anyhow::Result;
use tracing::warn;

use crate::domain::retry_record::{PendingImage, RetryQueueStats};
use crate::repo::retry_repo::RetryQueueRepo;

/// Write path from breaker fallback handlers into the retry queue; read
/// path for [`crate::retry::scheduler::RetryScheduler`] and the admin
/// endpoints (spec.md §4.3, C6).
#[derive(Clone)]
pub struct FailedRequestService {
    repo: RetryQueueRepo,
}

impl FailedRequestService {
    pub fn new(repo: RetryQueueRepo) -> Self {
        Self { repo }
    }

    pub async fn record_failed_embed(
        &self,
        user_id: i64,
        folder_id: i64,
        images: Vec<PendingImage>,
        error: &str,
    ) -> Result<i64> {
        warn!(user_id, folder_id, count = images.len(), error, "queuing embed request for retry");
        self.repo
            .insert_failed_embed(user_id, folder_id, &images, error)
            .await
    }

    pub async fn record_failed_delete(
        &self,
        user_id: i64,
        folder_id: i64,
        error: &str,
    ) -> Result<i64> {
        warn!(user_id, folder_id, error, "queuing index deletion for retry");
        self.repo.insert_failed_delete(user_id, folder_id, error).await
    }

    pub async fn stats(&self) -> Result<RetryQueueStats> {
        self.repo.stats().await
    }

    pub fn repo(&self) -> &RetryQueueRepo {
        &self.repo
    }
}
