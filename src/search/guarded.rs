use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::breaker::{BreakerError, CircuitBreaker};
use super::client::{EmbedRequest, SearchClient, SearchRequest, SearchResponse};
use crate::configuration::BreakerSettings;
use crate::domain::retry_record::PendingImage;
use crate::retry::service::FailedRequestService;

/// Wraps whichever [`SearchClient`] is live with one named
/// [`CircuitBreaker`] per method and the per-method fallback table from
/// spec.md §4.2 — the single place the degradation policy lives (spec.md
/// §9's "fallbacks as explicit strategies" design note).
pub struct GuardedSearchClient {
    inner: Arc<dyn SearchClient>,
    retry: Arc<FailedRequestService>,
    timeout: Duration,
    search_breaker: CircuitBreaker,
    embed_breaker: CircuitBreaker,
    create_index_breaker: CircuitBreaker,
    delete_index_breaker: CircuitBreaker,
}

/// Surfaced to the HTTP layer when `search`'s breaker is open or the call
/// itself fails — spec.md §4.2: "search fallback: fail fast ... HTTP 503.
/// Does not enqueue anything."
#[derive(Debug, thiserror::Error)]
#[error("search service unavailable")]
pub struct SearchUnavailable;

impl GuardedSearchClient {
    pub fn new(
        inner: Arc<dyn SearchClient>,
        retry: Arc<FailedRequestService>,
        timeout: Duration,
        breaker_settings: BreakerSettings,
    ) -> Self {
        Self {
            inner,
            retry,
            timeout,
            search_breaker: CircuitBreaker::new("search", breaker_settings.clone()),
            embed_breaker: CircuitBreaker::new("embed_images", breaker_settings.clone()),
            create_index_breaker: CircuitBreaker::new("create_index", breaker_settings.clone()),
            delete_index_breaker: CircuitBreaker::new("delete_index", breaker_settings),
        }
    }

    /// `search` fallback: fail fast, no enqueue (spec.md §4.2).
    pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse, SearchUnavailable> {
        let inner = self.inner.clone();
        let result = self
            .search_breaker
            .call(self.timeout, move || async move { inner.search(req).await })
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(BreakerError::Open(name)) => {
                warn!(breaker = %name, "search breaker open, failing fast");
                Err(SearchUnavailable)
            }
            Err(BreakerError::Upstream(e)) => {
                error!(error = %e, "search call failed");
                Err(SearchUnavailable)
            }
        }
    }

    /// `embedImages` fallback: persist a FailedEmbedRequest and return
    /// `Ok(())` so the upload still succeeds (spec.md §4.2).
    pub async fn embed_images(&self, req: EmbedRequest) {
        let user_id = req.user_id;
        let folder_id = req.folder_id;
        let images: Vec<PendingImage> = req
            .images
            .iter()
            .map(|i| PendingImage {
                image_id: i.image_id,
                relative_filepath: i.file_path.clone(),
            })
            .collect();

        let inner = self.inner.clone();
        let result = self
            .embed_breaker
            .call(self.timeout, move || async move { inner.embed_images(req).await })
            .await;

        if let Err(err) = result {
            let message = err.to_string();
            warn!(user_id, folder_id, error = %message, "embed_images failed, recording for retry");
            if let Err(persist_err) = self
                .retry
                .record_failed_embed(user_id, folder_id, images, &message)
                .await
            {
                error!(error = %persist_err, "failed to persist embed retry row");
            }
        }
    }

    /// `createIndex` fallback: log and return; the remote auto-creates on
    /// first embedding (spec.md §4.2).
    pub async fn create_index(&self, user_id: i64, folder_id: i64) {
        let inner = self.inner.clone();
        let result = self
            .create_index_breaker
            .call(self.timeout, move || async move {
                inner.create_index(user_id, folder_id).await
            })
            .await;

        if let Err(err) = result {
            info!(user_id, folder_id, error = %err, "create_index failed, relying on auto-create on first embed");
        }
    }

    /// `deleteIndex` fallback: persist a FailedIndexDeletion and return;
    /// deletion is best-effort (spec.md §4.2).
    pub async fn delete_index(&self, user_id: i64, folder_id: i64) {
        let inner = self.inner.clone();
        let result = self
            .delete_index_breaker
            .call(self.timeout, move || async move {
                inner.delete_index(user_id, folder_id).await
            })
            .await;

        if let Err(err) = result {
            let message = err.to_string();
            warn!(user_id, folder_id, error = %message, "delete_index failed, recording for retry");
            if let Err(persist_err) = self
                .retry
                .record_failed_delete(user_id, folder_id, &message)
                .await
            {
                error!(error = %persist_err, "failed to persist delete retry row");
            }
        }
    }
}
