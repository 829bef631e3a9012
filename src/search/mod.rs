pub mod backup;
pub mod breaker;
pub mod client;
pub mod guarded;
pub mod primary;
pub mod wire;

pub use backup::BackupSearchClient;
pub use breaker::{BreakerError, BreakerStateKind, CircuitBreaker};
pub use client::{EmbedImage, EmbedRequest, SearchClient, SearchHit, SearchRequest, SearchResponse};
pub use guarded::{GuardedSearchClient, SearchUnavailable};
pub use primary::PrimarySearchClient;

use std::sync::Arc;

use crate::configuration::{ActiveSearchBackend, BreakerSettings, SearchSettings};
use crate::retry::service::FailedRequestService;

/// Wires exactly one concrete [`SearchClient`] per
/// [`crate::configuration::ActiveSearchBackend`] and wraps it in a
/// [`GuardedSearchClient`]. Switching which backend is live requires a
/// process restart (spec.md §4.1).
pub fn build_guarded_client(
    settings: &SearchSettings,
    breaker_settings: BreakerSettings,
    retry: Arc<FailedRequestService>,
) -> GuardedSearchClient {
    let timeout = settings.request_timeout();

    let inner: Arc<dyn SearchClient> = match settings.active_backend {
        ActiveSearchBackend::Primary => Arc::new(PrimarySearchClient::new(
            settings.primary_search_url.clone(),
            timeout,
        )),
        ActiveSearchBackend::Backup => Arc::new(BackupSearchClient::new(
            settings.backup_search_url.clone(),
            timeout,
        )),
    };

    GuardedSearchClient::new(inner, retry, timeout, breaker_settings)
}
