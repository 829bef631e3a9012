use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::configuration::RetrySettings;
use crate::repo::retry_repo::RetryQueueRepo;
use crate::search::{EmbedRequest, SearchClient};

/// Two periodic jobs — embed retries and index-deletion retries — each
/// draining [`RetryQueueRepo`], re-invoking C1 directly, and updating
/// request status (spec.md §4.4, C5).
pub struct RetryScheduler {
    repo: RetryQueueRepo,
    search_client: Arc<dyn SearchClient>,
    settings: RetrySettings,
    shutdown: watch::Receiver<bool>,
}

impl RetryScheduler {
    pub fn new(
        repo: RetryQueueRepo,
        search_client: Arc<dyn SearchClient>,
        settings: RetrySettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            repo,
            search_client,
            settings,
            shutdown,
        }
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Spawns the embed-retry loop, the delete-retry loop, and the
    /// retention cleanup pass. Returns their join handles so the caller can
    /// wait for a shutdown grace period before exiting.
    pub fn spawn(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut shutdown = self.shutdown.clone();
        let embed_loop = {
            let this = self.clone();
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(this.settings.embed_interval_s));
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = this.run_embed_retries().await {
                                error!(error = %e, "embed retry pass failed");
                            }
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                info!("embed retry loop shutting down");
                                break;
                            }
                        }
                    }
                }
            })
        };

        let delete_loop = {
            let this = self.clone();
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(this.settings.delete_interval_s));
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = this.run_delete_retries().await {
                                error!(error = %e, "index deletion retry pass failed");
                            }
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                info!("delete retry loop shutting down");
                                break;
                            }
                        }
                    }
                }
            })
        };

        let cleanup_loop = {
            let this = self.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match this.repo.delete_old_succeeded(this.settings.retention_days).await {
                                Ok(n) if n > 0 => info!(deleted = n, "cleaned up succeeded retry rows"),
                                Ok(_) => {}
                                Err(e) => error!(error = %e, "retention cleanup failed"),
                            }
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
            })
        };

        vec![embed_loop, delete_loop, cleanup_loop]
    }

    pub async fn run_embed_retries(&self) -> anyhow::Result<()> {
        let rows = self.repo.claim_pending_embeds(self.settings.batch_size).await?;
        if rows.is_empty() {
            return Ok(());
        }
        info!(count = rows.len(), "retrying pending embed requests");

        for row in rows {
            if self.is_shutting_down() {
                info!("embed retry pass interrupted by shutdown, remaining rows stay claimed for next pass");
                break;
            }

            let req = EmbedRequest {
                user_id: row.user_id,
                folder_id: row.folder_id,
                images: row
                    .images
                    .iter()
                    .map(|i| crate::search::EmbedImage {
                        image_id: i.image_id,
                        file_path: i.relative_filepath.clone(),
                    })
                    .collect(),
            };

            match self.search_client.embed_images(req).await {
                Ok(()) => {
                    self.repo.mark_embed_succeeded(row.id).await?;
                }
                Err(e) => {
                    let retry_count = row.retry_count + 1;
                    self.repo
                        .mark_embed_failed_or_retry(
                            row.id,
                            retry_count,
                            self.settings.max_attempts,
                            &e.to_string(),
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }

    pub async fn run_delete_retries(&self) -> anyhow::Result<()> {
        let rows = self.repo.claim_pending_deletes(self.settings.batch_size).await?;
        if rows.is_empty() {
            return Ok(());
        }
        info!(count = rows.len(), "retrying pending index deletions");

        for row in rows {
            if self.is_shutting_down() {
                info!("index deletion retry pass interrupted by shutdown, remaining rows stay claimed for next pass");
                break;
            }

            match self.search_client.delete_index(row.user_id, row.folder_id).await {
                Ok(()) => {
                    self.repo.mark_delete_succeeded(row.id).await?;
                }
                Err(e) => {
                    let retry_count = row.retry_count + 1;
                    self.repo
                        .mark_delete_failed_or_retry(
                            row.id,
                            retry_count,
                            self.settings.max_attempts,
                            &e.to_string(),
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }
}
