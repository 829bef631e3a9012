use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::client::{EmbedRequest, SearchClient, SearchRequest, SearchResponse};
use super::wire::{WireEmbedRequest, WireIndexRequest, WireSearchRequest, WireSearchResponse};

/// Targets the backup vector-search backend — a different concrete search
/// technology than [`super::primary::PrimarySearchClient`], speaking the
/// same documented wire contract (spec.md §6). Only instantiated when
/// [`crate::configuration::ActiveSearchBackend::Backup`] is configured; the
/// two implementations never reference each other (spec.md §9).
#[derive(Debug, Clone)]
pub struct BackupSearchClient {
    client: Client,
    base_url: String,
}

impl BackupSearchClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("image-search-orchestrator-backup/1.0")
            .build()
            .expect("failed to build backup search HTTP client");

        Self { client, base_url }
    }
}

#[async_trait]
impl SearchClient for BackupSearchClient {
    async fn search(&self, req: SearchRequest) -> anyhow::Result<SearchResponse> {
        let wire = WireSearchRequest {
            user_id: req.user_id,
            query: req.query,
            folder_ids: req.folder_ids,
            folder_owner_map: req.folder_owner_map,
            top_k: req.top_k,
        };

        let response = self
            .client
            .post(format!("{}/api/search", self.base_url))
            .json(&wire)
            .send()
            .await?
            .error_for_status()?
            .json::<WireSearchResponse>()
            .await?;

        Ok(SearchResponse {
            results: response.results,
            total: response.total,
        })
    }

    async fn embed_images(&self, req: EmbedRequest) -> anyhow::Result<()> {
        let wire = WireEmbedRequest {
            user_id: req.user_id,
            folder_id: req.folder_id,
            images: req.images,
        };

        self.client
            .post(format!("{}/api/embed-images", self.base_url))
            .json(&wire)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn create_index(&self, user_id: i64, folder_id: i64) -> anyhow::Result<()> {
        let wire = WireIndexRequest { user_id, folder_id };

        self.client
            .post(format!("{}/api/create-index", self.base_url))
            .json(&wire)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn delete_index(&self, user_id: i64, folder_id: i64) -> anyhow::Result<()> {
        self.client
            .delete(format!(
                "{}/api/delete-index/{}/{}",
                self.base_url, user_id, folder_id
            ))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
