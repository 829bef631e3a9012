use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::client::{EmbedRequest, SearchClient, SearchRequest, SearchResponse};
use super::wire::{WireEmbedRequest, WireIndexRequest, WireSearchRequest, WireSearchResponse};

/// Targets the primary vector-search backend. One of the two interchangeable
/// [`SearchClient`] implementations (spec.md §4.1, C2); wired live only when
/// [`crate::configuration::ActiveSearchBackend::Primary`] is configured.
#[derive(Debug, Clone)]
pub struct PrimarySearchClient {
    client: Client,
    base_url: String,
}

impl PrimarySearchClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build primary search HTTP client");

        Self { client, base_url }
    }
}

#[async_trait]
impl SearchClient for PrimarySearchClient {
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
