use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One image to submit for embedding, as carried over the wire to
/// `/api/embed-images` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedImage {
    pub image_id: i64,
    pub file_path: String,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub user_id: i64,
    pub query: String,
    pub folder_ids: Vec<i64>,
    pub folder_owner_map: HashMap<i64, i64>,
    pub top_k: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub image_id: i64,
    pub score: f64,
    pub folder_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub user_id: i64,
    pub folder_id: i64,
    pub images: Vec<EmbedImage>,
}

/// Abstract contract for the remote search service (spec.md §4.1, C1).
/// Exactly two implementations exist ([`crate::search::PrimarySearchClient`]
/// and [`crate::search::BackupSearchClient`]); only one is constructed at
/// startup per [`crate::configuration::ActiveSearchBackend`].
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, req: SearchRequest) -> anyhow::Result<SearchResponse>;

    async fn embed_images(&self, req: EmbedRequest) -> anyhow::Result<()>;

    async fn create_index(&self, user_id: i64, folder_id: i64) -> anyhow::Result<()>;

    async fn delete_index(&self, user_id: i64, folder_id: i64) -> anyhow::Result<()>;
}
