//! JSON wire shapes exchanged with the remote search service (spec.md §6).
//! snake_case field names map directly onto the documented request/response
//! bodies; these are kept separate from the internal [`super::client`] types
//! so the two backends can each have their own quirks without leaking into
//! the trait contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::client::{EmbedImage, SearchHit};

#[derive(Debug, Serialize)]
pub struct WireSearchRequest {
    pub user_id: i64,
    pub query: String,
    pub folder_ids: Vec<i64>,
    pub folder_owner_map: HashMap<i64, i64>,
    pub top_k: u32,
}

#[derive(Debug, Deserialize)]
pub struct WireSearchResponse {
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct WireEmbedRequest {
    pub user_id: i64,
    pub folder_id: i64,
    pub images: Vec<EmbedImage>,
}

#[derive(Debug, Serialize)]
pub struct WireIndexRequest {
    pub user_id: i64,
    pub folder_id: i64,
}
