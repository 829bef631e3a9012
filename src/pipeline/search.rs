use std::collections::HashMap;
use std::sync::Arc;

use crate::access::AccessControl;
use crate::error::{AppError, AppResult};
use crate::repo::{FolderRepo, ImageRepo};
use crate::search::{GuardedSearchClient, SearchRequest};

/// One enriched hit, ready to be rendered as the client-facing
/// `{image, similarity}` pair (spec.md §6).
#[derive(Debug, Clone)]
pub struct EnrichedHit {
    pub url: String,
    pub similarity: f64,
}

/// Resolves accessible folders, builds the folder-owner map, calls C1, and
/// joins results back to image metadata in a single batch (spec.md §4.7,
/// C9).
#[derive(Clone)]
pub struct SearchPipeline {
    folders: FolderRepo,
    images: ImageRepo,
    access: AccessControl,
    search_client: Arc<GuardedSearchClient>,
    base_url: String,
}

impl SearchPipeline {
    pub fn new(
        folders: FolderRepo,
        images: ImageRepo,
        access: AccessControl,
        search_client: Arc<GuardedSearchClient>,
        base_url: String,
    ) -> Self {
        Self {
            folders,
            images,
            access,
            search_client,
            base_url,
        }
    }

    pub async fn search(
        &self,
        user_id: i64,
        query: &str,
        requested_folder_ids: Option<Vec<i64>>,
        top_k: u32,
    ) -> AppResult<Vec<EnrichedHit>> {
        let folder_ids = self.resolve_folders(user_id, requested_folder_ids).await?;

        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }

        let folder_owner_map = self
            .folders
            .owner_map(&folder_ids)
            .await
            .map_err(AppError::Internal)?;

        let response = self
            .search_client
            .search(SearchRequest {
                user_id,
                query: query.to_string(),
                folder_ids,
                folder_owner_map,
                top_k,
            })
            .await
            .map_err(|_| AppError::ServiceUnavailable)?;

        let image_ids: Vec<i64> = response.results.iter().map(|hit| hit.image_id).collect();
        let paths: HashMap<i64, String> = self
            .images
            .relative_paths_by_ids(&image_ids)
            .await
            .map_err(AppError::Internal)?;

        let hits = response
            .results
            .into_iter()
            .filter_map(|hit| {
                paths.get(&hit.image_id).map(|relative_filepath| EnrichedHit {
                    url: format!("{}/{}", self.base_url, relative_filepath),
                    similarity: hit.score,
                })
            })
            .collect();

        Ok(hits)
    }

    /// Folder resolution per spec.md §4.7 step 1: enumerate owned+shared
    /// folders when no ids are supplied, otherwise filter the supplied ids
    /// through [`AccessControl`], silently dropping inaccessible ones.
    async fn resolve_folders(
        &self,
        user_id: i64,
        requested_folder_ids: Option<Vec<i64>>,
    ) -> AppResult<Vec<i64>> {
        match requested_folder_ids {
            None => {
                let accessible = self
                    .folders
                    .accessible_to_user(user_id)
                    .await
                    .map_err(AppError::Internal)?;
                Ok(accessible.into_iter().map(|f| f.id).collect())
            }
            Some(ids) => self
                .access
                .filter_readable(user_id, &ids)
                .await
                .map_err(AppError::Internal),
        }
    }
}
