use anyhow::{Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::Image;

#[derive(Clone)]
pub struct ImageRepo {
    pool: PgPool,
}

impl ImageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, owner_id: i64, folder_id: i64, relative_filepath: &str) -> Result<Image> {
        sqlx::query_as!(
            Image,
            r#"
            INSERT INTO images (owner_id, folder_id, relative_filepath)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, folder_id, relative_filepath, uploaded_at
            "#,
            owner_id,
            folder_id,
            relative_filepath,
        )
        .fetch_one(&self.pool)
        .await
        .context("inserting image")
    }

    /// Batch lookup `image_id -> relative_filepath` (spec.md §4.7 step 5 /
    /// §9's "batch the enrichment" note — one query, never one per hit).
    pub async fn relative_paths_by_ids(&self, image_ids: &[i64]) -> Result<HashMap<i64, String>> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query!(
            "SELECT id, relative_filepath FROM images WHERE id = ANY($1)",
            image_ids,
        )
        .fetch_all(&self.pool)
        .await
        .context("loading image paths")?;

        Ok(rows.into_iter().map(|r| (r.id, r.relative_filepath)).collect())
    }

    pub async fn list_by_folder(&self, folder_id: i64) -> Result<Vec<Image>> {
        sqlx::query_as!(
            Image,
            "SELECT id, owner_id, folder_id, relative_filepath, uploaded_at FROM images WHERE folder_id = $1",
            folder_id,
        )
        .fetch_all(&self.pool)
        .await
        .context("listing images by folder")
    }
}
