use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::domain::RetryQueueStats;
use crate::error::{AppError, AppResult};
use crate::web::state::AppState;

/// `GET /api/admin/retry-queue/stats` (spec.md §6).
pub async fn retry_queue_stats(State(state): State<AppState>) -> AppResult<Json<RetryQueueStats>> {
    let stats = state.retry.stats().await.map_err(AppError::Internal)?;
    Ok(Json(stats))
}

/// `POST /api/admin/retry-queue/trigger-embed-retry` (spec.md §6, §4.4).
pub async fn trigger_embed_retry(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    state
        .retry_scheduler
        .run_embed_retries()
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "message": "embed retry pass triggered" })))
}

/// `POST /api/admin/retry-queue/trigger-index-deletion-retry` (spec.md §6, §4.4).
pub async fn trigger_index_deletion_retry(
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    state
        .retry_scheduler
        .run_delete_retries()
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "message": "index deletion retry pass triggered" })))
}
