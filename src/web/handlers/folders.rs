use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::web::extractors::authenticate;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct FolderView {
    pub id: i64,
    pub name: String,
    pub is_owner: bool,
    pub is_shared: bool,
    pub owner_id: i64,
    pub owner_username: String,
}

/// `GET /api/folders?token` (spec.md §6).
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TokenQuery>,
) -> AppResult<Json<Vec<FolderView>>> {
    let user_id = authenticate(&state, &params.token).await?;

    let folders = state
        .folders
        .accessible_to_user(user_id)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(
        folders
            .into_iter()
            .map(|f| FolderView {
                id: f.id,
                name: f.name,
                is_owner: f.is_owner,
                is_shared: f.is_shared,
                owner_id: f.owner_id,
                owner_username: f.owner_username,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteFoldersRequest {
    pub token: String,
    pub folder_ids: Vec<i64>,
}

/// `DELETE /api/folders` `{token, folder_ids}` (spec.md §6). Deletion
/// succeeds even when the remote is down; orphan indexes are cleaned up by
/// C5 via a queued [`crate::domain::FailedIndexDeletion`].
pub async fn delete(
    State(state): State<AppState>,
    Json(req): Json<DeleteFoldersRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = authenticate(&state, &req.token).await?;

    let mut owned_ids = Vec::new();
    for &folder_id in &req.folder_ids {
        if state
            .access
            .is_owner(user_id, folder_id)
            .await
            .map_err(AppError::Internal)?
        {
            owned_ids.push(folder_id);
        }
    }

    let deleted = state
        .folders
        .delete_many(&owned_ids)
        .await
        .map_err(AppError::Internal)?;

    for folder_id in &deleted {
        state.search_client.delete_index(user_id, *folder_id).await;
        let folder_dir = state
            .data_root
            .join("uploads")
            .join("images")
            .join(user_id.to_string())
            .join(folder_id.to_string());
        let _ = tokio::fs::remove_dir_all(folder_dir).await;
    }

    Ok(Json(json!({ "message": format!("{} folder(s) deleted", deleted.len()) })))
}

#[derive(Debug, Deserialize)]
pub struct ShareFolderRequest {
    pub token: String,
    pub folder_id: i64,
    pub target_username: String,
    pub permission: String,
}

/// `POST /api/folders/share` (spec.md §6). Folder-sharing CRUD beyond the
/// access check is out of scope (spec.md §1), but the share endpoint
/// itself is the one write path C10's access checks depend on.
pub async fn share(
    State(state): State<AppState>,
    Json(req): Json<ShareFolderRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = authenticate(&state, &req.token).await?;

    if !state
        .access
        .is_owner(user_id, req.folder_id)
        .await
        .map_err(AppError::Internal)?
    {
        return Err(AppError::AuthDenied);
    }

    let target = state
        .users
        .find_by_username(&req.target_username)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", req.target_username)))?;

    req.permission
        .parse::<crate::domain::Permission>()
        .map_err(AppError::Validation)?;

    state
        .shares
        .upsert(req.folder_id, user_id, target.id, &req.permission)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "message": format!("folder shared with {}", req.target_username) })))
}
