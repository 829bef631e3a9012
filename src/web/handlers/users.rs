use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{generate_session_token, hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::web::extractors::authenticate;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("username and password are required".into()));
    }

    if state
        .users
        .find_by_username(&req.username)
        .await
        .map_err(AppError::Internal)?
        .is_some()
    {
        return Err(AppError::Conflict(format!("username {} is already taken", req.username)));
    }

    let password_hash = hash_password(&req.password).map_err(AppError::Internal)?;
    let user = state
        .users
        .insert(&req.username, &password_hash)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(RegisterResponse {
        id: user.id,
        username: user.username,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::AuthMissing)?;

    let valid = verify_password(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::AuthMissing);
    }

    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::hours(state.session_settings.ttl_hours);
    state
        .sessions
        .insert(&token, user.id, expires_at)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> AppResult<Json<serde_json::Value>> {
    authenticate(&state, &req.token).await?;
    state.sessions.delete(&req.token).await.map_err(AppError::Internal)?;
    Ok(Json(json!({ "message": "logged out" })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub token: String,
}

/// Cascades DB rows via FK constraints; best-effort cleans up each
/// folder's remote index and filesystem subtree. Enqueue-and-return for
/// the remote index deletions, not a blocking call (spec.md §4.8, §9 open
/// question).
pub async fn delete_account(
    State(state): State<AppState>,
    Json(req): Json<DeleteAccountRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = authenticate(&state, &req.token).await?;

    let folders = state
        .folders
        .accessible_to_user(user_id)
        .await
        .map_err(AppError::Internal)?;

    for folder in folders.into_iter().filter(|f| f.is_owner) {
        state.search_client.delete_index(user_id, folder.id).await;
        let folder_dir = state
            .data_root
            .join("uploads")
            .join("images")
            .join(user_id.to_string())
            .join(folder.id.to_string());
        let _ = tokio::fs::remove_dir_all(folder_dir).await;
    }

    state.users.delete(user_id).await.map_err(AppError::Internal)?;

    Ok(Json(json!({ "message": "account deleted" })))
}
