use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::pipeline::upload::UploadedFile;
use crate::web::extractors::authenticate;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub folder_id: i64,
    pub uploaded_count: usize,
}

/// `POST /api/images/upload` multipart: `token`, `folderName`, `files[]`
/// (spec.md §6).
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut token: Option<String> = None;
    let mut folder_name: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "token" => {
                token = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                )
            }
            "folderName" | "folder_name" => {
                folder_name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                )
            }
            "files" | "files[]" => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| AppError::Validation("file field missing filename".into()))?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                files.push(UploadedFile { filename, bytes });
            }
            _ => {}
        }
    }

    let token = token.ok_or(AppError::AuthMissing)?;
    let folder_name = folder_name
        .ok_or_else(|| AppError::Validation("folderName is required".into()))?;

    let user_id = authenticate(&state, &token).await?;

    let outcome = state
        .upload_pipeline
        .upload(user_id, &folder_name, files)
        .await?;

    Ok(Json(UploadResponse {
        message: "upload accepted".to_string(),
        folder_id: outcome.folder_id,
        uploaded_count: outcome.uploaded_count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub token: String,
    pub query: String,
    pub folder_ids: Option<String>,
    pub top_k: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub image: String,
    pub similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponseBody {
    pub results: Vec<SearchResultItem>,
}

/// `GET /api/images/search?token&query&folder_ids=csv&top_k` (spec.md §6).
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponseBody>> {
    let user_id = authenticate(&state, &params.token).await?;

    let folder_ids = match params.folder_ids {
        Some(csv) if !csv.trim().is_empty() => Some(
            csv.split(',')
                .map(|s| {
                    s.trim()
                        .parse::<i64>()
                        .map_err(|_| AppError::Validation(format!("invalid folder id: {s}")))
                })
                .collect::<AppResult<Vec<i64>>>()?,
        ),
        _ => None,
    };

    let top_k = params.top_k.unwrap_or(5);

    let hits = state
        .search_pipeline
        .search(user_id, &params.query, folder_ids, top_k)
        .await?;

    Ok(Json(SearchResponseBody {
        results: hits
            .into_iter()
            .map(|hit| SearchResultItem {
                image: hit.url,
                similarity: hit.similarity,
            })
            .collect(),
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
