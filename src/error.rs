use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// The taxonomy from spec.md §7, collapsed into a single enum rendered by
/// one top-level `IntoResponse` impl. Fallback paths (createIndex,
/// embedImages, deleteIndex) never construct one of these — they absorb,
/// persist for retry, or are logged instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    AuthMissing,

    #[error("session expired")]
    AuthExpired,

    #[error("access denied")]
    AuthDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("search service temporarily unavailable")]
    ServiceUnavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AuthMissing | AppError::AuthExpired => StatusCode::UNAUTHORIZED,
            AppError::AuthDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    status: u16,
    timestamp: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if matches!(self, AppError::Internal(_)) {
            tracing::error!(error = %self, "internal error");
        }

        let detail = match &self {
            // Internal detail is logged above but never leaked to the client.
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            detail,
            status: status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(json!(body))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
