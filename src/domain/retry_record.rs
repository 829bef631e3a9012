use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a [`FailedEmbedRequest`] or [`FailedIndexDeletion`] row.
/// Transitions: PENDING -> IN_PROGRESS -> SUCCEEDED | PENDING (incremented
/// retry_count) | FAILED. See spec.md §4.3/§4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl RequestStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Succeeded => "SUCCEEDED",
            RequestStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "IN_PROGRESS" => Ok(RequestStatus::InProgress),
            "SUCCEEDED" => Ok(RequestStatus::Succeeded),
            "FAILED" => Ok(RequestStatus::Failed),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// One image to embed, as carried in a [`FailedEmbedRequest`]'s
/// `images_payload` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingImage {
    pub image_id: i64,
    pub relative_filepath: String,
}

#[derive(Debug, Clone)]
pub struct FailedEmbedRequest {
    pub id: i64,
    pub user_id: i64,
    pub folder_id: i64,
    pub images: Vec<PendingImage>,
    pub image_count: i32,
    pub status: RequestStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FailedIndexDeletion {
    pub id: i64,
    pub user_id: i64,
    pub folder_id: i64,
    pub status: RequestStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// `GET /api/admin/retry-queue/stats` response body (spec.md §6).
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryQueueStats {
    pub pending_embeds: i64,
    pub pending_index_deletions: i64,
    pub failed_embeds: i64,
    pub failed_index_deletions: i64,
}
