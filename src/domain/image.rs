use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Image {
    pub id: i64,
    pub owner_id: i64,
    pub folder_id: i64,
    pub relative_filepath: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Image {
    /// `images/{owner_id}/{folder_id}/{filename}` — deterministic from
    /// `(owner_id, folder_id, filename)` per spec.md §3's Image invariant.
    pub fn relative_path(owner_id: i64, folder_id: i64, filename: &str) -> String {
        format!("images/{owner_id}/{folder_id}/{filename}")
    }
}
