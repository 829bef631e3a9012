use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Folder {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A folder joined with the requesting user's relationship to it, as
/// returned by `GET /api/folders` (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct AccessibleFolder {
    pub id: i64,
    pub name: String,
    pub is_owner: bool,
    pub is_shared: bool,
    pub owner_id: i64,
    pub owner_username: String,
}
