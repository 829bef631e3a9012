use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    View,
    Edit,
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Permission::View),
            "edit" => Ok(Permission::Edit),
            other => Err(format!("unknown permission: {other}")),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FolderShare {
    pub id: i64,
    pub folder_id: i64,
    pub owner_id: i64,
    pub shared_with_user_id: i64,
    pub permission: String,
    pub created_at: DateTime<Utc>,
}
