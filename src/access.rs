use anyhow::Result;

use crate::repo::{FolderRepo, ShareRepo};

/// `mayRead(user, folder) = owner? ∨ shared?` (spec.md §4.7 / C10). Invoked
/// on any operation that takes a folder-id as input — delete, add images,
/// share.
#[derive(Clone)]
pub struct AccessControl {
    folders: FolderRepo,
    shares: ShareRepo,
}

impl AccessControl {
    pub fn new(folders: FolderRepo, shares: ShareRepo) -> Self {
        Self { folders, shares }
    }

    pub async fn may_read(&self, user_id: i64, folder_id: i64) -> Result<bool> {
        let Some(folder) = self.folders.find_by_id(folder_id).await? else {
            return Ok(false);
        };

        if folder.owner_id == user_id {
            return Ok(true);
        }

        Ok(self.shares.find(folder_id, user_id).await?.is_some())
    }

    /// Owner-only check, used for mutating operations (delete, share) that
    /// spec.md §4.7 restricts beyond the read-access check.
    pub async fn is_owner(&self, user_id: i64, folder_id: i64) -> Result<bool> {
        match self.folders.find_by_id(folder_id).await? {
            Some(folder) => Ok(folder.owner_id == user_id),
            None => Ok(false),
        }
    }

    /// Filters a supplied folder-id list down to those the user may read,
    /// silently dropping the rest (spec.md §4.7 step 1).
    pub async fn filter_readable(&self, user_id: i64, folder_ids: &[i64]) -> Result<Vec<i64>> {
        let mut readable = Vec::with_capacity(folder_ids.len());
        for &folder_id in folder_ids {
            if self.may_read(user_id, folder_id).await? {
                readable.push(folder_id);
            }
        }
        Ok(readable)
    }
}
