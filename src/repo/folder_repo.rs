use anyhow::{Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::{AccessibleFolder, Folder};

#[derive(Clone)]
pub struct FolderRepo {
    pool: PgPool,
}

impl FolderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_owner_and_name(&self, owner_id: i64, name: &str) -> Result<Option<Folder>> {
        sqlx::query_as!(
            Folder,
            "SELECT id, owner_id, name, created_at FROM folders WHERE owner_id = $1 AND name = $2",
            owner_id,
            name,
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading folder by owner and name")
    }

    pub async fn find_by_id(&self, folder_id: i64) -> Result<Option<Folder>> {
        sqlx::query_as!(
            Folder,
            "SELECT id, owner_id, name, created_at FROM folders WHERE id = $1",
            folder_id,
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading folder by id")
    }

    /// Resolves or creates `(owner_id, name)` (spec.md §4.6 step 2).
    pub async fn get_or_create(&self, owner_id: i64, name: &str) -> Result<(Folder, bool)> {
        if let Some(existing) = self.find_by_owner_and_name(owner_id, name).await? {
            return Ok((existing, false));
        }

        let folder = sqlx::query_as!(
            Folder,
            r#"
            INSERT INTO folders (owner_id, name)
            VALUES ($1, $2)
            ON CONFLICT (owner_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, owner_id, name, created_at
            "#,
            owner_id,
            name,
        )
        .fetch_one(&self.pool)
        .await
        .context("creating folder")?;

        Ok((folder, true))
    }

    /// Owned ∪ shared-with-me folders, each annotated with the requester's
    /// relationship to it (spec.md §6 `GET /api/folders`).
    pub async fn accessible_to_user(&self, user_id: i64) -> Result<Vec<AccessibleFolder>> {
        let owned = sqlx::query!(
            r#"
            SELECT f.id, f.name, f.owner_id, u.username as owner_username
            FROM folders f
            JOIN users u ON u.id = f.owner_id
            WHERE f.owner_id = $1
            ORDER BY f.created_at ASC
            "#,
            user_id,
        )
        .fetch_all(&self.pool)
        .await
        .context("loading owned folders")?;

        let shared = sqlx::query!(
            r#"
            SELECT f.id, f.name, f.owner_id, u.username as owner_username
            FROM folder_shares s
            JOIN folders f ON f.id = s.folder_id
            JOIN users u ON u.id = f.owner_id
            WHERE s.shared_with_user_id = $1
            ORDER BY s.created_at ASC
            "#,
            user_id,
        )
        .fetch_all(&self.pool)
        .await
        .context("loading shared folders")?;

        let mut result: Vec<AccessibleFolder> = owned
            .into_iter()
            .map(|r| AccessibleFolder {
                id: r.id,
                name: r.name,
                is_owner: true,
                is_shared: false,
                owner_id: r.owner_id,
                owner_username: r.owner_username,
            })
            .collect();

        result.extend(shared.into_iter().map(|r| AccessibleFolder {
            id: r.id,
            name: r.name,
            is_owner: false,
            is_shared: true,
            owner_id: r.owner_id,
            owner_username: r.owner_username,
        }));

        Ok(result)
    }

    /// Builds `folder_id -> owner_id` in one query (spec.md §4.7 step 3 /
    /// §9's "folder-owner map, not owner lookups per hit").
    pub async fn owner_map(&self, folder_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if folder_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query!(
            "SELECT id, owner_id FROM folders WHERE id = ANY($1)",
            folder_ids,
        )
        .fetch_all(&self.pool)
        .await
        .context("loading folder owner map")?;

        Ok(rows.into_iter().map(|r| (r.id, r.owner_id)).collect())
    }

    /// Deletes folders by id; cascades to images and shares via FK
    /// constraints. Returns the ids that were actually deleted (already
    /// filtered by [`crate::access::AccessControl`] before this is called).
    pub async fn delete_many(&self, folder_ids: &[i64]) -> Result<Vec<i64>> {
        let rows = sqlx::query!(
            "DELETE FROM folders WHERE id = ANY($1) RETURNING id",
            folder_ids,
        )
        .fetch_all(&self.pool)
        .await
        .context("deleting folders")?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }
}
