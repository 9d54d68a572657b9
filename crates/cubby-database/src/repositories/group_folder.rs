//! Group folder repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use cubby_core::AppResult;
use cubby_core::error::{AppError, ErrorKind};
use cubby_entity::group_folder::{CreateGroupFolder, GroupFolder};

use crate::store::GroupFolderStore;

/// PostgreSQL-backed [`GroupFolderStore`].
#[derive(Debug, Clone)]
pub struct GroupFolderRepository {
    pool: PgPool,
}

impl GroupFolderRepository {
    /// Create a new group folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fill in `members` for a batch of folders with one query.
    async fn with_members(&self, mut folders: Vec<GroupFolder>) -> AppResult<Vec<GroupFolder>> {
        if folders.is_empty() {
            return Ok(folders);
        }
        let ids: Vec<String> = folders.iter().map(|f| f.id.clone()).collect();
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT groupfolder_id, username FROM groupfolders_members \
             WHERE groupfolder_id = ANY($1) ORDER BY username",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load group folder members", e)
        })?;

        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        for (folder_id, username) in rows {
            members.entry(folder_id).or_default().push(username);
        }
        for folder in &mut folders {
            folder.members = members.remove(&folder.id).unwrap_or_default();
        }
        Ok(folders)
    }
}

#[async_trait]
impl GroupFolderStore for GroupFolderRepository {
    async fn create(&self, data: &CreateGroupFolder) -> AppResult<GroupFolder> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let folder = sqlx::query_as::<_, GroupFolder>(
            "INSERT INTO groupfolders (id, name, folder_path) VALUES ($1, $2, $3) \
             RETURNING id, name, folder_path",
        )
        .bind(&data.id)
        .bind(&data.name)
        .bind(&data.folder_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create group folder", e))?;

        for username in &data.members {
            sqlx::query(
                "INSERT INTO groupfolders_members (groupfolder_id, username) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(&data.id)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to add group folder member", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit group folder", e)
        })?;

        let mut members = data.members.clone();
        members.sort();
        members.dedup();
        Ok(GroupFolder { members, ..folder })
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<GroupFolder>> {
        let folder = sqlx::query_as::<_, GroupFolder>(
            "SELECT id, name, folder_path FROM groupfolders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group folder", e))?;

        match folder {
            Some(folder) => Ok(self.with_members(vec![folder]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> AppResult<Vec<GroupFolder>> {
        let folders = sqlx::query_as::<_, GroupFolder>(
            "SELECT id, name, folder_path FROM groupfolders ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list group folders", e))?;
        self.with_members(folders).await
    }

    async fn list_for_member(&self, username: &str) -> AppResult<Vec<GroupFolder>> {
        let folders = sqlx::query_as::<_, GroupFolder>(
            "SELECT g.id, g.name, g.folder_path FROM groupfolders g \
             JOIN groupfolders_members m ON m.groupfolder_id = g.id \
             WHERE m.username = $1 ORDER BY g.id",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list member group folders", e)
        })?;
        self.with_members(folders).await
    }

    async fn add_member(&self, id: &str, username: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO groupfolders_members (groupfolder_id, username) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to add group folder member", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, id: &str, username: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM groupfolders_members WHERE groupfolder_id = $1 AND username = $2",
        )
        .bind(id)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to remove group folder member", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        for statement in [
            "DELETE FROM shares WHERE owner_groupfolder = $1",
            "DELETE FROM favorites WHERE owner_groupfolder = $1",
            "DELETE FROM groupfolders_members WHERE groupfolder_id = $1",
        ] {
            sqlx::query(statement)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to remove group folder", e)
                })?;
        }

        let result = sqlx::query("DELETE FROM groupfolders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove group folder", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit group folder removal", e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}
