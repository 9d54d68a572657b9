//! Share repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::{AppResult, Owner};
use cubby_entity::share::{Share, ShareReceiver};

use super::descendants_pattern;
use crate::store::ShareStore;

/// PostgreSQL-backed [`ShareStore`].
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn insert(&self, share: &Share) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO shares (id, owner_username, owner_groupfolder, file_path, \
             receiver_email, receiver_username, readonly, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&share.id)
        .bind(&share.owner_username)
        .bind(&share.owner_groupfolder)
        .bind(&share.file_path)
        .bind(&share.receiver_email)
        .bind(&share.receiver_username)
        .bind(share.readonly)
        .bind(share.expires_at)
        .bind(share.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert share", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find share", e))
    }

    async fn find_existing(
        &self,
        owner: &Owner,
        receiver: &ShareReceiver,
        file_path: &str,
    ) -> AppResult<Option<Share>> {
        if matches!(receiver, ShareReceiver::Link) {
            return Ok(None);
        }
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares \
             WHERE owner_username IS NOT DISTINCT FROM $1 \
               AND owner_groupfolder IS NOT DISTINCT FROM $2 \
               AND receiver_username IS NOT DISTINCT FROM $3 \
               AND receiver_email IS NOT DISTINCT FROM $4 \
               AND file_path = $5 \
             ORDER BY created_at LIMIT 1",
        )
        .bind(owner.username())
        .bind(owner.group_folder_id())
        .bind(receiver.username())
        .bind(receiver.email())
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up existing share", e)
        })
    }

    async fn find_at_or_under(&self, owner: &Owner, file_path: &str) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares \
             WHERE owner_username IS NOT DISTINCT FROM $1 \
               AND owner_groupfolder IS NOT DISTINCT FROM $2 \
               AND (file_path = $3 OR file_path LIKE $4 ESCAPE '\\') \
             ORDER BY file_path",
        )
        .bind(owner.username())
        .bind(owner.group_folder_id())
        .bind(file_path)
        .bind(descendants_pattern(file_path))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shares by path", e))
    }

    async fn find_by_receiver(&self, username: &str) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE receiver_username = $1 ORDER BY created_at DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list received shares", e)
        })
    }

    async fn find_by_owner(&self, owner: &Owner) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares \
             WHERE owner_username IS NOT DISTINCT FROM $1 \
               AND owner_groupfolder IS NOT DISTINCT FROM $2 \
             ORDER BY created_at DESC",
        )
        .bind(owner.username())
        .bind(owner.group_folder_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list owned shares", e))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete share", e))?;
        Ok(result.rows_affected() > 0)
    }
}
