//! Favorite repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::{AppResult, Owner};
use cubby_entity::favorite::Favorite;

use crate::store::FavoriteStore;

/// PostgreSQL-backed [`FavoriteStore`].
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    /// Create a new favorite repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteStore for FavoriteRepository {
    async fn insert(&self, favorite: &Favorite) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO favorites (id, username, owner_username, owner_groupfolder, file_path, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&favorite.id)
        .bind(&favorite.username)
        .bind(&favorite.owner_username)
        .bind(&favorite.owner_groupfolder)
        .bind(&favorite.file_path)
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert favorite", e))?;
        Ok(())
    }

    async fn find(
        &self,
        username: &str,
        owner: &Owner,
        file_path: &str,
    ) -> AppResult<Option<Favorite>> {
        sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites \
             WHERE username = $1 \
               AND owner_username IS NOT DISTINCT FROM $2 \
               AND owner_groupfolder IS NOT DISTINCT FROM $3 \
               AND file_path = $4",
        )
        .bind(username)
        .bind(owner.username())
        .bind(owner.group_folder_id())
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find favorite", e))
    }

    async fn find_by_owner_and_path(
        &self,
        owner: &Owner,
        file_path: &str,
    ) -> AppResult<Vec<Favorite>> {
        sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites \
             WHERE owner_username IS NOT DISTINCT FROM $1 \
               AND owner_groupfolder IS NOT DISTINCT FROM $2 \
               AND file_path = $3 \
             ORDER BY created_at",
        )
        .bind(owner.username())
        .bind(owner.group_folder_id())
        .bind(file_path)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list favorites", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Vec<Favorite>> {
        sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites WHERE username = $1 ORDER BY created_at DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user favorites", e)
        })
    }

    async fn delete(&self, id: &str, username: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete favorite", e))?;
        Ok(result.rows_affected() > 0)
    }
}
