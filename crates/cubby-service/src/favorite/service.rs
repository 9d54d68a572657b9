//! Per-user bookmarks of paths in any tree the user can reach.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use cubby_core::types::path;
use cubby_core::{AppError, AppResult, Owner};
use cubby_database::store::FavoriteStore;
use cubby_entity::favorite::{CreateFavorite, Favorite};

/// Adds, lists, and removes favorites.
#[derive(Debug, Clone)]
pub struct FavoriteService {
    store: Arc<dyn FavoriteStore>,
}

impl FavoriteService {
    /// Create the service.
    pub fn new(store: Arc<dyn FavoriteStore>) -> Self {
        Self { store }
    }

    /// Bookmark a path; an existing bookmark for the same path is returned.
    pub async fn add(&self, data: CreateFavorite) -> AppResult<Favorite> {
        let file_path = path::normalize(&data.file_path).ok_or_else(|| {
            AppError::invalid_path(format!("Invalid favorite path: {}", data.file_path))
        })?;
        if let Some(existing) = self
            .store
            .find(&data.username, &data.owner, &file_path)
            .await?
        {
            return Ok(existing);
        }

        let favorite = Favorite {
            id: format!("fid-{}", Uuid::new_v4().simple()),
            username: data.username,
            owner_username: data.owner.username().map(str::to_string),
            owner_groupfolder: data.owner.group_folder_id().map(str::to_string),
            file_path,
            created_at: Utc::now(),
        };
        self.store.insert(&favorite).await?;
        info!(favorite_id = %favorite.id, username = %favorite.username, "Favorite added");
        Ok(favorite)
    }

    /// Remove one of `username`'s favorites.
    pub async fn remove(&self, id: &str, username: &str) -> AppResult<()> {
        if !self.store.delete(id, username).await? {
            return Err(AppError::not_found(format!("Favorite {id} not found")));
        }
        Ok(())
    }

    /// Favorites of `username`.
    pub async fn list(&self, username: &str) -> AppResult<Vec<Favorite>> {
        self.store.find_by_username(username).await
    }

    /// Every favorite pointing at exactly `file_path` in `owner`'s tree.
    pub async fn attached(&self, owner: &Owner, file_path: &str) -> AppResult<Vec<Favorite>> {
        let file_path = path::normalize(file_path)
            .ok_or_else(|| AppError::invalid_path(format!("Invalid path: {file_path}")))?;
        self.store.find_by_owner_and_path(owner, &file_path).await
    }
}
