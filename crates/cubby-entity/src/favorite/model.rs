//! Favorite entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::{AppError, AppResult, Owner};

/// A user's bookmark of a path in some owner's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    /// `fid-` followed by a uuid.
    pub id: String,
    /// User who bookmarked the path.
    pub username: String,
    /// Owning user of the bookmarked tree.
    pub owner_username: Option<String>,
    /// Owning group folder of the bookmarked tree.
    pub owner_groupfolder: Option<String>,
    /// Bookmarked path.
    pub file_path: String,
    /// When the favorite was created.
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    /// The owner whose tree holds the bookmarked path.
    pub fn owner(&self) -> AppResult<Owner> {
        match (&self.owner_username, &self.owner_groupfolder) {
            (Some(user), None) => Ok(Owner::user(user)),
            (None, Some(group)) => Ok(Owner::group_folder(group)),
            _ => Err(AppError::internal(format!(
                "Favorite {} must have exactly one owner",
                self.id
            ))),
        }
    }
}

/// Data required to create a favorite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFavorite {
    /// User creating the favorite.
    pub username: String,
    /// Owner of the bookmarked tree.
    pub owner: Owner,
    /// Bookmarked path.
    pub file_path: String,
}
