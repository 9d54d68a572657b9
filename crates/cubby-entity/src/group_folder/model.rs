//! Group folder entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::Owner;

/// A tree owned by a named group of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupFolder {
    /// Slug identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Custom root directory; defaults to `<groups_root>/<id>`.
    pub folder_path: Option<String>,
    /// Member usernames, loaded from the membership table.
    #[sqlx(skip)]
    #[serde(default)]
    pub members: Vec<String>,
}

impl GroupFolder {
    /// Owner identity of this folder's tree.
    pub fn owner(&self) -> Owner {
        Owner::group_folder(&self.id)
    }

    /// Whether `username` is a member.
    pub fn has_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }
}

/// Data required to create a group folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupFolder {
    /// Slug identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Custom root directory.
    pub folder_path: Option<String>,
    /// Initial members.
    pub members: Vec<String>,
}
