//! Share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::types::path;
use cubby_core::{AppError, AppResult, Owner};

/// A grant of access to an owner's subtree.
///
/// Exactly one of `owner_username` / `owner_groupfolder` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Share {
    /// `sid-` followed by 64 hex characters.
    pub id: String,
    /// Owning user, for user-owned shares.
    pub owner_username: Option<String>,
    /// Owning group folder, for group-owned shares.
    pub owner_groupfolder: Option<String>,
    /// Shared root, relative to the owner's tree.
    pub file_path: String,
    /// Email recipient not yet registered.
    pub receiver_email: Option<String>,
    /// Registered recipient.
    pub receiver_username: Option<String>,
    /// Whether the grant is read-only.
    pub readonly: bool,
    /// When the share stops resolving.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// The owner whose tree this share points into.
    pub fn owner(&self) -> AppResult<Owner> {
        match (&self.owner_username, &self.owner_groupfolder) {
            (Some(user), None) => Ok(Owner::user(user)),
            (None, Some(group)) => Ok(Owner::group_folder(group)),
            _ => Err(AppError::internal(format!(
                "Share {} must have exactly one owner",
                self.id
            ))),
        }
    }

    /// Whether the share has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether anyone holding the link may use it.
    pub fn is_public_link(&self) -> bool {
        self.receiver_username.is_none()
    }

    /// Whether `path` (owner-relative) lies within the shared root.
    pub fn covers(&self, path: &str) -> bool {
        path::is_at_or_under(path, &self.file_path)
    }

    /// The receiver this share is bound to.
    pub fn receiver(&self) -> ShareReceiver {
        match (&self.receiver_username, &self.receiver_email) {
            (Some(user), _) => ShareReceiver::User(user.clone()),
            (None, Some(email)) => ShareReceiver::Email(email.clone()),
            (None, None) => ShareReceiver::Link,
        }
    }
}

/// Who a share is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ShareReceiver {
    /// A registered user.
    User(String),
    /// An email address.
    Email(String),
    /// Nobody in particular: a public link.
    Link,
}

impl ShareReceiver {
    /// Username column value.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    /// Email column value.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Email(email) => Some(email),
            _ => None,
        }
    }
}

/// Data required to create a share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShare {
    /// Owner of the shared tree.
    pub owner: Owner,
    /// Shared root path.
    pub file_path: String,
    /// Recipient.
    pub receiver: ShareReceiver,
    /// Read-only grant.
    pub readonly: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
