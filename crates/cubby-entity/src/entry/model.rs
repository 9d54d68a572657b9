//! Entry view models.
//!
//! An [`Entry`] is built fresh for every read and never cached; only the
//! directory size it carries comes from the disk usage cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubby_core::Owner;
use cubby_core::types::path;

use crate::favorite::Favorite;
use crate::group_folder::GroupFolder;
use crate::share::Share;

/// MIME type reported for directories.
pub const DIRECTORY_MIME: &str = "inode/directory";

/// Listing and metadata view of one filesystem node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Last path segment; empty for an owner root.
    pub file_name: String,
    /// Owner-relative path.
    pub file_path: String,
    /// Owner of the tree.
    pub owner: Owner,
    /// Bytes; cached aggregate for directories.
    pub size: u64,
    /// Modification time.
    pub mtime: DateTime<Utc>,
    /// Whether the node is a directory.
    pub is_directory: bool,
    /// Whether the node is a regular file.
    pub is_file: bool,
    /// Whether file content looks binary.
    pub is_binary: bool,
    /// MIME type guessed from the name.
    pub mime_type: String,
    /// Immediate children, for directories.
    #[serde(default)]
    pub files: Vec<Entry>,
    /// Shares rooted at or under this path.
    #[serde(default)]
    pub shared_with: Vec<Share>,
    /// Favorites pointing at this path.
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    /// Group folder record, when the owner is a group folder.
    #[serde(default)]
    pub group: Option<GroupFolder>,
}

impl Entry {
    /// Re-root this entry (and its children) at a share's root.
    ///
    /// Paths become relative to `share_root` and other grants on the same
    /// tree are dropped. Returns `None` if the entry is outside the share.
    pub fn into_share_view(mut self, share_root: &str) -> Option<Entry> {
        self.file_path = path::relative_to(&self.file_path, share_root)?;
        if self.file_path == "/" {
            self.file_name.clear();
        }
        self.shared_with.clear();
        self.files = self
            .files
            .into_iter()
            .filter_map(|child| child.into_share_view(share_root))
            .collect();
        Some(self)
    }
}

/// Metadata-only view returned by `head`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryHead {
    /// Last path segment.
    pub file_name: String,
    /// Owner-relative path.
    pub file_path: String,
    /// Owner of the tree.
    pub owner: Owner,
    /// Bytes as reported by stat.
    pub size: u64,
    /// Modification time.
    pub mtime: DateTime<Utc>,
    /// Whether the node is a directory.
    pub is_directory: bool,
    /// Whether the node is a regular file.
    pub is_file: bool,
    /// MIME type guessed from the name.
    pub mime_type: String,
}
