//! File system mutation events.

use serde::{Deserialize, Serialize};

use crate::types::Owner;

/// A completed mutation of an owner's tree.
///
/// Paths are owner-relative and normalized (leading `/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileEvent {
    /// A directory (and any missing parents) was created.
    DirectoryCreated {
        /// Owner of the tree.
        owner: Owner,
        /// New directory path.
        path: String,
    },
    /// A file was written or overwritten.
    FileWritten {
        /// Owner of the tree.
        owner: Owner,
        /// Written file path.
        path: String,
        /// Bytes written.
        size: u64,
    },
    /// A node was moved, possibly across owners.
    Moved {
        /// Source owner.
        from_owner: Owner,
        /// Source path.
        from_path: String,
        /// Destination owner.
        to_owner: Owner,
        /// Destination path.
        to_path: String,
    },
    /// A node was copied, possibly across owners.
    Copied {
        /// Source owner.
        from_owner: Owner,
        /// Source path.
        from_path: String,
        /// Destination owner.
        to_owner: Owner,
        /// Destination path.
        to_path: String,
    },
    /// A node was removed recursively.
    Removed {
        /// Owner of the tree.
        owner: Owner,
        /// Removed path.
        path: String,
    },
    /// An archive was unpacked into a directory.
    Extracted {
        /// Owner of the target tree.
        owner: Owner,
        /// Target directory.
        target: String,
    },
}

impl FileEvent {
    /// Directories whose contents changed, as `(owner, directory)` pairs.
    pub fn affected_directories(&self) -> Vec<(Owner, String)> {
        match self {
            Self::DirectoryCreated { owner, path }
            | Self::FileWritten { owner, path, .. }
            | Self::Removed { owner, path } => vec![(owner.clone(), parent_of(path))],
            Self::Moved {
                from_owner,
                from_path,
                to_owner,
                to_path,
            } => {
                let from = (from_owner.clone(), parent_of(from_path));
                let to = (to_owner.clone(), parent_of(to_path));
                if from == to { vec![from] } else { vec![from, to] }
            }
            Self::Copied {
                to_owner, to_path, ..
            } => vec![(to_owner.clone(), parent_of(to_path))],
            Self::Extracted { owner, target } => vec![(owner.clone(), target.clone())],
        }
    }

    /// Owners whose search index should be refreshed.
    pub fn affected_owners(&self) -> Vec<Owner> {
        let mut owners: Vec<Owner> = Vec::new();
        for (owner, _) in self.affected_directories() {
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        owners
    }
}

/// Parent of a normalized owner-relative path; the root is its own parent.
pub fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}
