//! The identity that owns a root directory tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who owns a subtree: a user or a group folder.
///
/// The canonical string form ([`Owner::key`]) is used to key per-owner
/// state such as the disk usage cache. Identity is never re-derived from
/// that string; it only flows one way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// A user's home tree.
    User(String),
    /// A group folder tree.
    GroupFolder(String),
}

impl Owner {
    /// Owner for a user's home tree.
    pub fn user(username: impl Into<String>) -> Self {
        Self::User(username.into())
    }

    /// Owner for a group folder tree.
    pub fn group_folder(id: impl Into<String>) -> Self {
        Self::GroupFolder(id.into())
    }

    /// The username or group folder id.
    pub fn id(&self) -> &str {
        match self {
            Self::User(name) => name,
            Self::GroupFolder(id) => id,
        }
    }

    /// Canonical string key, e.g. `user:alice` or `groupfolder:eng`.
    pub fn key(&self) -> String {
        match self {
            Self::User(name) => format!("user:{name}"),
            Self::GroupFolder(id) => format!("groupfolder:{id}"),
        }
    }

    /// Returns the username for user owners.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::User(name) => Some(name),
            Self::GroupFolder(_) => None,
        }
    }

    /// Returns the group folder id for group folder owners.
    pub fn group_folder_id(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::GroupFolder(id) => Some(id),
        }
    }

    /// Whether the identifier can be used as a single directory name.
    pub fn has_valid_id(&self) -> bool {
        let id = self.id();
        !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', '\0'])
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct_per_variant() {
        let user = Owner::user("eng");
        let group = Owner::group_folder("eng");
        assert_ne!(user.key(), group.key());
        assert_eq!(group.to_string(), "groupfolder:eng");
    }

    #[test]
    fn test_id_validation() {
        assert!(Owner::user("alice").has_valid_id());
        assert!(!Owner::user("..").has_valid_id());
        assert!(!Owner::user("a/b").has_valid_id());
        assert!(!Owner::group_folder("").has_valid_id());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Owner::group_folder("eng")).unwrap();
        assert_eq!(json, r#"{"type":"group_folder","id":"eng"}"#);
    }
}
