//! Maps virtual resource paths to owner-scoped paths.
//!
//! A virtual path starts with a namespace segment:
//!
//! | Path | Owner | Relative path |
//! |---|---|---|
//! | `/home/<p>` | the caller | `/<p>` |
//! | `/shares/<id>/<p>` | the share's owner | share root joined with `/<p>` |
//! | `/groupfolders/<id>/<p>` | the group folder | `/<p>` |
//! | `/recent` | the caller | `/` |
//!
//! This is the only place where the namespace prefix is parsed into an
//! [`Owner`]. A request that is not allowed, or that names nothing, yields
//! `Ok(None)`; only store failures are errors.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use cubby_core::types::path;
use cubby_core::{AppResult, Owner};
use cubby_database::store::{GroupFolderStore, ShareStore};
use cubby_entity::group_folder::GroupFolder;
use cubby_entity::share::Share;

/// First segment of a virtual path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// The caller's own tree.
    Home,
    /// A tree reached through a share.
    Shares,
    /// A group folder the caller belongs to.
    GroupFolders,
    /// The caller's recently modified files.
    Recent,
}

impl Namespace {
    /// Parse a namespace segment.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "home" => Some(Self::Home),
            "shares" => Some(Self::Shares),
            "groupfolders" => Some(Self::GroupFolders),
            "recent" => Some(Self::Recent),
            _ => None,
        }
    }

    /// Segment as it appears in virtual paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Shares => "shares",
            Self::GroupFolders => "groupfolders",
            Self::Recent => "recent",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful translation.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedResource {
    /// Namespace the path was addressed through.
    pub namespace: Namespace,
    /// Owner of the tree.
    pub owner: Owner,
    /// Normalized owner-relative path.
    pub relative_path: String,
    /// Whether writes through this path must be refused.
    pub readonly: bool,
    /// The share the path went through, for `shares` paths.
    pub share: Option<Share>,
    /// The group folder, for `groupfolders` paths.
    pub group: Option<GroupFolder>,
}

impl ResolvedResource {
    fn owned(namespace: Namespace, owner: Owner, relative_path: String) -> Self {
        Self {
            namespace,
            owner,
            relative_path,
            readonly: false,
            share: None,
            group: None,
        }
    }
}

/// Translates virtual paths using the share and group folder stores.
#[derive(Debug, Clone)]
pub struct ResourceTranslator {
    shares: Arc<dyn ShareStore>,
    group_folders: Arc<dyn GroupFolderStore>,
}

impl ResourceTranslator {
    /// Create a translator.
    pub fn new(shares: Arc<dyn ShareStore>, group_folders: Arc<dyn GroupFolderStore>) -> Self {
        Self {
            shares,
            group_folders,
        }
    }

    /// Translate `virtual_path` on behalf of `caller`.
    ///
    /// `caller` is `None` for anonymous requests, which can only reach
    /// shares without a bound receiver.
    pub async fn translate(
        &self,
        caller: Option<&str>,
        virtual_path: &str,
    ) -> AppResult<Option<ResolvedResource>> {
        let Some(normalized) = path::normalize(virtual_path) else {
            debug!(path = virtual_path, "Virtual path climbs above its namespace");
            return Ok(None);
        };
        let mut segments = normalized.split('/').filter(|s| !s.is_empty());
        let Some(namespace) = segments.next().and_then(Namespace::parse) else {
            return Ok(None);
        };

        match namespace {
            Namespace::Home => {
                let Some(user) = caller else {
                    return Ok(None);
                };
                let rest: Vec<&str> = segments.collect();
                Ok(Some(ResolvedResource::owned(
                    namespace,
                    Owner::user(user),
                    format!("/{}", rest.join("/")),
                )))
            }
            Namespace::Recent => {
                let Some(user) = caller else {
                    return Ok(None);
                };
                if segments.next().is_some() {
                    return Ok(None);
                }
                Ok(Some(ResolvedResource::owned(
                    namespace,
                    Owner::user(user),
                    "/".to_string(),
                )))
            }
            Namespace::Shares => {
                let Some(id) = segments.next() else {
                    return Ok(None);
                };
                let rest: Vec<&str> = segments.collect();
                self.through_share(caller, id, &rest.join("/")).await
            }
            Namespace::GroupFolders => {
                let (Some(user), Some(id)) = (caller, segments.next()) else {
                    return Ok(None);
                };
                let Some(group) = self.group_folders.find_by_id(id).await? else {
                    return Ok(None);
                };
                if !group.has_member(user) {
                    debug!(user, group_folder = id, "Caller is not a group folder member");
                    return Ok(None);
                }
                let rest: Vec<&str> = segments.collect();
                let mut resolved =
                    ResolvedResource::owned(namespace, group.owner(), format!("/{}", rest.join("/")));
                resolved.group = Some(group);
                Ok(Some(resolved))
            }
        }
    }

    async fn through_share(
        &self,
        caller: Option<&str>,
        id: &str,
        remainder: &str,
    ) -> AppResult<Option<ResolvedResource>> {
        let Some(share) = self.shares.find_by_id(id).await? else {
            return Ok(None);
        };
        if share.is_expired(Utc::now()) {
            debug!(share_id = id, "Share has expired");
            return Ok(None);
        }
        if let Some(receiver) = share.receiver_username.as_deref() {
            if caller != Some(receiver) {
                debug!(share_id = id, caller, "Caller is not the share receiver");
                return Ok(None);
            }
        }

        let owner = share.owner()?;
        let Some(relative_path) = path::join(&share.file_path, remainder) else {
            return Ok(None);
        };
        if !share.covers(&relative_path) {
            return Ok(None);
        }

        Ok(Some(ResolvedResource {
            namespace: Namespace::Shares,
            owner,
            relative_path,
            readonly: share.readonly,
            share: Some(share),
            group: None,
        }))
    }
}
