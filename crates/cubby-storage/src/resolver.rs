//! Owner-scoped path resolution.
//!
//! [`PathResolver::resolve`] is the single place where a caller-supplied
//! path becomes an absolute filesystem path. Every filesystem call that
//! takes a caller path goes through a [`PhysicalPath`], which can only be
//! obtained from the resolver.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tokio::fs;
use tracing::{debug, warn};

use cubby_core::config::storage::StorageConfig;
use cubby_core::traits::OwnerRoots;
use cubby_core::types::path;
use cubby_core::{AppError, AppResult, Owner};

/// An absolute path proven to lie inside its owner's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalPath {
    owner: Owner,
    relative: String,
    absolute: PathBuf,
}

impl PhysicalPath {
    /// Owner whose root contains this path.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Normalized owner-relative path, always starting with `/`.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Absolute filesystem path.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Last segment of the relative path; empty for the root.
    pub fn file_name(&self) -> &str {
        path::file_name(&self.relative)
    }

    /// Whether this is the owner's root directory.
    pub fn is_root(&self) -> bool {
        self.relative == "/"
    }

    /// Parent directory, still owner-relative.
    pub fn parent_relative(&self) -> String {
        cubby_core::events::file::parent_of(&self.relative)
    }
}

/// Maps owners to root directories and validates paths against them.
#[derive(Debug)]
pub struct PathResolver {
    users_root: PathBuf,
    groups_root: PathBuf,
    group_roots: DashMap<String, PathBuf>,
}

impl PathResolver {
    /// Create a resolver over the given parent directories.
    pub fn new(users_root: impl Into<PathBuf>, groups_root: impl Into<PathBuf>) -> Self {
        Self {
            users_root: absolutize(users_root.into()),
            groups_root: absolutize(groups_root.into()),
            group_roots: DashMap::new(),
        }
    }

    /// Create a resolver from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.users_root.clone(), config.groups_root.clone())
    }

    /// Use a custom root for a group folder instead of `<groups_root>/<id>`.
    pub fn register_group_root(&self, id: &str, root: impl Into<PathBuf>) {
        let root = absolutize(root.into());
        debug!(group_folder = id, root = %root.display(), "Registered custom group folder root");
        self.group_roots.insert(id.to_string(), root);
    }

    /// Drop a custom group folder root.
    pub fn forget_group_root(&self, id: &str) {
        self.group_roots.remove(id);
    }

    /// Root directory of `owner`, without creating it.
    pub fn root(&self, owner: &Owner) -> AppResult<PathBuf> {
        if !owner.has_valid_id() {
            return Err(AppError::invalid_path(format!(
                "Owner id is not a valid directory name: {:?}",
                owner.id()
            )));
        }
        Ok(match owner {
            Owner::User(name) => self.users_root.join(name),
            Owner::GroupFolder(id) => match self.group_roots.get(id) {
                Some(custom) => custom.value().clone(),
                None => self.groups_root.join(id),
            },
        })
    }

    /// Resolve `relative` under `owner`'s root.
    ///
    /// Malformed or escaping paths fail with `InvalidPath` before any I/O.
    /// The owner root is created on first touch. Existing path segments are
    /// then canonicalized so that symlinks cannot lead outside the root.
    pub async fn resolve(&self, owner: &Owner, relative: &str) -> AppResult<PhysicalPath> {
        let root = self.root(owner)?;
        let normalized = path::normalize(relative).ok_or_else(|| {
            AppError::invalid_path(format!("Path escapes the owner root: {relative}"))
        })?;
        let absolute = root.join(normalized.trim_start_matches('/'));
        if !absolute.starts_with(&root) {
            return Err(AppError::invalid_path(format!(
                "Path escapes the owner root: {relative}"
            )));
        }

        fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::from_io(e, &root.display().to_string()))?;
        self.check_symlinks(&root, &absolute, relative).await?;

        Ok(PhysicalPath {
            owner: owner.clone(),
            relative: normalized,
            absolute,
        })
    }

    /// Map an absolute path reported by a tool back to an owner-relative one.
    pub fn relative_of(&self, owner: &Owner, absolute: &Path) -> Option<String> {
        let root = self.root(owner).ok()?;
        let rest = absolute.strip_prefix(&root).ok()?;
        let rest = rest.to_str()?;
        path::normalize(rest)
    }

    async fn check_symlinks(&self, root: &Path, absolute: &Path, relative: &str) -> AppResult<()> {
        let canonical_root = fs::canonicalize(root)
            .await
            .map_err(|e| AppError::from_io(e, &root.display().to_string()))?;

        for ancestor in absolute.ancestors() {
            match fs::canonicalize(ancestor).await {
                Ok(real) => {
                    if real.starts_with(&canonical_root) {
                        return Ok(());
                    }
                    warn!(
                        path = relative,
                        target = %real.display(),
                        "Rejected path resolving outside its owner root"
                    );
                    return Err(AppError::invalid_path(format!(
                        "Path escapes the owner root: {relative}"
                    )));
                }
                Err(_) if ancestor.starts_with(root) => continue,
                Err(e) => return Err(AppError::from_io(e, relative)),
            }
        }
        Err(AppError::invalid_path(format!(
            "Path escapes the owner root: {relative}"
        )))
    }
}

impl OwnerRoots for PathResolver {
    fn root_of(&self, owner: &Owner) -> AppResult<PathBuf> {
        self.root(owner)
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
