//! Per-owner disk usage totals.
//!
//! Each owner maps to an immutable [`OwnerUsage`] snapshot that writers
//! replace wholesale, so readers never block on a scan and never observe a
//! half-merged map. Writers for the same owner are serialized by a per-owner
//! lock; writers for different owners run in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use cubby_core::events::file::parent_of;
use cubby_core::traits::{OwnerRoots, SizeScanner, VolumeStats};
use cubby_core::types::path;
use cubby_core::Owner;

use super::tally::tally;
use crate::keys;

/// Cached totals of one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerUsage {
    /// Bytes used by the whole owner tree.
    pub used: u64,
    /// Recursive byte totals keyed by owner-relative directory path.
    pub directories: HashMap<String, u64>,
}

/// Disk usage of an owner as reported to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    /// Bytes used by the owner tree.
    pub used: u64,
    /// Bytes available on the volume.
    pub available: u64,
    /// Total bytes of the volume.
    pub capacity: u64,
}

/// Write side of one owner's entry.
#[derive(Debug, Default)]
struct OwnerWriter {
    lock: Mutex<()>,
    /// Full scans started and not yet finished.
    full_scans: AtomicUsize,
    /// Directories left for the running full scan to rescan.
    deferred: DashSet<String>,
}

/// Marks a full scan as running until dropped.
struct RunningScan<'a>(&'a AtomicUsize);

impl<'a> RunningScan<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RunningScan<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Disk usage cache keyed by owner.
#[derive(Debug)]
pub struct DiskUsageCache {
    entries: DashMap<String, Arc<OwnerUsage>>,
    writers: DashMap<String, Arc<OwnerWriter>>,
    scanner: Arc<dyn SizeScanner>,
    roots: Arc<dyn OwnerRoots>,
}

impl DiskUsageCache {
    /// Create an empty cache.
    pub fn new(scanner: Arc<dyn SizeScanner>, roots: Arc<dyn OwnerRoots>) -> Self {
        Self {
            entries: DashMap::new(),
            writers: DashMap::new(),
            scanner,
            roots,
        }
    }

    /// Whether `owner` has been computed at least once.
    pub fn is_populated(&self, owner: &Owner) -> bool {
        self.entries.contains_key(&keys::disk_usage(owner))
    }

    /// Current snapshot of `owner`, if any.
    pub fn snapshot(&self, owner: &Owner) -> Option<Arc<OwnerUsage>> {
        self.entries
            .get(&keys::disk_usage(owner))
            .map(|entry| entry.value().clone())
    }

    /// Number of owners currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no owner is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Usage of `owner` together with its volume's capacity.
    ///
    /// An owner never computed before is scanned first. Scan and volume
    /// failures are logged and reported as zero.
    pub async fn get(&self, owner: &Owner) -> UsageReport {
        self.ensure_populated(owner).await;
        let used = self.snapshot(owner).map(|usage| usage.used).unwrap_or(0);
        let volume = self.volume(owner).await;
        UsageReport {
            used,
            available: volume.available,
            capacity: volume.capacity,
        }
    }

    /// Cached recursive size of a directory.
    ///
    /// `/` is the owner total. Unknown directories are `0`.
    pub fn get_directory(&self, owner: &Owner, relative: &str) -> u64 {
        let Some(usage) = self.snapshot(owner) else {
            return 0;
        };
        let Some(relative) = path::normalize(relative) else {
            return 0;
        };
        if relative == "/" {
            return usage.used;
        }
        usage.directories.get(&relative).copied().unwrap_or(0)
    }

    /// Scan `owner` once if it has never been computed.
    pub async fn ensure_populated(&self, owner: &Owner) {
        if self.is_populated(owner) {
            return;
        }
        self.full_scan(owner, true).await;
    }

    /// Rebuild the whole tree of `owner`. Failures keep the previous value.
    pub async fn recompute(&self, owner: &Owner) {
        self.full_scan(owner, false).await;
    }

    /// Rescan one directory and merge it into the owner's totals.
    ///
    /// Every ancestor up to the owner total moves by the same delta as the
    /// directory itself. An owner that was never computed is left for the
    /// next read to scan in full.
    ///
    /// While a full scan of the owner is running the directory is queued
    /// and rescanned by that scan once it finishes, so this call never waits
    /// on a full scan.
    pub async fn recompute_directory(&self, owner: &Owner, relative: &str) {
        let Some(relative) = path::normalize(relative) else {
            warn!(owner = %owner, path = relative, "Skipping disk usage recompute of invalid path");
            return;
        };

        let writer = self.writer(owner);
        if writer.full_scans.load(Ordering::SeqCst) > 0 {
            writer.deferred.insert(relative.clone());
            if writer.full_scans.load(Ordering::SeqCst) > 0 {
                debug!(owner = %owner, path = %relative, "Full scan running; partial recompute deferred");
                return;
            }
            // The scan finished between the two checks.
            writer.deferred.remove(&relative);
        }

        let _guard = writer.lock.lock().await;
        self.rescan_directory(owner, &relative).await;
    }

    /// Drop everything cached for `owner`.
    pub fn forget(&self, owner: &Owner) {
        let key = keys::disk_usage(owner);
        self.entries.remove(&key);
        self.writers.remove(&key);
    }

    fn writer(&self, owner: &Owner) -> Arc<OwnerWriter> {
        self.writers
            .entry(keys::disk_usage(owner))
            .or_default()
            .value()
            .clone()
    }

    /// Full scan under the owner's writer lock, then the directories
    /// deferred while it ran.
    async fn full_scan(&self, owner: &Owner, only_if_cold: bool) {
        let writer = self.writer(owner);
        let _guard = {
            let _running = RunningScan::enter(&writer.full_scans);
            let guard = writer.lock.lock().await;
            if !(only_if_cold && self.is_populated(owner)) {
                self.rescan_all(owner).await;
            }
            guard
        };

        let deferred: Vec<String> = writer.deferred.iter().map(|dir| dir.key().clone()).collect();
        for dir in deferred {
            writer.deferred.remove(&dir);
            self.rescan_directory(owner, &dir).await;
        }
    }

    /// Partial recompute; the caller holds the owner's writer lock.
    async fn rescan_directory(&self, owner: &Owner, relative: &str) {
        let Some(current) = self.snapshot(owner) else {
            debug!(owner = %owner, path = %relative, "Owner not cached yet; skipping partial recompute");
            return;
        };
        let root = match self.roots.root_of(owner) {
            Ok(root) => root,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Cannot locate owner root");
                return;
            }
        };
        let dir = root.join(relative.trim_start_matches('/'));
        let nodes = match self.scanner.scan(&dir).await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(
                    owner = %owner,
                    path = %relative,
                    error = %e,
                    "Directory size scan failed; keeping previous value"
                );
                return;
            }
        };

        let fresh = tally(&root, relative, &nodes);
        let merged = if relative == "/" {
            let used = fresh.get("/").copied().unwrap_or(0);
            OwnerUsage {
                used,
                directories: fresh,
            }
        } else {
            merge(&current, relative, fresh)
        };
        debug!(owner = %owner, path = %relative, used = merged.used, "Disk usage updated");
        self.entries
            .insert(keys::disk_usage(owner), Arc::new(merged));
    }

    /// Full scan; the caller holds the owner's writer lock.
    async fn rescan_all(&self, owner: &Owner) {
        let root = match self.roots.root_of(owner) {
            Ok(root) => root,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Cannot locate owner root");
                return;
            }
        };

        // A root that does not exist yet holds nothing.
        if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
            self.entries
                .insert(keys::disk_usage(owner), Arc::new(OwnerUsage::default()));
            return;
        }

        match self.scanner.scan(&root).await {
            Ok(nodes) => {
                let directories = tally(&root, "/", &nodes);
                let used = directories.get("/").copied().unwrap_or(0);
                info!(owner = %owner, used, directories = directories.len(), "Disk usage recomputed");
                self.entries.insert(
                    keys::disk_usage(owner),
                    Arc::new(OwnerUsage { used, directories }),
                );
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "Disk usage scan failed; keeping previous value");
            }
        }
    }

    async fn volume(&self, owner: &Owner) -> VolumeStats {
        let root = match self.roots.root_of(owner) {
            Ok(root) => root,
            Err(_) => return VolumeStats::default(),
        };
        // The root may not exist yet; its parent lives on the same volume.
        let probe = if tokio::fs::try_exists(&root).await.unwrap_or(false) {
            root
        } else {
            root.parent().map(|p| p.to_path_buf()).unwrap_or(root)
        };
        match self.scanner.volume(&probe).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Volume stats unavailable");
                VolumeStats::default()
            }
        }
    }
}

/// Replace the subtree at `relative` with `fresh` and shift its ancestors.
fn merge(current: &OwnerUsage, relative: &str, fresh: HashMap<String, u64>) -> OwnerUsage {
    let old_total = current.directories.get(relative).copied().unwrap_or(0);
    let new_total = fresh.get(relative).copied().unwrap_or(0);

    let mut directories: HashMap<String, u64> = current
        .directories
        .iter()
        .filter(|(dir, _)| !path::is_at_or_under(dir, relative))
        .map(|(dir, bytes)| (dir.clone(), *bytes))
        .collect();
    directories.extend(fresh);

    let mut used = current.used;
    let mut ancestor = relative.to_string();
    loop {
        ancestor = parent_of(&ancestor);
        let entry = directories.entry(ancestor.clone()).or_insert(0);
        *entry = shift(*entry, old_total, new_total);
        if ancestor == "/" {
            used = shift(used, old_total, new_total);
            break;
        }
    }
    directories.insert("/".to_string(), used);

    OwnerUsage { used, directories }
}

fn shift(value: u64, old: u64, new: u64) -> u64 {
    if new >= old {
        value.saturating_add(new - old)
    } else {
        value.saturating_sub(old - new)
    }
}
