//! Recently modified files.
//!
//! Backed by a `find -mtime` scan of the owner's tree; nothing is
//! persisted between calls.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use cubby_core::types::path;
use cubby_core::{AppResult, Owner};
use cubby_entity::entry::Entry;
use cubby_storage::local::{is_partial_upload, mtime_of};

use super::service::FileService;

impl FileService {
    /// Files of `owner` modified in the last `days` days, newest first.
    ///
    /// Hits that disappear between the scan and the lookup are skipped.
    pub async fn recent(&self, owner: &Owner, days: u32, max_results: usize) -> AppResult<Vec<Entry>> {
        let root = self.resolver.resolve(owner, "/").await?;
        let hits = self
            .recent_scanner
            .modified_within(root.absolute(), days)
            .await?;
        debug!(owner = %owner, hits = hits.len(), days, "Recent files scan finished");

        let mut dated: Vec<(DateTime<Utc>, String)> = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(relative) = self.resolver.relative_of(owner, &hit) else {
                continue;
            };
            if is_partial_upload(path::file_name(&relative)) {
                continue;
            }
            let stat = match self.resolver.resolve(owner, &relative).await {
                Ok(resolved) => self.fs.stat(&resolved).await,
                Err(e) => Err(e),
            };
            match stat {
                Ok(meta) if meta.is_file() => dated.push((mtime_of(&meta), relative)),
                Ok(_) => {}
                Err(e) => warn!(owner = %owner, path = %relative, error = %e, "Skipping recent hit"),
            }
        }

        dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        dated.truncate(max_results);

        let mut entries = Vec::with_capacity(dated.len());
        for (_, relative) in dated {
            match self.entries.get(owner, &relative).await {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(owner = %owner, path = %relative, error = %e, "Skipping recent hit"),
            }
        }
        Ok(entries)
    }
}
