//! Recursive size measurement via `find` and volume stats via `df`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use cubby_core::config::tools::ToolsConfig;
use cubby_core::traits::{NodeKind, ScannedNode, SizeScanner, VolumeStats};
use cubby_core::{AppError, AppResult};

use super::runner::ToolRunner;

/// [`SizeScanner`] backed by GNU `find -printf` and `df`.
///
/// Every node under the scanned directory is reported with its type and
/// apparent size, so directory totals can be summed from regular files only.
#[derive(Debug, Clone)]
pub struct FindScanner {
    runner: ToolRunner,
    find: String,
    df: String,
}

impl FindScanner {
    /// Create a scanner using the configured binaries.
    pub fn new(runner: ToolRunner, config: &ToolsConfig) -> Self {
        Self {
            runner,
            find: config.find.clone(),
            df: config.df.clone(),
        }
    }
}

#[async_trait]
impl SizeScanner for FindScanner {
    async fn scan(&self, dir: &Path) -> AppResult<Vec<ScannedNode>> {
        let output = self
            .runner
            .run(
                &self.find,
                [
                    dir.as_os_str(),
                    OsStr::new("-printf"),
                    OsStr::new("%y\t%s\t%p\\0"),
                ],
            )
            .await?;
        Ok(parse_find_output(&output.stdout))
    }

    async fn volume(&self, path: &Path) -> AppResult<VolumeStats> {
        let output = self
            .runner
            .run(
                &self.df,
                [
                    OsStr::new("-B1"),
                    OsStr::new("--output=size,avail"),
                    path.as_os_str(),
                ],
            )
            .await?;
        parse_df_output(&output.stdout)
            .ok_or_else(|| AppError::external(format!("Unexpected df output: {}", output.stdout)))
    }
}

/// Parse NUL-terminated `type<TAB>size<TAB>path` records.
pub fn parse_find_output(stdout: &str) -> Vec<ScannedNode> {
    stdout
        .split('\0')
        .filter_map(|record| {
            let mut fields = record.splitn(3, '\t');
            let kind = match fields.next()? {
                "d" => NodeKind::Directory,
                "f" => NodeKind::File,
                "" => return None,
                _ => NodeKind::Other,
            };
            let bytes = fields.next()?.parse().ok()?;
            let path = PathBuf::from(fields.next()?);
            Some(ScannedNode { path, bytes, kind })
        })
        .collect()
}

/// Parse `df -B1 --output=size,avail` output.
pub fn parse_df_output(stdout: &str) -> Option<VolumeStats> {
    let line = stdout.lines().nth(1)?;
    let mut fields = line.split_whitespace();
    let capacity = fields.next()?.parse().ok()?;
    let available = fields.next()?.parse().ok()?;
    Some(VolumeStats {
        capacity,
        available,
    })
}
