//! Recently modified files via `find -mtime`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use cubby_core::{AppError, AppResult};
use cubby_core::config::tools::ToolsConfig;

use super::runner::ToolRunner;

/// Lists regular files modified within a number of days.
#[derive(Debug, Clone)]
pub struct RecentScanner {
    runner: ToolRunner,
    find: String,
}

impl RecentScanner {
    /// Create a scanner using the configured `find`.
    pub fn new(runner: ToolRunner, config: &ToolsConfig) -> Self {
        Self {
            runner,
            find: config.find.clone(),
        }
    }

    /// Absolute paths of files under `dir` modified in the last `days` days.
    ///
    /// An empty window is rejected with `BadState`.
    pub async fn modified_within(&self, dir: &Path, days: u32) -> AppResult<Vec<PathBuf>> {
        if days == 0 {
            return Err(AppError::bad_state("Recent window must be at least one day"));
        }
        let args: Vec<OsString> = vec![
            dir.into(),
            "-type".into(),
            "f".into(),
            "-mtime".into(),
            format!("-{days}").into(),
            "-print0".into(),
        ];
        let output = self.runner.run(&self.find, &args).await?;
        Ok(output
            .stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
