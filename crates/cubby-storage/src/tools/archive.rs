//! Archive extraction through external unpack tools.

use std::ffi::OsString;
use std::path::Path;

use tracing::info;

use cubby_core::config::tools::ToolsConfig;
use cubby_core::{AppError, AppResult};

use super::runner::ToolRunner;

/// Archive families the extractor knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `.zip`
    Zip,
    /// `.tar` plus its compressed variants.
    Tar,
    /// `.7z`
    SevenZip,
}

const TAR_SUFFIXES: &[&str] = &[
    ".tar", ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tbz", ".tar.xz", ".txz", ".tar.zst",
];

impl ArchiveKind {
    /// Detect the archive family from a file name, case-insensitively.
    pub fn detect(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".7z") {
            Some(Self::SevenZip)
        } else if TAR_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// Unpacks archives into a target directory without overwriting anything
/// already there.
#[derive(Debug, Clone)]
pub struct Extractor {
    runner: ToolRunner,
    tar: String,
    unzip: String,
    seven_zip: String,
}

impl Extractor {
    /// Create an extractor using the configured binaries.
    pub fn new(runner: ToolRunner, config: &ToolsConfig) -> Self {
        Self {
            runner,
            tar: config.tar.clone(),
            unzip: config.unzip.clone(),
            seven_zip: config.seven_zip.clone(),
        }
    }

    /// Unpack `archive` into the existing directory `target`.
    ///
    /// Unknown extensions fail with `BadState`; tool failures and timeouts
    /// fail with `External` carrying the tool's diagnostics.
    pub async fn extract(&self, archive: &Path, target: &Path) -> AppResult<ArchiveKind> {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let kind = ArchiveKind::detect(&name)
            .ok_or_else(|| AppError::bad_state(format!("Not a supported archive: {name}")))?;

        let (program, args): (&str, Vec<OsString>) = match kind {
            ArchiveKind::Zip => (
                self.unzip.as_str(),
                vec![
                    "-n".into(),
                    "-q".into(),
                    archive.into(),
                    "-d".into(),
                    target.into(),
                ],
            ),
            ArchiveKind::Tar => (
                self.tar.as_str(),
                vec![
                    "--skip-old-files".into(),
                    "--no-same-owner".into(),
                    "-xf".into(),
                    archive.into(),
                    "-C".into(),
                    target.into(),
                ],
            ),
            ArchiveKind::SevenZip => {
                let mut out = OsString::from("-o");
                out.push(target);
                (
                    self.seven_zip.as_str(),
                    vec!["x".into(), "-y".into(), "-aos".into(), out, archive.into()],
                )
            }
        };

        self.runner.run(program, &args).await?;
        info!(archive = %archive.display(), kind = ?kind, "Archive extracted");
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubby_core::ErrorKind;
    use std::time::Duration;

    fn extractor() -> Extractor {
        Extractor::new(
            ToolRunner::new(Duration::from_secs(30)),
            &ToolsConfig::default(),
        )
    }

    #[test]
    fn test_detect() {
        assert_eq!(ArchiveKind::detect("a.ZIP"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect("a.tar.gz"), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::detect("a.tgz"), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::detect("a.7z"), Some(ArchiveKind::SevenZip));
        assert_eq!(ArchiveKind::detect("a.gz"), None);
        assert_eq!(ArchiveKind::detect("notes.txt"), None);
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_bad_state() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("notes.txt");
        std::fs::write(&archive, b"hi").unwrap();
        let err = extractor().extract(&archive, dir.path()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_corrupt_tar_is_external_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar");
        std::fs::write(&archive, b"definitely not a tarball").unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();

        let err = extractor().extract(&archive, &target).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::External);
    }
}
