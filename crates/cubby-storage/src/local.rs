//! Filesystem primitives over resolved paths.
//!
//! Every function takes [`PhysicalPath`]s, so the containment check has
//! already run by the time anything here touches the disk.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;

use crate::resolver::PhysicalPath;

/// A stream of file content chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Suffix of in-flight upload files.
pub const PART_SUFFIX: &str = ".part";

/// One stat'ed child of a directory.
#[derive(Debug)]
pub struct DirChild {
    /// File name.
    pub name: String,
    /// Metadata (symlinks are never reported).
    pub metadata: Metadata,
}

/// Local filesystem operations used by the mutation engine and entry builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local filesystem handle.
    pub fn new() -> Self {
        Self
    }

    /// Stat a node, following nothing outside the resolved path.
    pub async fn stat(&self, path: &PhysicalPath) -> AppResult<Metadata> {
        fs::metadata(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))
    }

    /// Whether anything (including a dangling symlink) exists at `path`.
    pub async fn exists(&self, path: &PhysicalPath) -> AppResult<bool> {
        match fs::symlink_metadata(path.absolute()).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::from_io(e, path.relative())),
        }
    }

    /// Create a directory and any missing parents.
    pub async fn create_dir_all(&self, path: &PhysicalPath) -> AppResult<()> {
        fs::create_dir_all(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))
    }

    /// List the immediate children of a directory.
    ///
    /// Children that fail to stat, symlinks, and in-flight uploads are
    /// skipped. Directories sort before files, then by name.
    pub async fn list_dir(&self, path: &PhysicalPath) -> AppResult<Vec<DirChild>> {
        let mut dir = fs::read_dir(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?;

        let mut children = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_partial_upload(&name) {
                continue;
            }
            match fs::symlink_metadata(entry.path()).await {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    debug!(dir = path.relative(), name, "Skipping symlink in listing");
                }
                Ok(metadata) => children.push(DirChild { name, metadata }),
                Err(e) => {
                    warn!(dir = path.relative(), name, error = %e, "Skipping child that failed to stat");
                }
            }
        }

        children.sort_by(|a, b| {
            b.metadata
                .is_dir()
                .cmp(&a.metadata.is_dir())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(children)
    }

    /// Open a file as a byte stream.
    pub async fn read_stream(&self, path: &PhysicalPath) -> AppResult<ByteStream> {
        let file = fs::File::open(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    /// Write `stream` to `target` atomically.
    ///
    /// Bytes go to a hidden `.part` sibling which is renamed over the final
    /// name only after the stream drained successfully. On any failure the
    /// `.part` file is removed and the original error returned. When `mtime`
    /// is given it is applied after the rename; if that fails the file is
    /// removed and the write fails with `Io`.
    pub async fn write_atomic(
        &self,
        target: &PhysicalPath,
        mut stream: ByteStream,
        mtime: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        if target.is_root() {
            return Err(AppError::bad_state("Cannot write file content to an owner root"));
        }
        let final_path = target.absolute();
        let parent = final_path
            .parent()
            .ok_or_else(|| AppError::bad_state("Cannot write file content to an owner root"))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::from_io(e, target.relative()))?;

        let part = part_path(final_path, target.file_name());
        let written = match drain_into(&part, &mut stream).await {
            Ok(written) => written,
            Err(e) => {
                discard(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&part, final_path).await {
            discard(&part).await;
            return Err(AppError::from_io(e, target.relative()));
        }

        if let Some(mtime) = mtime {
            if let Err(e) = set_mtime(final_path, mtime).await {
                discard(final_path).await;
                return Err(AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to set mtime on {}", target.relative()),
                    e,
                ));
            }
        }

        debug!(path = target.relative(), bytes = written, "Wrote file from stream");
        Ok(written)
    }

    /// Rename `from` to `to`, copying across devices when needed.
    pub async fn rename(&self, from: &PhysicalPath, to: &PhysicalPath) -> AppResult<()> {
        if let Some(parent) = to.absolute().parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::from_io(e, to.relative()))?;
        }
        match fs::rename(from.absolute(), to.absolute()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(from = from.relative(), to = to.relative(), "Moving across devices");
                self.copy_tree(from, to).await?;
                self.remove_all(from).await
            }
            Err(e) => Err(AppError::from_io(e, from.relative())),
        }
    }

    /// Recursively copy `from` to `to`, never overwriting anything.
    ///
    /// Symlinks inside the source tree are skipped.
    pub async fn copy_tree(&self, from: &PhysicalPath, to: &PhysicalPath) -> AppResult<()> {
        let meta = fs::symlink_metadata(from.absolute())
            .await
            .map_err(|e| AppError::from_io(e, from.relative()))?;
        if let Some(parent) = to.absolute().parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::from_io(e, to.relative()))?;
        }

        if !meta.is_dir() {
            return copy_file_new(from.absolute(), to.absolute())
                .await
                .map_err(|e| AppError::from_io(e, to.relative()));
        }

        let mut pending: Vec<(PathBuf, PathBuf)> =
            vec![(from.absolute().to_path_buf(), to.absolute().to_path_buf())];
        while let Some((src, dst)) = pending.pop() {
            fs::create_dir(&dst)
                .await
                .map_err(|e| AppError::from_io(e, to.relative()))?;
            let mut dir = fs::read_dir(&src)
                .await
                .map_err(|e| AppError::from_io(e, from.relative()))?;
            while let Some(entry) = dir
                .next_entry()
                .await
                .map_err(|e| AppError::from_io(e, from.relative()))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| AppError::from_io(e, from.relative()))?;
                let target = dst.join(entry.file_name());
                if file_type.is_dir() {
                    pending.push((entry.path(), target));
                } else if file_type.is_file() {
                    copy_file_new(&entry.path(), &target)
                        .await
                        .map_err(|e| AppError::from_io(e, to.relative()))?;
                } else {
                    debug!(path = %entry.path().display(), "Skipping non-regular file during copy");
                }
            }
        }
        Ok(())
    }

    /// Recursively delete a node.
    pub async fn remove_all(&self, path: &PhysicalPath) -> AppResult<()> {
        let meta = fs::symlink_metadata(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(path.absolute()).await
        } else {
            fs::remove_file(path.absolute()).await
        };
        result.map_err(|e| AppError::from_io(e, path.relative()))
    }

    /// Whether the first bytes of a file look like binary content.
    pub async fn looks_binary(&self, path: &PhysicalPath) -> AppResult<bool> {
        use tokio::io::AsyncReadExt;

        let mut file = fs::File::open(path.absolute())
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?;
        let mut buf = vec![0u8; 1024];
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| AppError::from_io(e, path.relative()))?;
        Ok(is_binary_sample(&buf[..n]))
    }

    /// Delete every symlink under `dir`; returns how many were removed.
    pub async fn strip_symlinks(&self, dir: &PhysicalPath) -> AppResult<usize> {
        let mut removed = 0;
        let mut pending = vec![dir.absolute().to_path_buf()];
        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current)
                .await
                .map_err(|e| AppError::from_io(e, dir.relative()))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| AppError::from_io(e, dir.relative()))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| AppError::from_io(e, dir.relative()))?;
                if file_type.is_symlink() {
                    fs::remove_file(entry.path())
                        .await
                        .map_err(|e| AppError::from_io(e, dir.relative()))?;
                    removed += 1;
                } else if file_type.is_dir() {
                    pending.push(entry.path());
                }
            }
        }
        Ok(removed)
    }
}

/// MIME type for a node name.
pub fn mime_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Whether `name` is an in-flight upload written by [`LocalFs::write_atomic`].
pub fn is_partial_upload(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(PART_SUFFIX))
    else {
        return false;
    };
    stem.rsplit_once('.').is_some_and(|(base, token)| {
        !base.is_empty() && token.len() == 32 && token.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Modification time of a stat result as UTC.
pub fn mtime_of(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH))
}

fn is_binary_sample(sample: &[u8]) -> bool {
    if sample.contains(&0) {
        return true;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => false,
        // A multi-byte character cut off by the sample boundary is fine.
        Err(e) => e.error_len().is_some(),
    }
}

fn part_path(final_path: &Path, file_name: &str) -> PathBuf {
    let token = uuid::Uuid::new_v4().simple().to_string();
    final_path.with_file_name(format!(".{file_name}.{token}{PART_SUFFIX}"))
}

async fn drain_into(part: &Path, stream: &mut ByteStream) -> AppResult<u64> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(part)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to create upload file", e))?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AppError::with_source(ErrorKind::Io, "Upload stream failed", e))?;
        written += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to write chunk", e))?;
    }
    file.flush()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to flush upload", e))?;
    file.sync_all()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to sync upload", e))?;
    Ok(written)
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove leftover file");
        }
    }
}

async fn set_mtime(path: &Path, mtime: DateTime<Utc>) -> io::Result<()> {
    let path = path.to_path_buf();
    let time = SystemTime::from(mtime);
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::options().write(true).open(&path)?;
        file.set_modified(time)
    })
    .await
    .map_err(io::Error::other)?
}

async fn copy_file_new(from: &Path, to: &Path) -> io::Result<()> {
    let mut src = fs::File::open(from).await?;
    let mut dst = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .await?;
    tokio::io::copy(&mut src, &mut dst).await?;
    dst.flush().await
}
