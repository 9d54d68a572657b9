//! Mutating filesystem operations.
//!
//! Every operation resolves its paths first, so an `InvalidPath` stops it
//! before any I/O. Each successful mutation ends by dispatching a
//! [`FileEvent`] through the [`ChangeHook`].

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use cubby_core::events::FileEvent;
use cubby_core::{AppError, AppResult, ErrorKind, Owner};
use cubby_entity::entry::{Entry, EntryHead};
use cubby_storage::tools::{ArchiveKind, Extractor, RecentScanner};
use cubby_storage::{ByteStream, LocalFs, PathResolver, PhysicalPath};

use crate::entry::EntryBuilder;
use crate::hooks::ChangeHook;

/// The mutation engine.
#[derive(Debug, Clone)]
pub struct FileService {
    pub(crate) resolver: Arc<PathResolver>,
    pub(crate) fs: LocalFs,
    pub(crate) entries: Arc<EntryBuilder>,
    pub(crate) hook: Arc<ChangeHook>,
    extractor: Extractor,
    pub(crate) recent_scanner: RecentScanner,
}

impl FileService {
    /// Create the service.
    pub fn new(
        resolver: Arc<PathResolver>,
        entries: Arc<EntryBuilder>,
        hook: Arc<ChangeHook>,
        extractor: Extractor,
        recent_scanner: RecentScanner,
    ) -> Self {
        Self {
            resolver,
            fs: LocalFs::new(),
            entries,
            hook,
            extractor,
            recent_scanner,
        }
    }

    /// Full entry for a node. See [`EntryBuilder::get`].
    pub async fn get(&self, owner: &Owner, path: &str) -> AppResult<Entry> {
        self.entries.get(owner, path).await
    }

    /// Metadata-only entry. See [`EntryBuilder::head`].
    pub async fn head(&self, owner: &Owner, path: &str) -> AppResult<EntryHead> {
        self.entries.head(owner, path).await
    }

    /// Create a directory and any missing parents.
    pub async fn add_directory(&self, owner: &Owner, path: &str) -> AppResult<()> {
        let target = self.resolver.resolve(owner, path).await?;
        if self.fs.exists(&target).await? {
            return Err(AppError::already_exists(format!(
                "{} already exists",
                target.relative()
            )));
        }
        self.fs.create_dir_all(&target).await?;

        info!(owner = %owner, path = target.relative(), "Directory created");
        self.hook
            .dispatch(&FileEvent::DirectoryCreated {
                owner: owner.clone(),
                path: target.relative().to_string(),
            })
            .await;
        Ok(())
    }

    /// Write a file from a stream, replacing it only when `overwrite` is set.
    ///
    /// Returns the number of bytes written.
    pub async fn add_or_overwrite_file(
        &self,
        owner: &Owner,
        path: &str,
        content: ByteStream,
        mtime: Option<DateTime<Utc>>,
        overwrite: bool,
    ) -> AppResult<u64> {
        let target = self.resolver.resolve(owner, path).await?;
        if target.is_root() {
            return Err(AppError::bad_state("Cannot write file content to an owner root"));
        }
        match self.fs.stat(&target).await {
            Ok(_) if !overwrite => {
                return Err(AppError::already_exists(format!(
                    "{} already exists",
                    target.relative()
                )));
            }
            Ok(meta) if meta.is_dir() => {
                return Err(AppError::bad_state(format!(
                    "{} is a directory",
                    target.relative()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let size = self.fs.write_atomic(&target, content, mtime).await?;

        info!(owner = %owner, path = target.relative(), size, overwrite, "File written");
        self.hook
            .dispatch(&FileEvent::FileWritten {
                owner: owner.clone(),
                path: target.relative().to_string(),
                size,
            })
            .await;
        Ok(size)
    }

    /// Write a file from an in-memory buffer.
    pub async fn add_or_overwrite_file_contents(
        &self,
        owner: &Owner,
        path: &str,
        content: impl Into<Bytes>,
        mtime: Option<DateTime<Utc>>,
        overwrite: bool,
    ) -> AppResult<u64> {
        let content: Bytes = content.into();
        let stream: ByteStream = Box::pin(futures::stream::once(async move { Ok(content) }));
        self.add_or_overwrite_file(owner, path, stream, mtime, overwrite)
            .await
    }

    /// Stream a file's content.
    pub async fn read(&self, owner: &Owner, path: &str) -> AppResult<ByteStream> {
        let target = self.resolver.resolve(owner, path).await?;
        if self.fs.stat(&target).await?.is_dir() {
            return Err(AppError::bad_state(format!(
                "{} is a directory",
                target.relative()
            )));
        }
        self.fs.read_stream(&target).await
    }

    /// Move a node, possibly into another owner's tree.
    pub async fn move_to(
        &self,
        owner: &Owner,
        path: &str,
        new_owner: &Owner,
        new_path: &str,
    ) -> AppResult<()> {
        let (from, to) = self.transfer_ends(owner, path, new_owner, new_path).await?;
        self.fs.rename(&from, &to).await?;

        info!(from = %located(&from), to = %located(&to), "Moved");
        self.hook
            .dispatch(&FileEvent::Moved {
                from_owner: owner.clone(),
                from_path: from.relative().to_string(),
                to_owner: new_owner.clone(),
                to_path: to.relative().to_string(),
            })
            .await;
        Ok(())
    }

    /// Copy a node recursively, possibly into another owner's tree.
    ///
    /// Nothing at the destination is ever overwritten.
    pub async fn copy_to(
        &self,
        owner: &Owner,
        path: &str,
        new_owner: &Owner,
        new_path: &str,
    ) -> AppResult<()> {
        let (from, to) = self.transfer_ends(owner, path, new_owner, new_path).await?;
        let result = self.fs.copy_tree(&from, &to).await;

        // A failed copy can leave a partial tree behind; sizes still move.
        let event = FileEvent::Copied {
            from_owner: owner.clone(),
            from_path: from.relative().to_string(),
            to_owner: new_owner.clone(),
            to_path: to.relative().to_string(),
        };
        self.hook.dispatch(&event).await;
        result?;

        info!(from = %located(&from), to = %located(&to), "Copied");
        Ok(())
    }

    /// Unpack an archive into a directory, creating it when missing.
    pub async fn extract(
        &self,
        owner: &Owner,
        archive: &str,
        target_owner: &Owner,
        target: &str,
    ) -> AppResult<ArchiveKind> {
        let source = self.resolver.resolve(owner, archive).await?;
        let destination = self.resolver.resolve(target_owner, target).await?;

        if !self.fs.stat(&source).await?.is_file() {
            return Err(AppError::bad_state(format!(
                "{} is not a file",
                source.relative()
            )));
        }
        if ArchiveKind::detect(source.file_name()).is_none() {
            return Err(AppError::bad_state(format!(
                "Unsupported archive type: {}",
                source.file_name()
            )));
        }
        self.fs.create_dir_all(&destination).await?;

        let result = self
            .extractor
            .extract(source.absolute(), destination.absolute())
            .await;
        match self.fs.strip_symlinks(&destination).await {
            Ok(0) => {}
            Ok(removed) => {
                warn!(path = destination.relative(), removed, "Removed symlinks from extracted archive");
            }
            Err(e) => {
                warn!(path = destination.relative(), error = %e, "Failed to sweep extracted symlinks");
            }
        }

        self.hook
            .dispatch(&FileEvent::Extracted {
                owner: target_owner.clone(),
                target: destination.relative().to_string(),
            })
            .await;
        let kind = result?;

        info!(
            archive = %located(&source),
            target = %located(&destination),
            ?kind,
            "Archive extracted"
        );
        Ok(kind)
    }

    /// Recursively delete a node. There is no recycle bin.
    pub async fn remove(&self, owner: &Owner, path: &str) -> AppResult<()> {
        let target = self.resolver.resolve(owner, path).await?;
        if target.is_root() {
            return Err(AppError::bad_state("Cannot remove an owner root"));
        }
        if !self.fs.exists(&target).await? {
            return Err(AppError::not_found(format!("{} not found", target.relative())));
        }
        self.fs.remove_all(&target).await?;

        info!(owner = %owner, path = target.relative(), "Removed");
        self.hook
            .dispatch(&FileEvent::Removed {
                owner: owner.clone(),
                path: target.relative().to_string(),
            })
            .await;
        Ok(())
    }

    /// Resolve and validate both ends of a move or copy.
    async fn transfer_ends(
        &self,
        owner: &Owner,
        path: &str,
        new_owner: &Owner,
        new_path: &str,
    ) -> AppResult<(PhysicalPath, PhysicalPath)> {
        let from = self.resolver.resolve(owner, path).await?;
        let to = self.resolver.resolve(new_owner, new_path).await?;

        if from.absolute() == to.absolute() {
            return Err(AppError::conflict(format!(
                "Source and destination are both {}",
                to.relative()
            )));
        }
        if from.is_root() {
            return Err(AppError::bad_state("Cannot move or copy an owner root"));
        }
        if !self.fs.exists(&from).await? {
            return Err(AppError::not_found(format!("{} not found", from.relative())));
        }
        if self.fs.exists(&to).await? {
            return Err(AppError::already_exists(format!(
                "{} already exists",
                to.relative()
            )));
        }
        if to.absolute().starts_with(from.absolute()) {
            return Err(AppError::bad_state(format!(
                "Cannot place {} inside itself",
                from.relative()
            )));
        }
        Ok((from, to))
    }
}

fn located(path: &PhysicalPath) -> String {
    format!("{}:{}", path.owner(), path.relative())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use chrono::TimeZone;
    use cubby_entity::share::{CreateShare, ShareReceiver};
    use futures::StreamExt;

    async fn read_all(service: &FileService, owner: &Owner, path: &str) -> Vec<u8> {
        let mut stream = service.read(owner, path).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_add_directory_twice() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");

        files.add_directory(&owner, "/x").await.unwrap();
        let err = files.add_directory(&owner, "/x").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        files.add_directory(&owner, "/deep/er/still").await.unwrap();
        assert!(fx.users_root().join("alice/deep/er/still").is_dir());
    }

    #[tokio::test]
    async fn test_escaping_paths_touch_nothing() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");

        for path in ["../bob", "/a/../../bob", ".."] {
            let err = files.add_directory(&owner, path).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidPath);
            let err = files
                .add_or_overwrite_file_contents(&owner, &format!("{path}/f"), "x", None, true)
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidPath);
        }
        assert!(!fx.users_root().join("bob").exists());
    }

    #[tokio::test]
    async fn test_write_round_trip_keeps_size_and_mtime() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        let mtime = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let written = files
            .add_or_overwrite_file_contents(&owner, "/a/b.txt", "hello world", Some(mtime), false)
            .await
            .unwrap();
        assert_eq!(written, 11);

        let entry = files.get(&owner, "/a/b.txt").await.unwrap();
        assert_eq!(entry.size, 11);
        assert_eq!(entry.mtime.timestamp(), mtime.timestamp());
        assert_eq!(entry.file_name, "b.txt");
        assert_eq!(entry.mime_type, "text/plain");
        assert!(entry.is_file);
        assert!(!entry.is_binary);

        let err = files
            .add_or_overwrite_file_contents(&owner, "/a/b.txt", "other", None, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(read_all(files, &owner, "/a/b.txt").await, b"hello world");

        files
            .add_or_overwrite_file_contents(&owner, "/a/b.txt", "bye", None, true)
            .await
            .unwrap();
        assert_eq!(read_all(files, &owner, "/a/b.txt").await, b"bye");
    }

    #[tokio::test]
    async fn test_write_onto_directory_or_root_is_bad_state() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        files.add_directory(&owner, "/dir").await.unwrap();

        let err = files
            .add_or_overwrite_file_contents(&owner, "/dir", "x", None, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
        let err = files
            .add_or_overwrite_file_contents(&owner, "/", "x", None, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
        let err = files.read(&owner, "/dir").await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::BadState);
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_previous_content() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        files
            .add_or_overwrite_file_contents(&owner, "/f.txt", "original", None, false)
            .await
            .unwrap();

        let broken: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("client went away")),
        ]));
        let err = files
            .add_or_overwrite_file(&owner, "/f.txt", broken, None, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(read_all(files, &owner, "/f.txt").await, b"original");

        let leftovers: Vec<_> = std::fs::read_dir(fx.users_root().join("alice"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["f.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_overwrites_never_mix() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        let a = vec![b'a'; 256 * 1024];
        let b = vec![b'b'; 256 * 1024];

        let (ra, rb) = tokio::join!(
            files.add_or_overwrite_file_contents(&owner, "/race.bin", a.clone(), None, true),
            files.add_or_overwrite_file_contents(&owner, "/race.bin", b.clone(), None, true),
        );
        ra.unwrap();
        rb.unwrap();

        let content = read_all(files, &owner, "/race.bin").await;
        assert!(content == a || content == b);
    }

    #[tokio::test]
    async fn test_move_onto_itself_is_conflict() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        files
            .add_or_overwrite_file_contents(&owner, "/a.txt", "keep", None, false)
            .await
            .unwrap();

        let err = files.move_to(&owner, "/a.txt", &owner, "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(read_all(files, &owner, "/a.txt").await, b"keep");
    }

    #[tokio::test]
    async fn test_move_and_copy_guards() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        files.add_directory(&owner, "/dir/sub").await.unwrap();
        files
            .add_or_overwrite_file_contents(&owner, "/dir/f.txt", "f", None, false)
            .await
            .unwrap();
        files
            .add_or_overwrite_file_contents(&owner, "/g.txt", "g", None, false)
            .await
            .unwrap();

        let kind = |r: AppResult<()>| r.unwrap_err().kind;
        assert_eq!(kind(files.move_to(&owner, "/nope", &owner, "/x").await), ErrorKind::NotFound);
        assert_eq!(kind(files.move_to(&owner, "/g.txt", &owner, "/dir/f.txt").await), ErrorKind::AlreadyExists);
        assert_eq!(kind(files.copy_to(&owner, "/dir", &owner, "/dir/sub/copy").await), ErrorKind::BadState);
        assert_eq!(kind(files.move_to(&owner, "/", &owner, "/elsewhere").await), ErrorKind::BadState);
        assert_eq!(kind(files.copy_to(&owner, "/g.txt", &owner, "/dir/f.txt").await), ErrorKind::AlreadyExists);
        assert_eq!(read_all(files, &owner, "/dir/f.txt").await, b"f");
    }

    #[tokio::test]
    async fn test_move_and_copy_across_owners() {
        let fx = fixture();
        let files = &fx.state.files;
        let alice = Owner::user("alice");
        let bob = Owner::user("bob");
        files
            .add_or_overwrite_file_contents(&alice, "/tree/a/1.txt", "one", None, false)
            .await
            .unwrap();
        files
            .add_or_overwrite_file_contents(&alice, "/tree/2.txt", "two", None, false)
            .await
            .unwrap();

        files.copy_to(&alice, "/tree", &bob, "/copied").await.unwrap();
        assert_eq!(read_all(files, &bob, "/copied/a/1.txt").await, b"one");
        assert_eq!(read_all(files, &alice, "/tree/2.txt").await, b"two");

        files.move_to(&alice, "/tree", &bob, "/moved").await.unwrap();
        assert_eq!(read_all(files, &bob, "/moved/2.txt").await, b"two");
        let err = files.get(&alice, "/tree").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_guards() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");

        let err = files.remove(&owner, "/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
        let err = files.remove(&owner, "/missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_usage_follows_mutations() {
        let fx = fixture();
        let files = &fx.state.files;
        let usage = &fx.state.usage;
        let owner = Owner::user("alice");

        files
            .add_or_overwrite_file_contents(&owner, "/big/blob.bin", vec![0u8; 1000], None, false)
            .await
            .unwrap();
        files
            .add_or_overwrite_file_contents(&owner, "/small.txt", "12345", None, false)
            .await
            .unwrap();
        files.add_directory(&owner, "/empty").await.unwrap();

        assert_eq!(usage.get(&owner).await.used, 1005);
        assert_eq!(usage.get_directory(&owner, "/big"), 1000);
        assert_eq!(usage.get_directory(&owner, "/empty"), 0);

        files
            .add_or_overwrite_file_contents(&owner, "/big/more.bin", vec![0u8; 500], None, false)
            .await
            .unwrap();
        assert_eq!(usage.get_directory(&owner, "/big"), 1500);
        assert_eq!(usage.get_directory(&owner, "/"), 1505);

        files.remove(&owner, "/big/").await.unwrap();
        assert_eq!(usage.get_directory(&owner, "/"), 5);
        assert_eq!(usage.get_directory(&owner, "/big"), 0);
    }

    #[tokio::test]
    async fn test_directory_listing_with_overlays() {
        let fx = fixture();
        let state = &fx.state;
        let owner = Owner::user("alice");
        state
            .files
            .add_or_overwrite_file_contents(&owner, "/docs/report.pdf", vec![0u8, 1, 2, 3], None, false)
            .await
            .unwrap();
        state
            .files
            .add_or_overwrite_file_contents(&owner, "/docs/notes.txt", "notes", None, false)
            .await
            .unwrap();
        state.files.add_directory(&owner, "/docs/empty").await.unwrap();
        std::fs::write(
            fx.users_root().join("alice/docs/.upload.0123456789abcdef0123456789abcdef.part"),
            b"in flight",
        )
        .unwrap();

        let share = state
            .shares
            .create(CreateShare {
                owner: owner.clone(),
                file_path: "/docs/report.pdf".into(),
                receiver: ShareReceiver::User("bob".into()),
                readonly: true,
                expires_at: None,
            })
            .await
            .unwrap();
        state
            .favorites
            .add(cubby_entity::favorite::CreateFavorite {
                username: "alice".into(),
                owner: owner.clone(),
                file_path: "/docs/notes.txt".into(),
            })
            .await
            .unwrap();

        let docs = state.files.get(&owner, "/docs").await.unwrap();
        assert!(docs.is_directory);
        assert_eq!(docs.mime_type, "inode/directory");
        // In-flight uploads are hidden from listings but still occupy disk.
        assert_eq!(docs.size, 18);
        assert_eq!(docs.shared_with.len(), 1);

        let names: Vec<&str> = docs.files.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["empty", "notes.txt", "report.pdf"]);

        let empty = &docs.files[0];
        assert_eq!(empty.size, 0);
        let notes = &docs.files[1];
        assert_eq!(notes.favorites.len(), 1);
        assert!(notes.shared_with.is_empty());
        let report = &docs.files[2];
        assert_eq!(report.shared_with[0].id, share.id);
        assert!(report.is_binary);

        let view = docs.into_share_view("/docs").unwrap();
        assert_eq!(view.files[2].file_path, "/report.pdf");
        assert!(view.files[2].shared_with.is_empty());

        let head = state.files.head(&owner, "/docs/notes.txt").await.unwrap();
        assert_eq!(head.size, 5);
        assert_eq!(head.file_path, "/docs/notes.txt");
    }

    #[tokio::test]
    async fn test_missing_entry_is_not_found() {
        let fx = fixture();
        let err = fx
            .state
            .files
            .get(&Owner::user("alice"), "/nothing")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_extract_rejects_non_archives() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        files
            .add_or_overwrite_file_contents(&owner, "/notes.txt", "x", None, false)
            .await
            .unwrap();
        files.add_directory(&owner, "/folder.zip").await.unwrap();

        let err = files
            .extract(&owner, "/notes.txt", &owner, "/out")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
        let err = files
            .extract(&owner, "/folder.zip", &owner, "/out")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadState);
        assert!(!fx.users_root().join("alice/out").exists());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_recent_hides_partial_uploads_and_caps() {
        let fx = fixture();
        let files = &fx.state.files;
        let owner = Owner::user("alice");
        for (path, mtime) in [
            ("/old.txt", Utc::now() - chrono::Duration::days(30)),
            ("/a.txt", Utc::now() - chrono::Duration::hours(3)),
            ("/dir/b.txt", Utc::now() - chrono::Duration::hours(1)),
            ("/c.txt", Utc::now() - chrono::Duration::hours(2)),
        ] {
            files
                .add_or_overwrite_file_contents(&owner, path, "x", Some(mtime), false)
                .await
                .unwrap();
        }
        std::fs::write(
            fx.users_root().join("alice/.d.txt.0123456789abcdef0123456789abcdef.part"),
            b"partial",
        )
        .unwrap();

        let recent = files.recent(&owner, 3, 2).await.unwrap();
        let paths: Vec<&str> = recent.iter().map(|e| e.file_path.as_str()).collect();
        assert_eq!(paths, vec!["/dir/b.txt", "/c.txt"]);
    }
}
