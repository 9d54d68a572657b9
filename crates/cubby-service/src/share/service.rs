//! Share CRUD service.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use cubby_core::traits::{Mailer, ShareNotice};
use cubby_core::types::path;
use cubby_core::{AppError, AppResult, Owner};
use cubby_database::store::{ShareStore, UserStore};
use cubby_entity::share::{CreateShare, Share, ShareReceiver};

use super::link::generate_share_id;

/// Creates, lists, and revokes shares.
#[derive(Debug, Clone)]
pub struct ShareService {
    shares: Arc<dyn ShareStore>,
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
}

impl ShareService {
    /// Create the service.
    pub fn new(
        shares: Arc<dyn ShareStore>,
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            shares,
            users,
            mailer,
        }
    }

    /// Create a share, or return the existing one for the same owner,
    /// receiver, and path. Public links are always minted fresh.
    ///
    /// The receiver is notified by mail in the background when an address
    /// is known for them.
    pub async fn create(&self, data: CreateShare) -> AppResult<Share> {
        if !data.owner.has_valid_id() {
            return Err(AppError::invalid_path(format!(
                "Invalid share owner: {}",
                data.owner
            )));
        }
        let file_path = path::normalize(&data.file_path).ok_or_else(|| {
            AppError::invalid_path(format!("Invalid share path: {}", data.file_path))
        })?;

        if !matches!(data.receiver, ShareReceiver::Link) {
            if let Some(existing) = self
                .shares
                .find_existing(&data.owner, &data.receiver, &file_path)
                .await?
            {
                info!(share_id = %existing.id, "Reusing existing share");
                return Ok(existing);
            }
        }

        let share = Share {
            id: generate_share_id(),
            owner_username: data.owner.username().map(str::to_string),
            owner_groupfolder: data.owner.group_folder_id().map(str::to_string),
            file_path,
            receiver_email: data.receiver.email().map(str::to_string),
            receiver_username: data.receiver.username().map(str::to_string),
            readonly: data.readonly,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        };
        self.shares.insert(&share).await?;

        info!(
            share_id = %share.id,
            owner = %data.owner,
            path = %share.file_path,
            readonly = share.readonly,
            "Share created"
        );

        if let Some(email) = self.notify_address(&data.receiver).await {
            self.notify(&share, &data.owner, email);
        }
        Ok(share)
    }

    /// Find a share by id.
    pub async fn get(&self, id: &str) -> AppResult<Share> {
        self.shares
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Share {id} not found")))
    }

    /// Revoke a share.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        if !self.shares.delete(id).await? {
            return Err(AppError::not_found(format!("Share {id} not found")));
        }
        info!(share_id = id, "Share removed");
        Ok(())
    }

    /// Shares addressed to `username`.
    pub async fn list_received(&self, username: &str) -> AppResult<Vec<Share>> {
        self.shares.find_by_receiver(username).await
    }

    /// Shares created on `owner`'s tree.
    pub async fn list_owned(&self, owner: &Owner) -> AppResult<Vec<Share>> {
        self.shares.find_by_owner(owner).await
    }

    /// Shares rooted at or under `file_path`.
    pub async fn attached(&self, owner: &Owner, file_path: &str) -> AppResult<Vec<Share>> {
        let file_path = path::normalize(file_path)
            .ok_or_else(|| AppError::invalid_path(format!("Invalid path: {file_path}")))?;
        self.shares.find_at_or_under(owner, &file_path).await
    }

    async fn notify_address(&self, receiver: &ShareReceiver) -> Option<String> {
        match receiver {
            ShareReceiver::Email(email) => Some(email.clone()),
            ShareReceiver::User(username) => match self.users.find_by_username(username).await {
                Ok(user) => user.and_then(|u| u.email),
                Err(e) => {
                    warn!(username, error = %e, "Could not look up share receiver");
                    None
                }
            },
            ShareReceiver::Link => None,
        }
    }

    fn notify(&self, share: &Share, owner: &Owner, receiver_email: String) {
        let mailer = Arc::clone(&self.mailer);
        let notice = ShareNotice {
            share_id: share.id.clone(),
            owner: owner.clone(),
            file_path: share.file_path.clone(),
            receiver_email,
        };
        tokio::spawn(async move {
            if let Err(e) = mailer.share_created(&notice).await {
                warn!(share_id = %notice.share_id, error = %e, "Share notification failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::LogMailer;
    use cubby_core::ErrorKind;
    use cubby_database::MemoryStore;

    fn service() -> ShareService {
        let store = Arc::new(MemoryStore::new());
        ShareService::new(store.clone(), store, Arc::new(LogMailer::new()))
    }

    fn request(receiver: ShareReceiver, path: &str) -> CreateShare {
        CreateShare {
            owner: Owner::user("alice"),
            file_path: path.to_string(),
            receiver,
            readonly: false,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_deduplicates() {
        let service = service();
        let first = service
            .create(request(ShareReceiver::User("bob".into()), "/docs/"))
            .await
            .unwrap();
        assert!(first.id.starts_with("sid-"));
        assert_eq!(first.file_path, "/docs");

        let again = service
            .create(request(ShareReceiver::User("bob".into()), "docs"))
            .await
            .unwrap();
        assert_eq!(again.id, first.id);

        let link = service
            .create(request(ShareReceiver::Link, "/docs"))
            .await
            .unwrap();
        assert_ne!(link.id, first.id);
        assert!(link.is_public_link());
    }

    #[tokio::test]
    async fn test_public_links_are_never_reused() {
        let service = service();
        let mut readonly = request(ShareReceiver::Link, "/docs");
        readonly.readonly = true;
        let readonly = service.create(readonly).await.unwrap();

        let mut expiring = request(ShareReceiver::Link, "/docs");
        let expires_at = Utc::now() + chrono::Duration::days(1);
        expiring.expires_at = Some(expires_at);
        let expiring = service.create(expiring).await.unwrap();

        assert_ne!(readonly.id, expiring.id);
        assert!(readonly.readonly);
        assert!(readonly.expires_at.is_none());
        assert!(!expiring.readonly);
        assert_eq!(expiring.expires_at, Some(expires_at));
        assert_eq!(service.list_owned(&Owner::user("alice")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_escaping_paths() {
        let service = service();
        let err = service
            .create(request(ShareReceiver::Link, "/../bob"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
    }

    #[tokio::test]
    async fn test_email_share_and_removal() {
        let service = service();
        let share = service
            .create(request(ShareReceiver::Email("x@example.com".into()), "/a"))
            .await
            .unwrap();
        assert_eq!(share.receiver_email.as_deref(), Some("x@example.com"));
        assert!(share.receiver_username.is_none());

        assert_eq!(service.get(&share.id).await.unwrap().id, share.id);
        service.remove(&share.id).await.unwrap();
        assert_eq!(
            service.remove(&share.id).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_listing() {
        let service = service();
        service
            .create(request(ShareReceiver::User("bob".into()), "/docs/a"))
            .await
            .unwrap();
        service
            .create(request(ShareReceiver::Link, "/other"))
            .await
            .unwrap();

        assert_eq!(service.list_received("bob").await.unwrap().len(), 1);
        assert_eq!(service.list_owned(&Owner::user("alice")).await.unwrap().len(), 2);
        assert_eq!(
            service
                .attached(&Owner::user("alice"), "/docs")
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
