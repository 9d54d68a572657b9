//! In-memory implementation of every metadata store trait.
//!
//! Used by tests and by single-node deployments that do not need the
//! records to survive a restart. All state lives behind one lock, so the
//! multi-record operations are atomic just like their SQL counterparts.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use cubby_core::types::path;
use cubby_core::{AppError, AppResult, Owner};
use cubby_entity::favorite::Favorite;
use cubby_entity::group_folder::{CreateGroupFolder, GroupFolder};
use cubby_entity::share::{Share, ShareReceiver};
use cubby_entity::user::User;

use crate::store::{FavoriteStore, GroupFolderStore, ShareStore, UserStore};

#[derive(Debug, Default)]
struct State {
    shares: Vec<Share>,
    folders: BTreeMap<String, GroupFolder>,
    members: BTreeMap<String, BTreeSet<String>>,
    favorites: Vec<Favorite>,
    users: BTreeMap<String, User>,
}

impl State {
    fn folder(&self, id: &str) -> Option<GroupFolder> {
        self.folders.get(id).map(|folder| GroupFolder {
            members: self
                .members
                .get(id)
                .map(|m| m.iter().cloned().collect())
                .unwrap_or_default(),
            ..folder.clone()
        })
    }
}

/// Metadata store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account.
    pub async fn insert_user(&self, user: User) {
        self.state
            .write()
            .await
            .users
            .insert(user.username.clone(), user);
    }
}

fn owned_by(owner_username: &Option<String>, owner_groupfolder: &Option<String>, owner: &Owner) -> bool {
    owner_username.as_deref() == owner.username()
        && owner_groupfolder.as_deref() == owner.group_folder_id()
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn insert(&self, share: &Share) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.shares.iter().any(|s| s.id == share.id) {
            return Err(AppError::database(format!("Duplicate share id {}", share.id)));
        }
        state.shares.push(share.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Share>> {
        let state = self.state.read().await;
        Ok(state.shares.iter().find(|s| s.id == id).cloned())
    }

    async fn find_existing(
        &self,
        owner: &Owner,
        receiver: &ShareReceiver,
        file_path: &str,
    ) -> AppResult<Option<Share>> {
        if matches!(receiver, ShareReceiver::Link) {
            return Ok(None);
        }
        let state = self.state.read().await;
        Ok(state
            .shares
            .iter()
            .find(|s| {
                owned_by(&s.owner_username, &s.owner_groupfolder, owner)
                    && s.receiver_username.as_deref() == receiver.username()
                    && s.receiver_email.as_deref() == receiver.email()
                    && s.file_path == file_path
            })
            .cloned())
    }

    async fn find_at_or_under(&self, owner: &Owner, file_path: &str) -> AppResult<Vec<Share>> {
        let state = self.state.read().await;
        let mut shares: Vec<Share> = state
            .shares
            .iter()
            .filter(|s| {
                owned_by(&s.owner_username, &s.owner_groupfolder, owner)
                    && path::is_at_or_under(&s.file_path, file_path)
            })
            .cloned()
            .collect();
        shares.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(shares)
    }

    async fn find_by_receiver(&self, username: &str) -> AppResult<Vec<Share>> {
        let state = self.state.read().await;
        let mut shares: Vec<Share> = state
            .shares
            .iter()
            .filter(|s| s.receiver_username.as_deref() == Some(username))
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    async fn find_by_owner(&self, owner: &Owner) -> AppResult<Vec<Share>> {
        let state = self.state.read().await;
        let mut shares: Vec<Share> = state
            .shares
            .iter()
            .filter(|s| owned_by(&s.owner_username, &s.owner_groupfolder, owner))
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.shares.len();
        state.shares.retain(|s| s.id != id);
        Ok(state.shares.len() != before)
    }
}

#[async_trait]
impl GroupFolderStore for MemoryStore {
    async fn create(&self, data: &CreateGroupFolder) -> AppResult<GroupFolder> {
        let mut state = self.state.write().await;
        if state.folders.contains_key(&data.id) {
            return Err(AppError::database(format!(
                "Group folder {} already exists",
                data.id
            )));
        }
        state.folders.insert(
            data.id.clone(),
            GroupFolder {
                id: data.id.clone(),
                name: data.name.clone(),
                folder_path: data.folder_path.clone(),
                members: Vec::new(),
            },
        );
        state
            .members
            .insert(data.id.clone(), data.members.iter().cloned().collect());
        state
            .folder(&data.id)
            .ok_or_else(|| AppError::internal("Group folder vanished during create"))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<GroupFolder>> {
        Ok(self.state.read().await.folder(id))
    }

    async fn list_all(&self) -> AppResult<Vec<GroupFolder>> {
        let state = self.state.read().await;
        Ok(state.folders.keys().filter_map(|id| state.folder(id)).collect())
    }

    async fn list_for_member(&self, username: &str) -> AppResult<Vec<GroupFolder>> {
        let state = self.state.read().await;
        Ok(state
            .members
            .iter()
            .filter(|(_, members)| members.contains(username))
            .filter_map(|(id, _)| state.folder(id))
            .collect())
    }

    async fn add_member(&self, id: &str, username: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(id) {
            return Err(AppError::database(format!("Unknown group folder {id}")));
        }
        Ok(state
            .members
            .entry(id.to_string())
            .or_default()
            .insert(username.to_string()))
    }

    async fn remove_member(&self, id: &str, username: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .members
            .get_mut(id)
            .is_some_and(|members| members.remove(username)))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        state
            .shares
            .retain(|s| s.owner_groupfolder.as_deref() != Some(id));
        state
            .favorites
            .retain(|f| f.owner_groupfolder.as_deref() != Some(id));
        state.members.remove(id);
        Ok(state.folders.remove(id).is_some())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn insert(&self, favorite: &Favorite) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.favorites.iter().any(|f| f.id == favorite.id) {
            return Err(AppError::database(format!(
                "Duplicate favorite id {}",
                favorite.id
            )));
        }
        state.favorites.push(favorite.clone());
        Ok(())
    }

    async fn find(
        &self,
        username: &str,
        owner: &Owner,
        file_path: &str,
    ) -> AppResult<Option<Favorite>> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .find(|f| {
                f.username == username
                    && owned_by(&f.owner_username, &f.owner_groupfolder, owner)
                    && f.file_path == file_path
            })
            .cloned())
    }

    async fn find_by_owner_and_path(
        &self,
        owner: &Owner,
        file_path: &str,
    ) -> AppResult<Vec<Favorite>> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .filter(|f| {
                owned_by(&f.owner_username, &f.owner_groupfolder, owner) && f.file_path == file_path
            })
            .cloned()
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Vec<Favorite>> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.username == username)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str, username: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.id == id && f.username == username));
        Ok(state.favorites.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_usernames(&self) -> AppResult<Vec<String>> {
        Ok(self.state.read().await.users.keys().cloned().collect())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn share(id: &str, path: &str, receiver: Option<&str>) -> Share {
        Share {
            id: id.to_string(),
            owner_username: Some("alice".into()),
            owner_groupfolder: None,
            file_path: path.to_string(),
            receiver_email: None,
            receiver_username: receiver.map(str::to_string),
            readonly: true,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_at_or_under_matches_segments() {
        let store = MemoryStore::new();
        ShareStore::insert(&store, &share("sid-1", "/docs", Some("bob"))).await.unwrap();
        ShareStore::insert(&store, &share("sid-2", "/docs/sub", None)).await.unwrap();
        ShareStore::insert(&store, &share("sid-3", "/docsx", None)).await.unwrap();

        let owner = Owner::user("alice");
        let found = store.find_at_or_under(&owner, "/docs").await.unwrap();
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sid-1", "sid-2"]);

        let all = store.find_at_or_under(&owner, "/").await.unwrap();
        assert_eq!(all.len(), 3);

        let other = store.find_at_or_under(&Owner::group_folder("alice"), "/").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_find_existing_distinguishes_receivers() {
        let store = MemoryStore::new();
        ShareStore::insert(&store, &share("sid-1", "/docs", Some("bob"))).await.unwrap();
        ShareStore::insert(&store, &share("sid-2", "/docs", None)).await.unwrap();
        let owner = Owner::user("alice");

        let hit = store
            .find_existing(&owner, &ShareReceiver::User("bob".into()), "/docs")
            .await
            .unwrap();
        assert_eq!(hit.map(|s| s.id), Some("sid-1".to_string()));

        let miss = store
            .find_existing(&owner, &ShareReceiver::Link, "/docs")
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_group_folder_delete_cascades() {
        let store = MemoryStore::new();
        store
            .create(&CreateGroupFolder {
                id: "eng".into(),
                name: "Engineering".into(),
                folder_path: None,
                members: vec!["bob".into(), "alice".into()],
            })
            .await
            .unwrap();
        let mut s = share("sid-g", "/", None);
        s.owner_username = None;
        s.owner_groupfolder = Some("eng".into());
        ShareStore::insert(&store, &s).await.unwrap();

        let folder = GroupFolderStore::find_by_id(&store, "eng").await.unwrap().unwrap();
        assert_eq!(folder.members, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(store.list_for_member("bob").await.unwrap().len(), 1);

        assert!(GroupFolderStore::delete(&store, "eng").await.unwrap());
        assert!(ShareStore::find_by_id(&store, "sid-g").await.unwrap().is_none());
        assert!(store.list_for_member("bob").await.unwrap().is_empty());
    }
}
