use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::social::Friend;
use crate::repositories::social_repository::SocialRepository;
use crate::services::errors::social_service_errors::SocialServiceError;

/// Friend profiles keyed by username. Clones share one map, so every screen
/// that holds a cache sees the same entries.
#[derive(Clone, Default)]
pub struct FriendCache {
    inner: Arc<RwLock<HashMap<String, Friend>>>,
}

impl FriendCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, username: &str) -> Option<Friend> {
        self.inner.read().await.get(username).cloned()
    }

    pub async fn insert(&self, friend: Friend) {
        self.inner
            .write()
            .await
            .insert(friend.username.clone(), friend);
    }

    pub async fn remove(&self, username: &str) -> Option<Friend> {
        self.inner.write().await.remove(username)
    }

    pub async fn set_online(&self, username: &str, online: bool) -> bool {
        match self.inner.write().await.get_mut(username) {
            Some(friend) => {
                friend.online = online;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

pub struct FriendService {
    repository: Arc<dyn SocialRepository>,
    cache: FriendCache,
}

impl FriendService {
    pub fn new(repository: Arc<dyn SocialRepository>, cache: FriendCache) -> Self {
        FriendService { repository, cache }
    }

    pub fn cache(&self) -> &FriendCache {
        &self.cache
    }

    /// Fetches the friends of `username`, sorted online first, and refreshes
    /// the cache with every profile received.
    pub async fn friends(&self, username: &str) -> Result<Vec<Friend>, SocialServiceError> {
        let mut friends = self.repository.friends(username).await?;
        friends.sort_by(|a, b| {
            b.online
                .cmp(&a.online)
                .then_with(|| a.username.cmp(&b.username))
        });
        for friend in &friends {
            self.cache.insert(friend.clone()).await;
        }
        debug!("{} friends loaded for {}", friends.len(), username);
        Ok(friends)
    }

    /// Cache first; falls back to reloading the friend list of `owner`.
    pub async fn lookup(&self, owner: &str, friend: &str) -> Result<Friend, SocialServiceError> {
        if let Some(found) = self.cache.get(friend).await {
            return Ok(found);
        }
        self.friends(owner)
            .await?
            .into_iter()
            .find(|f| f.username == friend)
            .ok_or_else(|| SocialServiceError::NotFriends(friend.to_string()))
    }

    pub async fn forget(&self, friend: &str) {
        self.cache.remove(friend).await;
    }
}
