use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::preferences::{keys, Language, Theme};
use crate::models::user::User;
use crate::repositories::errors::store_errors::StoreError;
use crate::repositories::store_repository::StoreRepository;

/// Typed view over the persisted client store.
///
/// `username` and `access_token` are kept as plain strings; every other key
/// holds JSON. A value that no longer parses is treated as absent.
#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn StoreRepository>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn StoreRepository>) -> Self {
        PreferencesService { store }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable value for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, serde_json::to_string(value)?).await
    }

    pub async fn cached_user(&self) -> Result<Option<User>, StoreError> {
        self.get_json(keys::USER).await
    }

    pub async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        debug!("Caching user {}", user.username);
        self.set_json(keys::USER, user).await?;
        self.store.set(keys::USERNAME, user.username.clone()).await
    }

    pub async fn username(&self) -> Result<Option<String>, StoreError> {
        self.store.get(keys::USERNAME).await
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(keys::ACCESS_TOKEN).await
    }

    pub async fn save_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(keys::ACCESS_TOKEN, token.to_string()).await
    }

    /// Forgets the signed-in identity. Theme, language, liked articles and
    /// onboarding flags survive sign-out.
    pub async fn clear_session(&self) -> Result<(), StoreError> {
        self.store.remove(keys::USER).await?;
        self.store.remove(keys::USERNAME).await?;
        self.store.remove(keys::ACCESS_TOKEN).await
    }

    pub async fn theme(&self) -> Result<Theme, StoreError> {
        Ok(self.get_json(keys::THEME).await?.unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.set_json(keys::THEME, &theme).await
    }

    pub async fn toggle_theme(&self) -> Result<Theme, StoreError> {
        let theme = self.theme().await?.toggled();
        self.set_theme(theme).await?;
        Ok(theme)
    }

    pub async fn language(&self) -> Result<Language, StoreError> {
        Ok(self.get_json(keys::LANGUAGE).await?.unwrap_or_default())
    }

    pub async fn set_language(&self, language: Language) -> Result<(), StoreError> {
        self.set_json(keys::LANGUAGE, &language).await
    }

    pub async fn liked_articles(&self) -> Result<BTreeSet<i64>, StoreError> {
        Ok(self
            .get_json(keys::LIKED_ARTICLES)
            .await?
            .unwrap_or_default())
    }

    /// Returns whether the article is liked after the toggle.
    pub async fn toggle_liked_article(&self, article_id: i64) -> Result<bool, StoreError> {
        let mut liked = self.liked_articles().await?;
        let now_liked = if liked.remove(&article_id) {
            false
        } else {
            liked.insert(article_id);
            true
        };
        self.set_json(keys::LIKED_ARTICLES, &liked).await?;
        Ok(now_liked)
    }

    pub async fn is_onboarding_complete(&self, page: &str) -> Result<bool, StoreError> {
        Ok(self
            .get_json::<bool>(&keys::onboarding(page))
            .await?
            .unwrap_or(false))
    }

    pub async fn complete_onboarding(&self, page: &str) -> Result<(), StoreError> {
        self.set_json(&keys::onboarding(page), &true).await
    }
}
