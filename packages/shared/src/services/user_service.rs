use std::sync::Arc;

use tracing::info;

use crate::models::user::{ProfileUpdate, User};
use crate::repositories::user_repository::UserRepository;
use crate::services::errors::user_service_errors::UserServiceError;
use crate::services::preferences_service::PreferencesService;
use crate::validation::{validate_email, validate_username, Field, FieldErrors};

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    preferences: PreferencesService,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, preferences: PreferencesService) -> Self {
        UserService {
            repository,
            preferences,
        }
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<User, UserServiceError> {
        if username.trim().is_empty() {
            let mut errors = FieldErrors::new();
            errors.add(Field::Username, "Username cannot be empty");
            return Err(UserServiceError::ValidationError(errors));
        }
        Ok(self.repository.get_user(username.trim()).await?)
    }

    /// Fetches the signed-in user's profile and refreshes the cached copy.
    pub async fn refresh(&self, username: &str) -> Result<User, UserServiceError> {
        let user = self.fetch_profile(username).await?;
        self.preferences.save_user(&user).await?;
        Ok(user)
    }

    /// Validates and saves profile edits. A new username is checked for
    /// uniqueness before anything is written.
    pub async fn update_profile(
        &self,
        current: &User,
        update: &ProfileUpdate,
    ) -> Result<User, UserServiceError> {
        if update.is_empty() {
            return Ok(current.clone());
        }

        let mut errors = FieldErrors::new();
        if let Some(username) = &update.username {
            if let Err(msg) = validate_username(username) {
                errors.add(Field::Username, msg);
            }
        }
        if let Some(email) = &update.email {
            if let Err(msg) = validate_email(email) {
                errors.add(Field::Email, msg);
            }
        }
        errors
            .into_result()
            .map_err(UserServiceError::ValidationError)?;

        if update.renames(current) {
            if let Some(username) = &update.username {
                if self.repository.username_exists(username).await? {
                    return Err(UserServiceError::UsernameTaken);
                }
            }
        }

        let user = self
            .repository
            .update_user(&current.username, update)
            .await?;
        self.preferences.save_user(&user).await?;
        info!("Updated profile of {}", user.username);
        Ok(user)
    }

    pub async fn reset_stats(&self, username: &str) -> Result<User, UserServiceError> {
        let user = self.repository.reset_stats(username).await?;
        self.preferences.save_user(&user).await?;
        Ok(user)
    }

    /// Deletes the account on the backend, then forgets the local session.
    pub async fn delete_account(&self, username: &str) -> Result<(), UserServiceError> {
        self.repository.delete_user(username).await?;
        self.preferences.clear_session().await?;
        info!("Deleted account {}", username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::errors::api_errors::ApiError;
    use crate::repositories::store_repository::MemoryStore;
    use crate::repositories::user_repository::MockUserRepository;

    fn service(repo: MockUserRepository) -> (UserService, PreferencesService) {
        let preferences = PreferencesService::new(Arc::new(MemoryStore::new()));
        (UserService::new(Arc::new(repo), preferences.clone()), preferences)
    }

    fn pele() -> User {
        User::new("pele", "pele@example.com")
    }

    #[tokio::test]
    async fn test_fetch_profile_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_user().returning(|_| Err(ApiError::NotFound));
        let (service, _) = service(repo);

        let result = service.fetch_profile("ghost").await;

        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_fetch_profile_empty_username() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_user().never();
        let (service, _) = service(repo);

        let result = service.fetch_profile("   ").await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_refresh_caches_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_user().returning(|_| Ok(pele()));
        let (service, preferences) = service(repo);

        service.refresh("pele").await.unwrap();

        assert_eq!(preferences.cached_user().await.unwrap(), Some(pele()));
    }

    #[tokio::test]
    async fn test_update_profile_checks_username_uniqueness() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists()
            .withf(|name| name == "maradona")
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_update_user().never();
        let (service, _) = service(repo);

        let update = ProfileUpdate {
            username: Some("maradona".to_string()),
            ..Default::default()
        };
        let result = service.update_profile(&pele(), &update).await;

        assert!(matches!(result, Err(UserServiceError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_update_profile_renames_when_free() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_update_user()
            .withf(|current, update| {
                current == "pele" && update.username.as_deref() == Some("edson")
            })
            .times(1)
            .returning(|_, update| {
                let mut user = pele();
                update.apply_to(&mut user);
                Ok(user)
            });
        let (service, preferences) = service(repo);

        let update = ProfileUpdate {
            username: Some("edson".to_string()),
            ..Default::default()
        };
        let user = service.update_profile(&pele(), &update).await.unwrap();

        assert_eq!(user.username, "edson");
        assert_eq!(preferences.username().await.unwrap().as_deref(), Some("edson"));
    }

    #[tokio::test]
    async fn test_update_profile_same_username_skips_lookup() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().never();
        repo.expect_update_user().returning(|_, _| Ok(pele()));
        let (service, _) = service(repo);

        let update = ProfileUpdate {
            username: Some("pele".to_string()),
            avatar: Some("https://cdn.example.com/pele.png".to_string()),
            ..Default::default()
        };

        assert!(service.update_profile(&pele(), &update).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_invalid_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().never();
        repo.expect_update_user().never();
        let (service, _) = service(repo);

        let update = ProfileUpdate {
            username: Some("1x".to_string()),
            email: Some("nope".to_string()),
            avatar: None,
        };
        let err = service.update_profile(&pele(), &update).await.unwrap_err();

        match err {
            UserServiceError::ValidationError(errors) => {
                assert!(errors.get(Field::Username).is_some());
                assert!(errors.get(Field::Email).is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_profile_empty_update_is_noop() {
        let (service, _) = service(MockUserRepository::new());
        let user = service
            .update_profile(&pele(), &ProfileUpdate::default())
            .await
            .unwrap();
        assert_eq!(user, pele());
    }

    #[tokio::test]
    async fn test_reset_stats_refreshes_cache() {
        let mut repo = MockUserRepository::new();
        repo.expect_reset_stats().returning(|_| Ok(pele()));
        let (service, preferences) = service(repo);

        service.reset_stats("pele").await.unwrap();

        assert!(preferences.cached_user().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_account_clears_session() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete_user()
            .withf(|name| name == "pele")
            .times(1)
            .returning(|_| Ok(()));
        let (service, preferences) = service(repo);
        preferences.save_user(&pele()).await.unwrap();
        preferences.save_access_token("abc").await.unwrap();

        service.delete_account("pele").await.unwrap();

        assert!(preferences.cached_user().await.unwrap().is_none());
        assert!(preferences.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_account_failure_keeps_session() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete_user()
            .returning(|_| Err(ApiError::Network("connection refused".to_string())));
        let (service, preferences) = service(repo);
        preferences.save_access_token("abc").await.unwrap();

        let result = service.delete_account("pele").await;

        assert!(matches!(result, Err(UserServiceError::RepositoryError(_))));
        assert!(preferences.access_token().await.unwrap().is_some());
    }
}
