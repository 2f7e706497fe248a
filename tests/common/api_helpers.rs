use std::sync::Arc;

use wiremock::MockServer;

use shared::repositories::forum_repository::HttpForumRepository;
use shared::repositories::http::ApiClient;
use shared::repositories::user_repository::HttpUserRepository;
use shared::services::auth_service::AuthService;
use shared::services::forum_service::ForumService;
use shared::services::preferences_service::PreferencesService;
use shared::services::user_service::UserService;

use crate::common::utils::{init_tracing, memory_preferences};

/// Services wired against a mock backend, sharing one client and store.
pub struct TestApp {
    pub server: MockServer,
    pub client: ApiClient,
    pub preferences: PreferencesService,
    pub auth: AuthService,
    pub users: UserService,
    pub forum: ForumService,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(memory_preferences()).await
    }

    pub async fn spawn_with(preferences: PreferencesService) -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let client = ApiClient::new(&server.uri());
        let user_repository = Arc::new(HttpUserRepository::new(client.clone()));
        let forum_repository = Arc::new(HttpForumRepository::new(client.clone()));

        TestApp {
            auth: AuthService::new(user_repository.clone(), client.clone(), preferences.clone()),
            users: UserService::new(user_repository, preferences.clone()),
            forum: ForumService::new(forum_repository, preferences.clone()),
            server,
            client,
            preferences,
        }
    }

    /// A second client process over the same store, as after a restart.
    pub fn restarted_auth(&self) -> (AuthService, ApiClient) {
        let client = ApiClient::new(&self.server.uri());
        let repository = Arc::new(HttpUserRepository::new(client.clone()));
        (
            AuthService::new(repository, client.clone(), self.preferences.clone()),
            client,
        )
    }
}
