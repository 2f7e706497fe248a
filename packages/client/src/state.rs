use std::sync::Arc;

use anyhow::{anyhow, Context};

use realtime::session::Session;
use realtime::transport::WsConnector;
use shared::config::ClientConfig;
use shared::models::user::User;
use shared::repositories::battle_repository::HttpBattleRepository;
use shared::repositories::forum_repository::HttpForumRepository;
use shared::repositories::http::ApiClient;
use shared::repositories::social_repository::HttpSocialRepository;
use shared::repositories::store_repository::FileStore;
use shared::repositories::user_repository::HttpUserRepository;
use shared::services::auth_service::AuthService;
use shared::services::battle_service::BattleService;
use shared::services::chat_service::ChatService;
use shared::services::forum_service::ForumService;
use shared::services::friend_service::{FriendCache, FriendService};
use shared::services::preferences_service::PreferencesService;
use shared::services::user_service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub battle_service: Arc<BattleService>,
    pub forum_service: Arc<ForumService>,
    pub friend_service: Arc<FriendService>,
    pub preferences: PreferencesService,
    social_repository: Arc<HttpSocialRepository>,
}

impl AppState {
    pub async fn build(config: ClientConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(config.store_path())
            .await
            .with_context(|| format!("opening client store at {}", config.store_path().display()))?;
        let preferences = PreferencesService::new(Arc::new(store));
        let client = ApiClient::new(&config.api_base_url);

        let user_repository = Arc::new(HttpUserRepository::new(client.clone()));
        let battle_repository = Arc::new(HttpBattleRepository::new(client.clone()));
        let forum_repository = Arc::new(HttpForumRepository::new(client.clone()));
        let social_repository = Arc::new(HttpSocialRepository::new(client.clone()));

        Ok(AppState {
            auth_service: Arc::new(AuthService::new(
                user_repository.clone(),
                client,
                preferences.clone(),
            )),
            user_service: Arc::new(UserService::new(user_repository, preferences.clone())),
            battle_service: Arc::new(BattleService::new(battle_repository)),
            forum_service: Arc::new(ForumService::new(forum_repository, preferences.clone())),
            friend_service: Arc::new(FriendService::new(
                social_repository.clone(),
                FriendCache::new(),
            )),
            preferences,
            social_repository,
            config,
        })
    }

    /// The signed-in user, restored from the stored token.
    pub async fn require_user(&self) -> anyhow::Result<User> {
        self.auth_service
            .restore()
            .await?
            .ok_or_else(|| anyhow!("Not signed in, run `fanbattle signin` first"))
    }

    pub fn chat_service(&self, me: &str) -> ChatService {
        ChatService::new(self.social_repository.clone(), me)
    }

    pub async fn start_session(&self, user: User) -> anyhow::Result<Arc<Session>> {
        let session = Session::start(user, &self.config, Arc::new(WsConnector)).await?;
        Ok(session)
    }
}
