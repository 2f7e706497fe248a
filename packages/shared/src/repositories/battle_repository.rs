use async_trait::async_trait;

use crate::models::battle::Battle;
use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::http::ApiClient;

#[cfg(test)]
use mockall::automock;

pub struct HttpBattleRepository {
    pub client: ApiClient,
}

impl HttpBattleRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BattleRepository: Send + Sync {
    async fn battles_for(&self, username: &str) -> Result<Vec<Battle>, ApiError>;
    async fn waiting_battles(&self) -> Result<Vec<Battle>, ApiError>;
}

#[async_trait]
impl BattleRepository for HttpBattleRepository {
    async fn battles_for(&self, username: &str) -> Result<Vec<Battle>, ApiError> {
        self.client
            .get_with_query("/battles", &[("username", username)])
            .await
    }

    async fn waiting_battles(&self) -> Result<Vec<Battle>, ApiError> {
        self.client.get("/battles/waiting").await
    }
}
