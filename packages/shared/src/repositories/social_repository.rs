use async_trait::async_trait;

use crate::models::social::{ChatMessage, Friend};
use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::http::ApiClient;

#[cfg(test)]
use mockall::automock;

pub struct HttpSocialRepository {
    pub client: ApiClient,
}

impl HttpSocialRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SocialRepository: Send + Sync {
    async fn friends(&self, username: &str) -> Result<Vec<Friend>, ApiError>;
    async fn chat_history(
        &self,
        username: &str,
        friend: &str,
    ) -> Result<Vec<ChatMessage>, ApiError>;
}

#[async_trait]
impl SocialRepository for HttpSocialRepository {
    async fn friends(&self, username: &str) -> Result<Vec<Friend>, ApiError> {
        self.client.get(&format!("/friends/{}", username)).await
    }

    async fn chat_history(
        &self,
        username: &str,
        friend: &str,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.client
            .get(&format!("/chat/{}/{}", username, friend))
            .await
    }
}
