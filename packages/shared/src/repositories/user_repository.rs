use async_trait::async_trait;
use tracing::info;

use crate::models::auth::requests::{SignInRequest, SignUpRequest};
use crate::models::auth::responses::{AuthResponse, ExistsResponse};
use crate::models::user::{ProfileUpdate, User};
use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::http::ApiClient;

#[cfg(test)]
use mockall::automock;

pub struct HttpUserRepository {
    pub client: ApiClient,
}

impl HttpUserRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError>;
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError>;
    async fn get_user(&self, username: &str) -> Result<User, ApiError>;
    async fn username_exists(&self, username: &str) -> Result<bool, ApiError>;
    async fn update_user(&self, username: &str, update: &ProfileUpdate) -> Result<User, ApiError>;
    async fn reset_stats(&self, username: &str) -> Result<User, ApiError>;
    async fn delete_user(&self, username: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl UserRepository for HttpUserRepository {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        info!("Signing in {}", request.identifier);
        self.client.post("/auth/signin", request).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError> {
        info!("Signing up {}", request.username);
        self.client.post("/auth/signup", request).await
    }

    async fn get_user(&self, username: &str) -> Result<User, ApiError> {
        self.client.get(&format!("/users/{}", username)).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let response: ExistsResponse = self
            .client
            .get(&format!("/users/{}/exists", username))
            .await?;
        Ok(response.exists)
    }

    async fn update_user(&self, username: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
        info!("Updating profile of {}", username);
        self.client.put(&format!("/users/{}", username), update).await
    }

    async fn reset_stats(&self, username: &str) -> Result<User, ApiError> {
        info!("Resetting stats of {}", username);
        self.client
            .post(&format!("/users/{}/reset-stats", username), &serde_json::json!({}))
            .await
    }

    async fn delete_user(&self, username: &str) -> Result<(), ApiError> {
        info!("Deleting account {}", username);
        self.client.delete(&format!("/users/{}", username)).await
    }
}
