use async_trait::async_trait;
use serde_json::json;

use crate::models::forum::{Comment, Debate, NewComment, NewsArticle, Transfer, VoteSide};
use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::http::ApiClient;

#[cfg(test)]
use mockall::automock;

pub struct HttpForumRepository {
    pub client: ApiClient,
}

impl HttpForumRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ForumRepository: Send + Sync {
    async fn debates(&self) -> Result<Vec<Debate>, ApiError>;
    async fn like_debate(&self, debate_id: i64, username: &str) -> Result<(), ApiError>;
    async fn vote_debate(
        &self,
        debate_id: i64,
        username: &str,
        side: VoteSide,
    ) -> Result<(), ApiError>;
    async fn comments(&self, debate_id: i64) -> Result<Vec<Comment>, ApiError>;
    async fn add_comment(&self, debate_id: i64, comment: &NewComment)
        -> Result<Comment, ApiError>;
    async fn like_comment(&self, comment_id: i64, username: &str) -> Result<(), ApiError>;
    async fn transfers(&self) -> Result<Vec<Transfer>, ApiError>;
    async fn like_transfer(&self, transfer_id: i64, username: &str) -> Result<(), ApiError>;
    async fn news(&self) -> Result<Vec<NewsArticle>, ApiError>;
}

#[async_trait]
impl ForumRepository for HttpForumRepository {
    async fn debates(&self) -> Result<Vec<Debate>, ApiError> {
        self.client.get("/debates").await
    }

    async fn like_debate(&self, debate_id: i64, username: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                &format!("/debates/{}/like", debate_id),
                Some(&json!({ "username": username })),
            )
            .await
    }

    async fn vote_debate(
        &self,
        debate_id: i64,
        username: &str,
        side: VoteSide,
    ) -> Result<(), ApiError> {
        self.client
            .post_empty(
                &format!("/debates/{}/vote", debate_id),
                Some(&json!({ "username": username, "side": side })),
            )
            .await
    }

    async fn comments(&self, debate_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.client
            .get(&format!("/debates/{}/comments", debate_id))
            .await
    }

    async fn add_comment(
        &self,
        debate_id: i64,
        comment: &NewComment,
    ) -> Result<Comment, ApiError> {
        self.client
            .post(&format!("/debates/{}/comments", debate_id), comment)
            .await
    }

    async fn like_comment(&self, comment_id: i64, username: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                &format!("/comments/{}/like", comment_id),
                Some(&json!({ "username": username })),
            )
            .await
    }

    async fn transfers(&self) -> Result<Vec<Transfer>, ApiError> {
        self.client.get("/transfers").await
    }

    async fn like_transfer(&self, transfer_id: i64, username: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                &format!("/transfers/{}/like", transfer_id),
                Some(&json!({ "username": username })),
            )
            .await
    }

    async fn news(&self) -> Result<Vec<NewsArticle>, ApiError> {
        self.client.get("/news").await
    }
}
