use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::social::ChatMessage;
use crate::repositories::social_repository::SocialRepository;
use crate::services::errors::social_service_errors::SocialServiceError;

pub const MAX_MESSAGE_LEN: usize = 500;

/// Per-friend conversations for the signed-in user. Sending is left to the
/// realtime connection; this service validates, records and orders messages.
pub struct ChatService {
    repository: Arc<dyn SocialRepository>,
    me: String,
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl ChatService {
    pub fn new(repository: Arc<dyn SocialRepository>, me: &str) -> Self {
        ChatService {
            repository,
            me: me.to_string(),
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    /// Replaces the local conversation with the backend history, oldest first.
    pub async fn load_history(&self, friend: &str) -> Result<Vec<ChatMessage>, SocialServiceError> {
        let mut history = self.repository.chat_history(&self.me, friend).await?;
        history.sort_by_key(|m| m.timestamp);
        self.conversations
            .write()
            .await
            .insert(friend.to_string(), history.clone());
        Ok(history)
    }

    pub async fn conversation(&self, friend: &str) -> Vec<ChatMessage> {
        self.conversations
            .read()
            .await
            .get(friend)
            .cloned()
            .unwrap_or_default()
    }

    /// Files a pushed message under its counterpart. Messages that do not
    /// involve this user, or that were already recorded, are ignored.
    pub async fn record_incoming(&self, message: ChatMessage) -> bool {
        if message.from != self.me && message.to != self.me {
            return false;
        }
        let friend = message.counterpart(&self.me).to_string();
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.entry(friend).or_default();
        if conversation.iter().any(|m| m.id == message.id) {
            return false;
        }
        conversation.push(message);
        true
    }

    /// Builds an outgoing message and records it locally.
    pub async fn compose(&self, friend: &str, text: &str) -> Result<ChatMessage, SocialServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SocialServiceError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(SocialServiceError::ValidationError(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        if friend == self.me {
            return Err(SocialServiceError::ValidationError(
                "Cannot message yourself".to_string(),
            ));
        }

        let message = ChatMessage::new(&self.me, friend, text);
        self.record_incoming(message.clone()).await;
        debug!("Composed message {} to {}", message.id, friend);
        Ok(message)
    }

    pub async fn unread_from(&self, friend: &str, since: chrono::DateTime<chrono::Utc>) -> usize {
        self.conversations
            .read()
            .await
            .get(friend)
            .map(|c| {
                c.iter()
                    .filter(|m| m.from == friend && m.timestamp > since)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::social_repository::MockSocialRepository;
    use chrono::{Duration, Utc};

    fn message_at(from: &str, to: &str, text: &str, minutes_ago: i64) -> ChatMessage {
        let mut message = ChatMessage::new(from, to, text);
        message.timestamp = Utc::now() - Duration::minutes(minutes_ago);
        message
    }

    #[tokio::test]
    async fn test_load_history_orders_by_timestamp() {
        let mut repo = MockSocialRepository::new();
        repo.expect_chat_history()
            .withf(|me, friend| me == "pele" && friend == "kaka")
            .returning(|_, _| {
                Ok(vec![
                    message_at("kaka", "pele", "second", 1),
                    message_at("pele", "kaka", "first", 5),
                ])
            });
        let service = ChatService::new(Arc::new(repo), "pele");

        let history = service.load_history("kaka").await.unwrap();

        assert_eq!(history[0].message, "first");
        assert_eq!(service.conversation("kaka").await.len(), 2);
    }

    #[tokio::test]
    async fn test_record_incoming_files_under_counterpart_once() {
        let service = ChatService::new(Arc::new(MockSocialRepository::new()), "pele");
        let message = ChatMessage::new("kaka", "pele", "gg");

        assert!(service.record_incoming(message.clone()).await);
        assert!(!service.record_incoming(message).await);
        assert!(
            !service
                .record_incoming(ChatMessage::new("kaka", "cafu", "not for pele"))
                .await
        );

        assert_eq!(service.conversation("kaka").await.len(), 1);
        assert!(service.conversation("cafu").await.is_empty());
    }

    #[tokio::test]
    async fn test_compose_validates_text() {
        let service = ChatService::new(Arc::new(MockSocialRepository::new()), "pele");

        assert!(matches!(
            service.compose("kaka", "   ").await,
            Err(SocialServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.compose("kaka", &"x".repeat(MAX_MESSAGE_LEN + 1)).await,
            Err(SocialServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.compose("pele", "hi me").await,
            Err(SocialServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_compose_records_outgoing() {
        let service = ChatService::new(Arc::new(MockSocialRepository::new()), "pele");

        let message = service.compose("kaka", "  rematch?  ").await.unwrap();

        assert_eq!(message.message, "rematch?");
        assert_eq!(message.to, "kaka");
        assert_eq!(service.conversation("kaka").await, vec![message]);
    }

    #[tokio::test]
    async fn test_unread_counts_only_friend_messages() {
        let service = ChatService::new(Arc::new(MockSocialRepository::new()), "pele");
        let since = Utc::now() - Duration::minutes(3);
        service
            .record_incoming(message_at("kaka", "pele", "old", 10))
            .await;
        service
            .record_incoming(message_at("kaka", "pele", "new", 1))
            .await;
        service.compose("kaka", "reply").await.unwrap();

        assert_eq!(service.unread_from("kaka", since).await, 1);
    }
}
