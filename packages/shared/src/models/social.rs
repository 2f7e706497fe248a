use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(from: &str, to: &str, message: &str) -> Self {
        ChatMessage {
            id: Uuid::new_v4(),
            from: from.to_string(),
            to: to.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// The other side of the conversation as seen by `me`.
    pub fn counterpart<'a>(&'a self, me: &str) -> &'a str {
        if self.from == me {
            &self.to
        } else {
            &self.from
        }
    }
}
