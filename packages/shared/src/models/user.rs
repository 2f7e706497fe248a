use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::battle::BattleOutcome;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub winrate: f64,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub total_battles: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub friend_requests: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, email: &str) -> Self {
        User {
            username: username.to_string(),
            email: email.to_string(),
            avatar: None,
            rank: None,
            winrate: 0.0,
            streak: 0,
            total_battles: 0,
            wins: 0,
            friends: vec![],
            friend_requests: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn is_friend(&self, username: &str) -> bool {
        self.friends.iter().any(|f| f == username)
    }

    pub fn has_request_from(&self, username: &str) -> bool {
        self.friend_requests.iter().any(|f| f == username)
    }

    pub fn add_friend(&mut self, username: &str) {
        self.friend_requests.retain(|f| f != username);
        if !self.is_friend(username) {
            self.friends.push(username.to_string());
        }
    }

    pub fn remove_friend(&mut self, username: &str) {
        self.friends.retain(|f| f != username);
    }

    pub fn add_friend_request(&mut self, username: &str) {
        if !self.has_request_from(username) && !self.is_friend(username) {
            self.friend_requests.push(username.to_string());
        }
    }

    pub fn drop_friend_request(&mut self, username: &str) {
        self.friend_requests.retain(|f| f != username);
    }

    /// Folds a finished battle into the local stats. The backend remains the
    /// source of truth; this only keeps the cached profile current until the
    /// next `user_updated` push.
    pub fn record_outcome(&mut self, outcome: BattleOutcome) {
        self.total_battles += 1;
        match outcome {
            BattleOutcome::Win => {
                self.wins += 1;
                self.streak += 1;
            }
            BattleOutcome::Lose => self.streak = 0,
            BattleOutcome::Draw => {}
        }
        self.winrate = (self.wins as f64 / self.total_battles as f64) * 100.0;
    }

    pub fn reset_stats(&mut self) {
        self.winrate = 0.0;
        self.streak = 0;
        self.total_battles = 0;
        self.wins = 0;
        self.rank = None;
    }
}

/// Profile edits. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.avatar.is_none()
    }

    /// True when the update would rename `user`.
    pub fn renames(&self, user: &User) -> bool {
        matches!(&self.username, Some(name) if name != &user.username)
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("ronaldo7", "cr7@example.com");

        assert_eq!(user.username, "ronaldo7");
        assert_eq!(user.email, "cr7@example.com");
        assert!(user.friends.is_empty());
        assert!(user.friend_requests.is_empty());
        assert_eq!(user.total_battles, 0);
    }

    #[test]
    fn test_user_deserializes_sparse_payload() {
        let json = r#"{"username":"pele","email":"pele@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.username, "pele");
        assert_eq!(user.streak, 0);
        assert!(user.avatar.is_none());
    }

    #[test]
    fn test_accepting_request_moves_to_friends() {
        let mut user = User::new("pele", "pele@example.com");
        user.add_friend_request("garrincha");
        assert!(user.has_request_from("garrincha"));

        user.add_friend("garrincha");

        assert!(user.is_friend("garrincha"));
        assert!(!user.has_request_from("garrincha"));
    }

    #[test]
    fn test_friend_request_not_duplicated() {
        let mut user = User::new("pele", "pele@example.com");
        user.add_friend_request("zico");
        user.add_friend_request("zico");
        assert_eq!(user.friend_requests.len(), 1);

        user.add_friend("zico");
        user.add_friend_request("zico");
        assert!(user.friend_requests.is_empty());
    }

    #[test]
    fn test_record_outcome_updates_stats() {
        let mut user = User::new("pele", "pele@example.com");
        user.record_outcome(BattleOutcome::Win);
        user.record_outcome(BattleOutcome::Win);
        user.record_outcome(BattleOutcome::Lose);
        user.record_outcome(BattleOutcome::Draw);

        assert_eq!(user.total_battles, 4);
        assert_eq!(user.wins, 2);
        assert_eq!(user.streak, 0);
        assert!((user.winrate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_stats() {
        let mut user = User::new("pele", "pele@example.com");
        user.record_outcome(BattleOutcome::Win);
        user.rank = Some(3);
        user.reset_stats();

        assert_eq!(user.total_battles, 0);
        assert_eq!(user.wins, 0);
        assert_eq!(user.winrate, 0.0);
        assert!(user.rank.is_none());
    }

    #[test]
    fn test_profile_update_apply() {
        let mut user = User::new("pele", "pele@example.com");
        let update = ProfileUpdate {
            username: Some("edson".to_string()),
            avatar: Some("https://cdn.example.com/a.png".to_string()),
            ..Default::default()
        };

        assert!(update.renames(&user));
        update.apply_to(&mut user);

        assert_eq!(user.username, "edson");
        assert_eq!(user.email, "pele@example.com");
        assert_eq!(user.avatar.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();

        assert_eq!(json, r#"{"email":"new@example.com"}"#);
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }
}
