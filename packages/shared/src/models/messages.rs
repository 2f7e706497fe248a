//! Realtime message schema.
//!
//! Every frame on the shared socket is a JSON object discriminated by its
//! `type` field. Outbound frames are [`ClientMessage`]s, inbound frames are
//! decoded into [`ServerMessage`]s at the boundary with [`ServerMessage::decode`];
//! anything with an unrecognised `type` becomes [`ServerMessage::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::battle::{Battle, BattleId};
use crate::models::question::{Question, END_OF_QUESTIONS};
use crate::models::social::{ChatMessage, FriendRequestStatus};
use crate::models::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    UserUpdate {
        user: User,
    },
    GetEmail {
        username: String,
    },
    GetWaitingBattles,
    SendFriendRequest {
        from: String,
        to: String,
    },
    CancelFriendRequest {
        from: String,
        to: String,
    },
    AcceptFriendRequest {
        from: String,
        to: String,
    },
    RejectFriendRequest {
        from: String,
        to: String,
    },
    InviteFriend {
        from: String,
        to: String,
        sport: String,
    },
    CancelInvitation {
        from: String,
        to: String,
    },
    AcceptInvitation {
        from: String,
        to: String,
    },
    RejectInvitation {
        from: String,
        to: String,
    },
    JoinBattle {
        battle_id: BattleId,
        username: String,
    },
    StartBattle {
        battle_id: BattleId,
    },
    SubmitAnswer {
        battle_id: BattleId,
        username: String,
        answer: String,
    },
    CheckForWinner {
        battle_id: BattleId,
    },
    BattleResult {
        battle_id: BattleId,
        winner: String,
        loser: String,
    },
    BattleDrawResult {
        battle_id: BattleId,
    },
    NotifyBattleCreated {
        battle_id: BattleId,
        creator: String,
        sport: String,
    },
    NotifyBattleStarted {
        battle_id: BattleId,
    },
    CancelBattle {
        battle_id: BattleId,
        username: String,
    },
    RemoveFriend {
        username: String,
        friend: String,
    },
    DeleteUser {
        username: String,
    },
    ChatMessage {
        id: Uuid,
        from: String,
        to: String,
        message: String,
    },
    TestConnection,
}

impl ClientMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::UserUpdate { .. } => "user_update",
            ClientMessage::GetEmail { .. } => "get_email",
            ClientMessage::GetWaitingBattles => "get_waiting_battles",
            ClientMessage::SendFriendRequest { .. } => "send_friend_request",
            ClientMessage::CancelFriendRequest { .. } => "cancel_friend_request",
            ClientMessage::AcceptFriendRequest { .. } => "accept_friend_request",
            ClientMessage::RejectFriendRequest { .. } => "reject_friend_request",
            ClientMessage::InviteFriend { .. } => "invite_friend",
            ClientMessage::CancelInvitation { .. } => "cancel_invitation",
            ClientMessage::AcceptInvitation { .. } => "accept_invitation",
            ClientMessage::RejectInvitation { .. } => "reject_invitation",
            ClientMessage::JoinBattle { .. } => "join_battle",
            ClientMessage::StartBattle { .. } => "start_battle",
            ClientMessage::SubmitAnswer { .. } => "submit_answer",
            ClientMessage::CheckForWinner { .. } => "check_for_winner",
            ClientMessage::BattleResult { .. } => "battle_result",
            ClientMessage::BattleDrawResult { .. } => "battle_draw_result",
            ClientMessage::NotifyBattleCreated { .. } => "notify_battle_created",
            ClientMessage::NotifyBattleStarted { .. } => "notify_battle_started",
            ClientMessage::CancelBattle { .. } => "cancel_battle",
            ClientMessage::RemoveFriend { .. } => "remove_friend",
            ClientMessage::DeleteUser { .. } => "delete_user",
            ClientMessage::ChatMessage { .. } => "chat_message",
            ClientMessage::TestConnection => "test_connection",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    UserUpdated {
        user: User,
    },
    FriendRequestUpdated {
        from: String,
        to: String,
        status: FriendRequestStatus,
    },
    ChatMessage(ChatMessage),
    Email {
        username: String,
        email: String,
    },
    WaitingBattles {
        battles: Vec<Battle>,
    },
    BattleCreated {
        battle: Battle,
    },
    BattleStarted {
        battle_id: BattleId,
    },
    BattleFinished {
        battle_id: BattleId,
    },
    BattleCancelled {
        battle_id: BattleId,
    },
    Invitation {
        from: String,
        sport: String,
    },
    InvitationCancelled {
        from: String,
    },
    InvitationAccepted {
        from: String,
        battle_id: BattleId,
    },
    InvitationRejected {
        from: String,
    },
    CurrentQuestion {
        #[serde(default)]
        battle_id: Option<BattleId>,
        question: Question,
    },
    /// Produced by the decoder from the end-of-questions marker.
    QuestionsExhausted {
        #[serde(default)]
        battle_id: Option<BattleId>,
    },
    BattleResult {
        battle_id: BattleId,
        winner: String,
        loser: String,
        #[serde(default)]
        winner_score: Option<u32>,
        #[serde(default)]
        loser_score: Option<u32>,
    },
    BattleDrawResult {
        battle_id: BattleId,
        #[serde(default)]
        score: Option<u32>,
    },
    TestConnection,
    Error {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parses one inbound frame. The end-of-questions marker arrives either as
    /// a bare string or as a question whose text is the marker; both become
    /// `QuestionsExhausted`.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;

        if value.get("type").and_then(Value::as_str) == Some("current_question") {
            let marker = match value.get("question") {
                Some(Value::String(s)) => s.trim() == END_OF_QUESTIONS,
                Some(Value::Object(q)) => {
                    q.get("question").and_then(Value::as_str).map(str::trim)
                        == Some(END_OF_QUESTIONS)
                }
                _ => false,
            };
            if marker {
                if let Some(object) = value.as_object_mut() {
                    object.insert(
                        "type".to_string(),
                        Value::String("questions_exhausted".to_string()),
                    );
                    object.remove("question");
                }
            }
        }

        serde_json::from_value(value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::UserUpdated { .. } => "user_updated",
            ServerMessage::FriendRequestUpdated { .. } => "friend_request_updated",
            ServerMessage::ChatMessage(_) => "chat_message",
            ServerMessage::Email { .. } => "email",
            ServerMessage::WaitingBattles { .. } => "waiting_battles",
            ServerMessage::BattleCreated { .. } => "battle_created",
            ServerMessage::BattleStarted { .. } => "battle_started",
            ServerMessage::BattleFinished { .. } => "battle_finished",
            ServerMessage::BattleCancelled { .. } => "battle_cancelled",
            ServerMessage::Invitation { .. } => "invitation",
            ServerMessage::InvitationCancelled { .. } => "invitation_cancelled",
            ServerMessage::InvitationAccepted { .. } => "invitation_accepted",
            ServerMessage::InvitationRejected { .. } => "invitation_rejected",
            ServerMessage::CurrentQuestion { .. } => "current_question",
            ServerMessage::QuestionsExhausted { .. } => "questions_exhausted",
            ServerMessage::BattleResult { .. } => "battle_result",
            ServerMessage::BattleDrawResult { .. } => "battle_draw_result",
            ServerMessage::TestConnection => "test_connection",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Unknown => "unknown",
        }
    }

    /// True for the pushes after which the waiting-battles list is stale.
    pub fn affects_waiting_battles(&self) -> bool {
        matches!(
            self,
            ServerMessage::BattleCreated { .. }
                | ServerMessage::BattleStarted { .. }
                | ServerMessage::BattleFinished { .. }
                | ServerMessage::BattleCancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_envelope_shape() {
        let message = ClientMessage::SubmitAnswer {
            battle_id: BattleId::from("7"),
            username: "kaka".to_string(),
            answer: "Brazil".to_string(),
        };
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({"type": "submit_answer", "battle_id": "7", "username": "kaka", "answer": "Brazil"})
        );
        assert_eq!(message.kind(), "submit_answer");
    }

    #[test]
    fn test_unit_client_messages() {
        assert_eq!(
            ClientMessage::TestConnection.to_json().unwrap(),
            r#"{"type":"test_connection"}"#
        );
        assert_eq!(
            ClientMessage::GetWaitingBattles.to_json().unwrap(),
            r#"{"type":"get_waiting_battles"}"#
        );
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let messages = vec![
            ClientMessage::GetEmail {
                username: "a".to_string(),
            },
            ClientMessage::InviteFriend {
                from: "a".to_string(),
                to: "b".to_string(),
                sport: "football".to_string(),
            },
            ClientMessage::BattleDrawResult {
                battle_id: BattleId::from("1"),
            },
            ClientMessage::RemoveFriend {
                username: "a".to_string(),
                friend: "b".to_string(),
            },
            ClientMessage::ChatMessage {
                id: Uuid::new_v4(),
                from: "a".to_string(),
                to: "b".to_string(),
                message: "hi".to_string(),
            },
        ];

        for message in messages {
            let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
            assert_eq!(value["type"], message.kind());
        }
    }

    #[test]
    fn test_decode_current_question() {
        let frame = json!({
            "type": "current_question",
            "battle_id": 12,
            "question": {
                "question": "Who won Euro 2016?",
                "answers": ["France", "Portugal"],
                "correctAnswer": "Portugal",
                "difficulty": "easy"
            }
        })
        .to_string();

        match ServerMessage::decode(&frame).unwrap() {
            ServerMessage::CurrentQuestion {
                battle_id,
                question,
            } => {
                assert_eq!(battle_id, Some(BattleId::from("12")));
                assert_eq!(question.correct_answer, "Portugal");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_end_marker_as_string() {
        let frame = r#"{"type":"current_question","battle_id":"3","question":"No more questions"}"#;

        assert_eq!(
            ServerMessage::decode(frame).unwrap(),
            ServerMessage::QuestionsExhausted {
                battle_id: Some(BattleId::from("3"))
            }
        );
    }

    #[test]
    fn test_decode_end_marker_inside_question() {
        let frame = json!({
            "type": "current_question",
            "question": {"question": "No more questions", "answers": []}
        })
        .to_string();

        assert_eq!(
            ServerMessage::decode(&frame).unwrap(),
            ServerMessage::QuestionsExhausted { battle_id: None }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let message = ServerMessage::decode(r#"{"type":"leaderboard_changed","top":[1,2]}"#).unwrap();
        assert_eq!(message, ServerMessage::Unknown);
        assert_eq!(message.kind(), "unknown");
    }

    #[test]
    fn test_decode_rejects_malformed_known_type() {
        assert!(ServerMessage::decode(r#"{"type":"battle_result","battle_id":"1"}"#).is_err());
        assert!(ServerMessage::decode("not json").is_err());
    }

    #[test]
    fn test_decode_chat_message() {
        let frame = r#"{"type":"chat_message","from":"bob","to":"alice","message":"gg"}"#;

        match ServerMessage::decode(frame).unwrap() {
            ServerMessage::ChatMessage(chat) => {
                assert_eq!(chat.from, "bob");
                assert_eq!(chat.message, "gg");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unit_variant_ignores_extra_fields() {
        let message = ServerMessage::decode(r#"{"type":"test_connection","status":"ok"}"#).unwrap();
        assert_eq!(message, ServerMessage::TestConnection);
    }

    #[test]
    fn test_affects_waiting_battles() {
        assert!(ServerMessage::BattleStarted {
            battle_id: BattleId::from("1")
        }
        .affects_waiting_battles());
        assert!(!ServerMessage::TestConnection.affects_waiting_battles());
    }
}
