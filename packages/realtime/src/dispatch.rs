use std::sync::Arc;

use tracing::{error, warn};

use shared::models::battle::BattleId;
use shared::models::messages::ClientMessage;
use shared::models::social::ChatMessage;
use shared::models::user::User;

use crate::connection::Connection;
use crate::errors::RealtimeError;

/// One helper per outbound action. Each is fire-and-forget: the result only
/// says whether the frame reached the socket, never whether the backend
/// acted on it.
#[derive(Clone)]
pub struct Dispatcher {
    connection: Arc<Connection>,
}

impl Dispatcher {
    pub fn new(connection: Arc<Connection>) -> Self {
        Dispatcher { connection }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    async fn dispatch(&self, message: ClientMessage) -> bool {
        let kind = message.kind();
        match self.connection.send(message).await {
            Ok(()) => true,
            Err(RealtimeError::Serialization(e)) => {
                error!("Could not encode {}: {}", kind, e);
                false
            }
            Err(e) => {
                warn!("Failed to send {}: {}", kind, e);
                false
            }
        }
    }

    pub async fn user_update(&self, user: &User) -> bool {
        self.dispatch(ClientMessage::UserUpdate { user: user.clone() })
            .await
    }

    pub async fn get_email(&self, username: &str) -> bool {
        self.dispatch(ClientMessage::GetEmail {
            username: username.to_string(),
        })
        .await
    }

    pub async fn get_waiting_battles(&self) -> bool {
        self.dispatch(ClientMessage::GetWaitingBattles).await
    }

    pub async fn send_friend_request(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::SendFriendRequest {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn cancel_friend_request(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::CancelFriendRequest {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn accept_friend_request(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::AcceptFriendRequest {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn reject_friend_request(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::RejectFriendRequest {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn invite_friend(&self, from: &str, to: &str, sport: &str) -> bool {
        self.dispatch(ClientMessage::InviteFriend {
            from: from.to_string(),
            to: to.to_string(),
            sport: sport.to_string(),
        })
        .await
    }

    pub async fn cancel_invitation(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::CancelInvitation {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn accept_invitation(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::AcceptInvitation {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn reject_invitation(&self, from: &str, to: &str) -> bool {
        self.dispatch(ClientMessage::RejectInvitation {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    pub async fn join_battle(&self, battle_id: &BattleId, username: &str) -> bool {
        self.dispatch(ClientMessage::JoinBattle {
            battle_id: battle_id.clone(),
            username: username.to_string(),
        })
        .await
    }

    pub async fn start_battle(&self, battle_id: &BattleId) -> bool {
        self.dispatch(ClientMessage::StartBattle {
            battle_id: battle_id.clone(),
        })
        .await
    }

    pub async fn submit_answer(&self, battle_id: &BattleId, username: &str, answer: &str) -> bool {
        self.dispatch(ClientMessage::SubmitAnswer {
            battle_id: battle_id.clone(),
            username: username.to_string(),
            answer: answer.to_string(),
        })
        .await
    }

    pub async fn check_for_winner(&self, battle_id: &BattleId) -> bool {
        self.dispatch(ClientMessage::CheckForWinner {
            battle_id: battle_id.clone(),
        })
        .await
    }

    pub async fn battle_result(&self, battle_id: &BattleId, winner: &str, loser: &str) -> bool {
        self.dispatch(ClientMessage::BattleResult {
            battle_id: battle_id.clone(),
            winner: winner.to_string(),
            loser: loser.to_string(),
        })
        .await
    }

    pub async fn battle_draw_result(&self, battle_id: &BattleId) -> bool {
        self.dispatch(ClientMessage::BattleDrawResult {
            battle_id: battle_id.clone(),
        })
        .await
    }

    pub async fn notify_battle_created(
        &self,
        battle_id: &BattleId,
        creator: &str,
        sport: &str,
    ) -> bool {
        self.dispatch(ClientMessage::NotifyBattleCreated {
            battle_id: battle_id.clone(),
            creator: creator.to_string(),
            sport: sport.to_string(),
        })
        .await
    }

    pub async fn notify_battle_started(&self, battle_id: &BattleId) -> bool {
        self.dispatch(ClientMessage::NotifyBattleStarted {
            battle_id: battle_id.clone(),
        })
        .await
    }

    pub async fn cancel_battle(&self, battle_id: &BattleId, username: &str) -> bool {
        self.dispatch(ClientMessage::CancelBattle {
            battle_id: battle_id.clone(),
            username: username.to_string(),
        })
        .await
    }

    pub async fn remove_friend(&self, username: &str, friend: &str) -> bool {
        self.dispatch(ClientMessage::RemoveFriend {
            username: username.to_string(),
            friend: friend.to_string(),
        })
        .await
    }

    pub async fn delete_user(&self, username: &str) -> bool {
        self.dispatch(ClientMessage::DeleteUser {
            username: username.to_string(),
        })
        .await
    }

    pub async fn chat_message(&self, message: &ChatMessage) -> bool {
        self.dispatch(ClientMessage::ChatMessage {
            id: message.id,
            from: message.from.clone(),
            to: message.to.clone(),
            message: message.message.clone(),
        })
        .await
    }

    pub async fn test_connection(&self) -> bool {
        self.dispatch(ClientMessage::TestConnection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, FakeServer};
    use serde_json::json;
    use std::time::Duration;
    use test_case::test_case;

    async fn dispatcher() -> (Dispatcher, FakeConnector, FakeServer) {
        let connector = FakeConnector::new();
        let connection = Connection::open(
            "ws://test/pele",
            Arc::new(connector.clone()),
            Duration::from_millis(3000),
        )
        .await
        .unwrap();
        let server = connector.server(0).await;
        (Dispatcher::new(connection), connector, server)
    }

    #[tokio::test]
    async fn test_friend_request_envelopes() {
        let (dispatcher, _, mut server) = dispatcher().await;

        assert!(dispatcher.send_friend_request("pele", "kaka").await);
        assert!(dispatcher.accept_friend_request("kaka", "pele").await);

        assert_eq!(
            server.next_frame().await.unwrap(),
            json!({"type": "send_friend_request", "from": "pele", "to": "kaka"})
        );
        assert_eq!(
            server.next_frame().await.unwrap(),
            json!({"type": "accept_friend_request", "from": "kaka", "to": "pele"})
        );
    }

    #[test_case("answer", json!({"type": "submit_answer", "battle_id": "9", "username": "pele", "answer": "Maracana"}) ; "submit answer")]
    #[test_case("winner", json!({"type": "check_for_winner", "battle_id": "9"}) ; "check for winner")]
    #[test_case("result", json!({"type": "battle_result", "battle_id": "9", "winner": "pele", "loser": "kaka"}) ; "battle result")]
    #[test_case("draw", json!({"type": "battle_draw_result", "battle_id": "9"}) ; "draw result")]
    #[test_case("start", json!({"type": "start_battle", "battle_id": "9"}) ; "start battle")]
    #[tokio::test]
    async fn test_battle_envelopes(action: &str, expected: serde_json::Value) {
        let (dispatcher, _, mut server) = dispatcher().await;
        let battle_id = BattleId::from("9");

        let sent = match action {
            "answer" => dispatcher.submit_answer(&battle_id, "pele", "Maracana").await,
            "winner" => dispatcher.check_for_winner(&battle_id).await,
            "result" => dispatcher.battle_result(&battle_id, "pele", "kaka").await,
            "draw" => dispatcher.battle_draw_result(&battle_id).await,
            _ => dispatcher.start_battle(&battle_id).await,
        };

        assert!(sent);
        assert_eq!(server.next_frame().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_chat_message_keeps_client_id() {
        let (dispatcher, _, mut server) = dispatcher().await;
        let message = ChatMessage::new("pele", "kaka", "gg");

        assert!(dispatcher.chat_message(&message).await);

        let frame = server.next_frame().await.unwrap();
        assert_eq!(frame["type"], "chat_message");
        assert_eq!(frame["id"], message.id.to_string());
        assert_eq!(frame["message"], "gg");
    }

    #[tokio::test]
    async fn test_dispatch_failure_returns_false() {
        let (dispatcher, connector, server) = dispatcher().await;
        server.disconnect();
        connector.refuse_connections(true).await;

        assert!(!dispatcher.get_waiting_battles().await);
        assert!(!dispatcher.invite_friend("pele", "kaka", "football").await);
    }
}
