use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared::models::battle::{Battle, BattleId, BattleStatus};
use shared::models::messages::ServerMessage;

use crate::dispatch::Dispatcher;

#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub from: String,
    pub sport: String,
}

#[derive(Default)]
struct LobbyState {
    battles: Vec<Battle>,
    invitations: Vec<Invitation>,
}

/// Dashboard view of open battles and pending invitations, kept current by
/// pushes. Any battle lifecycle push also asks the backend for a fresh
/// waiting list.
pub struct Lobby {
    dispatcher: Dispatcher,
    state: RwLock<LobbyState>,
}

impl Lobby {
    pub fn new(dispatcher: Dispatcher) -> Arc<Lobby> {
        Arc::new(Lobby {
            dispatcher,
            state: RwLock::new(LobbyState::default()),
        })
    }

    pub async fn waiting_battles(&self) -> Vec<Battle> {
        self.state.read().await.battles.clone()
    }

    pub async fn invitations(&self) -> Vec<Invitation> {
        self.state.read().await.invitations.clone()
    }

    /// Seeds the list, e.g. from the REST waiting-battles call.
    pub async fn set_waiting_battles(&self, battles: Vec<Battle>) {
        self.state.write().await.battles = battles;
    }

    pub async fn refresh(&self) -> bool {
        self.dispatcher.get_waiting_battles().await
    }

    pub async fn handle(&self, message: &ServerMessage) {
        match message {
            ServerMessage::WaitingBattles { battles } => {
                let waiting = battles
                    .iter()
                    .filter(|b| b.status == BattleStatus::Waiting)
                    .cloned()
                    .collect();
                self.state.write().await.battles = waiting;
                return;
            }
            ServerMessage::BattleCreated { battle } => {
                let mut state = self.state.write().await;
                if battle.status == BattleStatus::Waiting
                    && !state.battles.iter().any(|b| b.id == battle.id)
                {
                    state.battles.push(battle.clone());
                }
            }
            ServerMessage::BattleStarted { battle_id }
            | ServerMessage::BattleFinished { battle_id }
            | ServerMessage::BattleCancelled { battle_id } => {
                self.remove(battle_id).await;
            }
            ServerMessage::Invitation { from, sport } => {
                let mut state = self.state.write().await;
                state.invitations.retain(|i| &i.from != from);
                state.invitations.push(Invitation {
                    from: from.clone(),
                    sport: sport.clone(),
                });
                return;
            }
            ServerMessage::InvitationCancelled { from } => {
                self.state
                    .write()
                    .await
                    .invitations
                    .retain(|i| &i.from != from);
                return;
            }
            _ => return,
        }

        if message.affects_waiting_battles() {
            debug!("{} received, refreshing waiting battles", message.kind());
            self.refresh().await;
        }
    }

    async fn remove(&self, battle_id: &BattleId) {
        self.state
            .write()
            .await
            .battles
            .retain(|b| &b.id != battle_id);
    }

    pub fn spawn(self: &Arc<Self>, mut events: broadcast::Receiver<ServerMessage>) -> JoinHandle<()> {
        let lobby = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(message) => lobby.handle(&message).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Lobby lagged by {} pushes, refreshing", skipped);
                        lobby.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
