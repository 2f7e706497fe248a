use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared::config::ClientConfig;
use shared::models::messages::ServerMessage;
use shared::models::social::FriendRequestStatus;
use shared::models::user::User;

use crate::connection::Connection;
use crate::dispatch::Dispatcher;
use crate::errors::RealtimeError;
use crate::transport::Connector;

const EVENT_CAPACITY: usize = 256;

/// Everything tied to one signed-in user: the user record and the socket
/// opened for them. Created at sign-in and ended at sign-out; passed to
/// whatever needs it instead of living in a global.
///
/// Subscribers listen on the session rather than on a socket, so they keep
/// receiving pushes after a rename moves the session to a new socket.
pub struct Session {
    user: RwLock<User>,
    connection: RwLock<Arc<Connection>>,
    events: broadcast::Sender<ServerMessage>,
    forwarder: std::sync::Mutex<Option<JoinHandle<()>>>,
    connector: Arc<dyn Connector>,
    ws_base_url: String,
    reconnect_timeout: Duration,
}

impl Session {
    pub async fn start(
        user: User,
        config: &ClientConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Arc<Session>, RealtimeError> {
        let url = config.ws_url_for(&user.username);
        let connection = Connection::open(&url, connector.clone(), config.reconnect_timeout).await?;
        info!("Session started for {}", user.username);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session = Arc::new(Session {
            user: RwLock::new(user),
            connection: RwLock::new(connection.clone()),
            events,
            forwarder: std::sync::Mutex::new(None),
            connector,
            ws_base_url: config.ws_base_url.clone(),
            reconnect_timeout: config.reconnect_timeout,
        });
        session.forward(&connection);
        Ok(session)
    }

    /// Pipes pushes from `connection` into the session channel, replacing
    /// the previous socket's forwarder.
    fn forward(&self, connection: &Connection) {
        let mut incoming = connection.subscribe();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            loop {
                match incoming.recv().await {
                    Ok(message) => {
                        let _ = events.send(message);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session forwarder lagged, {} pushes skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        let previous = match self.forwarder.lock() {
            Ok(mut forwarder) => forwarder.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_forwarding(&self) {
        let handle = match self.forwarder.lock() {
            Ok(mut forwarder) => forwarder.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    pub async fn user(&self) -> User {
        self.user.read().await.clone()
    }

    pub async fn username(&self) -> String {
        self.user.read().await.username.clone()
    }

    pub async fn connection(&self) -> Arc<Connection> {
        self.connection.read().await.clone()
    }

    pub async fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.connection().await)
    }

    /// Pushes from whichever socket the session is on, across renames.
    pub async fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// Replaces the user after a local edit. A changed username moves the
    /// session onto a socket for the new name; if that socket cannot be
    /// opened the session keeps its old user and socket.
    pub async fn update_user(&self, user: User) -> Result<(), RealtimeError> {
        let renamed = self.user.read().await.username != user.username;
        if renamed {
            self.rename(&user.username).await?;
        }
        *self.user.write().await = user;
        Ok(())
    }

    async fn rename(&self, username: &str) -> Result<(), RealtimeError> {
        let url = format!("{}/{}", self.ws_base_url, username);
        let fresh = Connection::open(&url, self.connector.clone(), self.reconnect_timeout).await?;
        self.forward(&fresh);
        let old = std::mem::replace(&mut *self.connection.write().await, fresh);
        old.close().await;
        info!("Session moved to {}", url);
        Ok(())
    }

    /// Folds a push into the session user. Returns whether anything changed.
    pub async fn apply(&self, message: &ServerMessage) -> bool {
        let mut user = self.user.write().await;
        match message {
            ServerMessage::UserUpdated { user: updated } if updated.username == user.username => {
                *user = updated.clone();
                true
            }
            ServerMessage::FriendRequestUpdated { from, to, status } => {
                let me = user.username.clone();
                let (other, incoming) = if *to == me {
                    (from.as_str(), true)
                } else if *from == me {
                    (to.as_str(), false)
                } else {
                    return false;
                };
                match (status, incoming) {
                    (FriendRequestStatus::Pending, true) => user.add_friend_request(other),
                    (FriendRequestStatus::Accepted, _) => user.add_friend(other),
                    (FriendRequestStatus::Rejected | FriendRequestStatus::Cancelled, true) => {
                        user.drop_friend_request(other)
                    }
                    _ => return false,
                }
                debug!("Friend request {} -> {} is now {:?}", from, to, status);
                true
            }
            _ => false,
        }
    }

    /// Keeps the session user in step with pushes until the session is
    /// dropped.
    pub async fn spawn_user_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.subscribe().await;
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(message) => match session.upgrade() {
                        Some(session) => {
                            session.apply(&message).await;
                        }
                        None => return,
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("User sync lagged, {} pushes skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        })
    }

    pub async fn end(&self) {
        self.stop_forwarding();
        self.connection.read().await.close().await;
        info!("Session ended for {}", self.username().await);
    }
}
