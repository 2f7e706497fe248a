use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use shared::models::messages::{ClientMessage, ServerMessage};
use shared::models::user::User;

use crate::errors::RealtimeError;
use crate::transport::{Connector, Link};

const EVENT_CAPACITY: usize = 256;

/// Envelope types accepted by [`Connection::send_message`].
pub const USER_UPDATE: &str = "user_update";
pub const GET_EMAIL: &str = "get_email";

/// The one socket of a session.
///
/// Inbound frames are decoded once and fanned out to every subscriber.
/// A send on a closed socket makes a single reconnect attempt bounded by
/// the reconnect timeout, then gives up. Whether the link is up is
/// published on a `watch` channel so long-lived listeners notice a drop
/// without having to send.
pub struct Connection {
    url: String,
    connector: Arc<dyn Connector>,
    reconnect_timeout: Duration,
    writer: Mutex<Option<tokio::sync::mpsc::Sender<String>>>,
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ServerMessage>,
    link: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Connection {
    pub async fn open(
        url: &str,
        connector: Arc<dyn Connector>,
        reconnect_timeout: Duration,
    ) -> Result<Arc<Connection>, RealtimeError> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (link, _) = watch::channel(false);
        let connection = Arc::new(Connection {
            url: url.to_string(),
            connector,
            reconnect_timeout,
            writer: Mutex::new(None),
            reader: std::sync::Mutex::new(None),
            events,
            link,
            closed: AtomicBool::new(false),
        });
        let link = connection.connector.connect(url).await?;
        connection.attach(link).await;
        Ok(connection)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn attach(&self, link: Link) {
        let Link {
            outgoing,
            mut incoming,
        } = link;
        *self.writer.lock().await = Some(outgoing);
        self.link.send_replace(true);

        let events = self.events.clone();
        let link_state = self.link.clone();
        let url = self.url.clone();
        let handle = tokio::spawn(async move {
            while let Some(text) = incoming.recv().await {
                match ServerMessage::decode(&text) {
                    Ok(ServerMessage::Unknown) => debug!("Ignoring unknown frame: {}", text),
                    Ok(message) => {
                        debug!("Received {}", message.kind());
                        // No subscribers is fine; the frame is simply dropped.
                        let _ = events.send(message);
                    }
                    Err(e) => warn!("Malformed frame on {}: {}", url, e),
                }
            }
            link_state.send_replace(false);
            debug!("Reader for {} finished", url);
        });

        let previous = match self.reader.lock() {
            Ok(mut reader) => reader.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub async fn is_open(&self) -> bool {
        matches!(&*self.writer.lock().await, Some(writer) if !writer.is_closed())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// `true` while a link is attached and its reader is running.
    pub fn link_state(&self) -> watch::Receiver<bool> {
        self.link.subscribe()
    }

    /// Replaces the current link with a fresh one.
    pub async fn reconnect(&self) -> Result<(), RealtimeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        info!("Reconnecting to {}", self.url);
        let link = timeout(self.reconnect_timeout, self.connector.connect(&self.url))
            .await
            .map_err(|_| RealtimeError::ReconnectTimedOut)??;
        self.attach(link).await;
        Ok(())
    }

    pub async fn send(&self, message: ClientMessage) -> Result<(), RealtimeError> {
        let text = message.to_json()?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        if !self.is_open().await {
            warn!(
                "Socket closed before sending {}, reconnecting once",
                message.kind()
            );
            self.reconnect().await?;
        }
        self.write(text).await?;
        debug!("Sent {}", message.kind());
        Ok(())
    }

    async fn write(&self, text: String) -> Result<(), RealtimeError> {
        let writer = self.writer.lock().await.clone();
        match writer {
            Some(writer) => writer
                .send(text)
                .await
                .map_err(|_| RealtimeError::NotConnected),
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Sends one of the predefined user envelopes. Returns whether the frame
    /// was handed to the socket; unknown types are refused.
    pub async fn send_message(&self, user: &User, kind: &str) -> bool {
        let message = match kind {
            USER_UPDATE => ClientMessage::UserUpdate { user: user.clone() },
            GET_EMAIL => ClientMessage::GetEmail {
                username: user.username.clone(),
            },
            other => {
                warn!("{}", RealtimeError::UnknownEnvelope(other.to_string()));
                return false;
            }
        };
        match self.send(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping {} for {}: {}", kind, user.username, e);
                false
            }
        }
    }

    /// Closes for good; later sends fail without reconnecting.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.writer.lock().await.take();
        let handle = match self.reader.lock() {
            Ok(mut reader) => reader.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.link.send_replace(false);
        info!("Closed connection to {}", self.url);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }
    }
}
