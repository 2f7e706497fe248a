//! Socket plumbing. A connector turns a URL into a [`Link`]: a pair of text
//! channels whose far ends are pumped to and from the actual socket by a
//! background task. The link is closed once either channel reports closed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::errors::RealtimeError;

const LINK_BUFFER: usize = 64;

pub struct Link {
    pub outgoing: mpsc::Sender<String>,
    pub incoming: mpsc::Receiver<String>,
}

impl Link {
    /// Builds a link plus the opposite ends, for connectors that pump frames
    /// themselves.
    pub fn pair() -> (Link, mpsc::Receiver<String>, mpsc::Sender<String>) {
        let (out_tx, out_rx) = mpsc::channel(LINK_BUFFER);
        let (in_tx, in_rx) = mpsc::channel(LINK_BUFFER);
        (
            Link {
                outgoing: out_tx,
                incoming: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Link, RealtimeError>;
}

/// WebSocket connector over `tokio-tungstenite`.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Link, RealtimeError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| RealtimeError::ConnectFailed(e.to_string()))?;
        info!("WebSocket connected to {}", url);

        let (link, mut out_rx, in_tx) = Link::pair();
        let (mut sink, mut stream) = ws_stream.split();
        let url = url.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = out_rx.recv() => match outgoing {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                error!("Failed to send frame: {}", e);
                                break;
                            }
                        }
                        None => {
                            debug!("Link dropped, closing {}", url);
                            let _ = sink.close().await;
                            break;
                        }
                    },
                    incoming = stream.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if in_tx.send(text).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = sink.send(Message::Pong(data)).await {
                                warn!("Failed to answer ping: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed {}", url);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("WebSocket error on {}: {}", url, e);
                            break;
                        }
                    },
                }
            }
        });

        Ok(link)
    }
}
