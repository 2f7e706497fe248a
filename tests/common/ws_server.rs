use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

const ACCEPT_WAIT: Duration = Duration::from_secs(5);

/// Local WebSocket backend. Every accepted socket is handed to the test as a
/// [`ServerConn`] together with the path it was opened on.
pub struct TestWsServer {
    addr: SocketAddr,
    accepted: mpsc::UnboundedReceiver<ServerConn>,
    listener: JoinHandle<()>,
}

pub struct ServerConn {
    pub path: String,
    ws: WebSocketStream<TcpStream>,
}

impl TestWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test socket");
        let addr = listener.local_addr().expect("No local address");
        let (tx, accepted) = mpsc::unbounded_channel();

        let listener = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let mut path = String::new();
                let callback = |request: &Request, response: Response| {
                    path = request.uri().path().to_string();
                    Ok::<Response, ErrorResponse>(response)
                };
                let handshake = accept_hdr_async(stream, callback).await;
                match handshake {
                    Ok(ws) => {
                        if tx.send(ServerConn { path, ws }).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("Test handshake failed: {}", e),
                }
            }
        });

        TestWsServer {
            addr,
            accepted,
            listener,
        }
    }

    /// Base URL to hand to the client config; the username is appended.
    pub fn base_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn accept(&mut self) -> ServerConn {
        self.try_accept(ACCEPT_WAIT)
            .await
            .expect("No client connected in time")
    }

    pub async fn try_accept(&mut self, wait: Duration) -> Option<ServerConn> {
        timeout(wait, self.accepted.recv()).await.ok().flatten()
    }

    /// Stops accepting; later connects are refused.
    pub fn shutdown(&self) {
        self.listener.abort();
    }
}

impl ServerConn {
    pub async fn send_json(&mut self, value: &Value) {
        self.ws
            .send(Message::Text(value.to_string()))
            .await
            .expect("Failed to push frame");
    }

    /// Next JSON frame from the client, or `None` once it hangs up.
    pub async fn next_json(&mut self) -> Option<Value> {
        loop {
            match timeout(ACCEPT_WAIT, self.ws.next()).await.ok()?? {
                Ok(Message::Text(text)) => return serde_json::from_str(&text).ok(),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Skips frames until one of the given `type` arrives.
    pub async fn next_of_type(&mut self, kind: &str) -> Option<Value> {
        while let Some(frame) = self.next_json().await {
            if frame["type"] == kind {
                return Some(frame);
            }
        }
        None
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
