//! In-process connector for tests: each connect hands back a link whose far
//! end is a [`FakeServer`] the test drives directly.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use crate::errors::RealtimeError;
use crate::transport::{Connector, Link};

#[derive(Default)]
struct FakeState {
    servers: Vec<Option<FakeServer>>,
    urls: Vec<String>,
    refuse: bool,
    stall: bool,
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the server end of the `index`-th connection.
    ///
    /// # Panics
    ///
    /// If that connection was never made or its server was already taken.
    pub async fn server(&self, index: usize) -> FakeServer {
        self.state
            .lock()
            .await
            .servers
            .get_mut(index)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("no server for connection {}", index))
    }

    pub async fn connect_count(&self) -> usize {
        self.state.lock().await.servers.len()
    }

    pub async fn urls(&self) -> Vec<String> {
        self.state.lock().await.urls.clone()
    }

    /// Later connects fail immediately.
    pub async fn refuse_connections(&self, refuse: bool) {
        self.state.lock().await.refuse = refuse;
    }

    /// Later connects never complete.
    pub async fn stall_connections(&self, stall: bool) {
        self.state.lock().await.stall = stall;
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Link, RealtimeError> {
        let stall = {
            let mut state = self.state.lock().await;
            state.urls.push(url.to_string());
            if state.refuse {
                state.servers.push(None);
                return Err(RealtimeError::ConnectFailed("connection refused".to_string()));
            }
            state.stall
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let (link, frames, pushes) = Link::pair();
        self.state.lock().await.servers.push(Some(FakeServer { frames, pushes }));
        Ok(link)
    }
}

pub struct FakeServer {
    frames: mpsc::Receiver<String>,
    pushes: mpsc::Sender<String>,
}

impl FakeServer {
    pub async fn push(&self, message: &Value) {
        self.push_raw(&message.to_string()).await;
    }

    pub async fn push_raw(&self, text: &str) {
        // A closed client side just means the frame is lost.
        let _ = self.pushes.send(text.to_string()).await;
    }

    /// Next frame the client sent, or `None` once the client side is gone.
    pub async fn next_frame(&mut self) -> Option<Value> {
        let text = self.frames.recv().await?;
        serde_json::from_str(&text).ok()
    }

    pub fn try_next_frame(&mut self) -> Option<Value> {
        let text = self.frames.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Skips frames until one with the given `type` arrives.
    pub async fn frame_of_type(&mut self, kind: &str) -> Option<Value> {
        while let Some(frame) = self.next_frame().await {
            if frame["type"] == kind {
                return Some(frame);
            }
        }
        None
    }

    /// Every frame already sent, without waiting.
    pub fn drain(&mut self) -> Vec<Value> {
        std::iter::from_fn(|| self.try_next_frame()).collect()
    }

    /// Drops both ends, as a server going away would.
    pub fn disconnect(self) {}
}
