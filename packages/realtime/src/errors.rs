use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeError {
    ConnectFailed(String),
    ReconnectTimedOut,
    NotConnected,
    Serialization(String),
    UnknownEnvelope(String),
    NoSession,
}

impl fmt::Display for RealtimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RealtimeError::ConnectFailed(msg) => write!(f, "Failed to connect: {}", msg),
            RealtimeError::ReconnectTimedOut => write!(f, "Reconnect attempt timed out"),
            RealtimeError::NotConnected => write!(f, "Socket is not open"),
            RealtimeError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RealtimeError::UnknownEnvelope(kind) => write!(f, "Unknown message type: {}", kind),
            RealtimeError::NoSession => write!(f, "No active session"),
        }
    }
}

impl std::error::Error for RealtimeError {}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::Serialization(err.to_string())
    }
}
