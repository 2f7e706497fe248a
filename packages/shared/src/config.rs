use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

pub const API_URL_VAR: &str = "FANBATTLE_API_URL";
pub const WS_URL_VAR: &str = "FANBATTLE_WS_URL";
pub const STATE_DIR_VAR: &str = "FANBATTLE_STATE_DIR";
pub const LOG_LEVEL_VAR: &str = "FANBATTLE_LOG_LEVEL";
pub const RECONNECT_TIMEOUT_VAR: &str = "FANBATTLE_RECONNECT_TIMEOUT_MS";

const DEFAULT_RECONNECT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Client configuration shared by the REST repositories, the realtime
/// connection and the battle flow.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for every REST resource.
    pub api_base_url: String,
    /// Base URL for the realtime socket; the username is appended per session.
    pub ws_base_url: String,
    /// Directory holding the persisted client store.
    pub state_dir: PathBuf,
    /// How long a send may spend on its single reconnect attempt.
    pub reconnect_timeout: Duration,
    pub log_level: Level,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl ClientConfig {
    /// Local backend on the default development port.
    pub fn development() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            ws_base_url: "ws://127.0.0.1:8000/ws".to_string(),
            state_dir: PathBuf::from(".fanbattle"),
            reconnect_timeout: DEFAULT_RECONNECT_TIMEOUT,
            log_level: Level::DEBUG,
        }
    }

    pub fn production() -> Self {
        Self {
            api_base_url: "https://api.fanbattle.example".to_string(),
            ws_base_url: "wss://api.fanbattle.example/ws".to_string(),
            state_dir: default_state_dir(),
            reconnect_timeout: DEFAULT_RECONNECT_TIMEOUT,
            log_level: Level::INFO,
        }
    }

    /// Development defaults overridden by any `FANBATTLE_*` variables that are set.
    pub fn from_env() -> Self {
        Self::development().with_env_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from a variable lookup. Unparseable values keep the
    /// current setting.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_VAR) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(WS_URL_VAR) {
            self.ws_base_url = url;
        }
        if let Some(dir) = lookup(STATE_DIR_VAR) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_VAR).and_then(|l| l.parse::<Level>().ok()) {
            self.log_level = level;
        }
        if let Some(ms) = lookup(RECONNECT_TIMEOUT_VAR).and_then(|v| v.parse::<u64>().ok()) {
            self.reconnect_timeout = Duration::from_millis(ms);
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.ws_base_url = self.ws_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Socket URL for a signed-in user.
    pub fn ws_url_for(&self, username: &str) -> String {
        format!("{}/{}", self.ws_base_url, username)
    }

    pub fn store_path(&self) -> PathBuf {
        self.state_dir.join("store.json")
    }
}

fn default_state_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".fanbattle"),
        Err(_) => PathBuf::from(".fanbattle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = ClientConfig::development();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.reconnect_timeout, Duration::from_millis(3000));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_env_overrides_applied() {
        let config = ClientConfig::development().with_env_overrides(lookup_from(&[
            (API_URL_VAR, "https://api.example.com/"),
            (WS_URL_VAR, "wss://ws.example.com/ws/"),
            (STATE_DIR_VAR, "/tmp/fanbattle"),
            (LOG_LEVEL_VAR, "warn"),
            (RECONNECT_TIMEOUT_VAR, "1500"),
        ]));

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.ws_base_url, "wss://ws.example.com/ws");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/fanbattle"));
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.reconnect_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let config = ClientConfig::development().with_env_overrides(lookup_from(&[
            (LOG_LEVEL_VAR, "chatty"),
            (RECONNECT_TIMEOUT_VAR, "soon"),
        ]));

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.reconnect_timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_ws_url_for_user() {
        let config = ClientConfig::development();
        assert_eq!(config.ws_url_for("messi10"), "ws://127.0.0.1:8000/ws/messi10");
    }

    #[test]
    fn test_store_path_inside_state_dir() {
        let mut config = ClientConfig::development();
        config.state_dir = PathBuf::from("/var/lib/fanbattle");
        assert_eq!(
            config.store_path(),
            PathBuf::from("/var/lib/fanbattle/store.json")
        );
    }
}
