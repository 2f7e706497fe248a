use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use shared::models::auth::responses::TokenClaims;
use shared::repositories::store_repository::MemoryStore;
use shared::services::preferences_service::PreferencesService;

pub const TEST_PASSWORD: &str = "correct-horse-9";

/// Logs to the test harness output; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A token for `username` expiring `ttl_secs` from now (negative for an
/// already expired one). The client never checks the signature.
pub fn token_for(username: &str, ttl_secs: i64) -> String {
    let claims = TokenClaims {
        sub: username.to_string(),
        exp: (Utc::now().timestamp() + ttl_secs).max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("Failed to encode test token")
}

pub fn user_json(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "wins": 3,
        "total_battles": 5,
        "winrate": 60.0,
        "friends": ["kaka"],
    })
}

pub fn auth_json(username: &str, token: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user_json(username),
    })
}

pub fn memory_preferences() -> PreferencesService {
    PreferencesService::new(Arc::new(MemoryStore::new()))
}
