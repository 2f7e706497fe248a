use serde::{Deserialize, Serialize};

use crate::models::user::User;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: User,
}

fn bearer() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenClaims {
    pub sub: String, // subject (username)
    pub exp: usize,  // expiration time
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
