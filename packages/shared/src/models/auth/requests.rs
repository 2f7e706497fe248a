use serde::{Deserialize, Serialize};


/// Sign-in accepts either a username or an email as identifier.
#[derive(Clone, Deserialize, Serialize)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

impl SignInRequest {
    pub fn is_email(&self) -> bool {
        self.identifier.contains('@')
    }
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
