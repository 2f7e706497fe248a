use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::{info, warn};

use crate::models::auth::requests::SignInRequest;
use crate::models::auth::responses::{AuthResponse, TokenClaims};
use crate::models::user::User;
use crate::repositories::http::ApiClient;
use crate::repositories::user_repository::UserRepository;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::preferences_service::PreferencesService;
use crate::validation::{Field, FieldErrors, SignUpForm};

pub struct AuthService {
    repository: Arc<dyn UserRepository>,
    client: ApiClient,
    preferences: PreferencesService,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        client: ApiClient,
        preferences: PreferencesService,
    ) -> Self {
        AuthService {
            repository,
            client,
            preferences,
        }
    }

    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<User, AuthServiceError> {
        let identifier = identifier.trim();
        let mut errors = FieldErrors::new();
        if identifier.is_empty() {
            errors.add(Field::Username, "Username or email is required");
        }
        if password.is_empty() {
            errors.add(Field::Password, "Password is required");
        }
        errors
            .into_result()
            .map_err(AuthServiceError::ValidationError)?;

        let request = SignInRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let response = self.repository.sign_in(&request).await?;
        self.establish(response).await
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<User, AuthServiceError> {
        form.validate().map_err(AuthServiceError::ValidationError)?;
        let response = self.repository.sign_up(&form.to_request()).await?;
        self.establish(response).await
    }

    /// Picks up a previous session from the client store.
    ///
    /// Returns `Ok(None)` when nobody is signed in. An expired or unreadable
    /// token clears the stored session before the error is returned.
    pub async fn restore(&self) -> Result<Option<User>, AuthServiceError> {
        let Some(token) = self.preferences.access_token().await? else {
            return Ok(None);
        };

        let claims = match token_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Discarding stored session: {}", e);
                self.preferences.clear_session().await?;
                return Err(e);
            }
        };
        if is_expired(&claims, Utc::now().timestamp()) {
            info!("Stored session for {} has expired", claims.sub);
            self.preferences.clear_session().await?;
            return Err(AuthServiceError::ExpiredToken);
        }

        self.client.set_token(Some(token)).await;
        let user = match self.preferences.cached_user().await? {
            Some(user) => user,
            None => {
                let user = self.repository.get_user(&claims.sub).await?;
                self.preferences.save_user(&user).await?;
                user
            }
        };
        info!("Restored session for {}", user.username);
        Ok(Some(user))
    }

    pub async fn sign_out(&self) -> Result<(), AuthServiceError> {
        self.client.set_token(None).await;
        self.preferences.clear_session().await?;
        info!("Signed out");
        Ok(())
    }

    async fn establish(&self, response: AuthResponse) -> Result<User, AuthServiceError> {
        self.client
            .set_token(Some(response.access_token.clone()))
            .await;
        self.preferences
            .save_access_token(&response.access_token)
            .await?;
        self.preferences.save_user(&response.user).await?;
        info!("Signed in as {}", response.user.username);
        Ok(response.user)
    }
}

/// Reads the claims of an access token. The signature belongs to the backend
/// and is not checked here.
pub fn token_claims(token: &str) -> Result<TokenClaims, AuthServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthServiceError::InvalidToken)
}

pub fn is_expired(claims: &TokenClaims, now: i64) -> bool {
    (claims.exp as i64) <= now
}
