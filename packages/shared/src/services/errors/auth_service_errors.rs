use std::fmt;

use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::errors::store_errors::StoreError;
use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum AuthServiceError {
    ValidationError(FieldErrors),
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    AccountExists(String),
    ApiError(ApiError),
    StoreError(StoreError),
}

impl fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthServiceError::ValidationError(errors) => write!(f, "Validation error: {}", errors),
            AuthServiceError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthServiceError::InvalidToken => write!(f, "Invalid access token"),
            AuthServiceError::ExpiredToken => write!(f, "Access token has expired"),
            AuthServiceError::AccountExists(msg) => write!(f, "Account already exists: {}", msg),
            AuthServiceError::ApiError(err) => write!(f, "API error: {}", err),
            AuthServiceError::StoreError(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for AuthServiceError {}

impl From<ApiError> for AuthServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => AuthServiceError::InvalidCredentials,
            ApiError::Validation(errors) => AuthServiceError::ValidationError(errors),
            ApiError::Conflict(msg) => AuthServiceError::AccountExists(msg),
            other => AuthServiceError::ApiError(other),
        }
    }
}

impl From<StoreError> for AuthServiceError {
    fn from(err: StoreError) -> Self {
        AuthServiceError::StoreError(err)
    }
}
