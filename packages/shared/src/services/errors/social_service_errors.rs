use std::fmt;

use crate::repositories::errors::api_errors::ApiError;

#[derive(Debug)]
pub enum SocialServiceError {
    ValidationError(String),
    NotFriends(String),
    ApiError(ApiError),
}

impl fmt::Display for SocialServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SocialServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            SocialServiceError::NotFriends(name) => write!(f, "{} is not in your friends list", name),
            SocialServiceError::ApiError(err) => write!(f, "API error: {}", err),
        }
    }
}

impl std::error::Error for SocialServiceError {}

impl From<ApiError> for SocialServiceError {
    fn from(err: ApiError) -> Self {
        SocialServiceError::ApiError(err)
    }
}
