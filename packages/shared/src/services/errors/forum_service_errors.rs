use std::fmt;

use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::errors::store_errors::StoreError;

#[derive(Debug)]
pub enum ForumServiceError {
    ValidationError(String),
    NotLoaded(i64),
    ApiError(ApiError),
    StoreError(StoreError),
}

impl fmt::Display for ForumServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ForumServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ForumServiceError::NotLoaded(id) => write!(f, "Item {} is not loaded", id),
            ForumServiceError::ApiError(err) => write!(f, "API error: {}", err),
            ForumServiceError::StoreError(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for ForumServiceError {}

impl From<ApiError> for ForumServiceError {
    fn from(err: ApiError) -> Self {
        ForumServiceError::ApiError(err)
    }
}

impl From<StoreError> for ForumServiceError {
    fn from(err: StoreError) -> Self {
        ForumServiceError::StoreError(err)
    }
}
