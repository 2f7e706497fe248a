use std::fmt;

use crate::repositories::errors::api_errors::ApiError;
use crate::repositories::errors::store_errors::StoreError;
use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum UserServiceError {
    ValidationError(FieldErrors),
    UsernameTaken,
    UserNotFound,
    RepositoryError(ApiError),
    StoreError(StoreError),
}

impl fmt::Display for UserServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserServiceError::ValidationError(errors) => write!(f, "Validation error: {}", errors),
            UserServiceError::UsernameTaken => write!(f, "Username is already taken"),
            UserServiceError::UserNotFound => write!(f, "User not found"),
            UserServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            UserServiceError::StoreError(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for UserServiceError {}

impl From<ApiError> for UserServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => UserServiceError::UserNotFound,
            ApiError::Validation(errors) => UserServiceError::ValidationError(errors),
            ApiError::Conflict(_) => UserServiceError::UsernameTaken,
            other => UserServiceError::RepositoryError(other),
        }
    }
}

impl From<StoreError> for UserServiceError {
    fn from(err: StoreError) -> Self {
        UserServiceError::StoreError(err)
    }
}
