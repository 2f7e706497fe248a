use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum ApiError {
    Network(String),
    Unauthorized,
    NotFound,
    Conflict(String),
    Validation(FieldErrors),
    Status { code: u16, body: String },
    Serialization(String),
}

impl ApiError {
    /// True for failures where the request may not have reached the backend.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Unauthorized => write!(f, "Not authorized"),
            ApiError::NotFound => write!(f, "Resource not found"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Validation(errors) => write!(f, "Validation error: {}", errors),
            ApiError::Status { code, body } => write!(f, "HTTP {}: {}", code, body),
            ApiError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Serialization(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
