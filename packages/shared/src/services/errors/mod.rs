pub mod auth_service_errors;
pub mod forum_service_errors;
pub mod social_service_errors;
pub mod user_service_errors;
