pub mod auth_service;
pub mod battle_service;
pub mod chat_service;
pub mod errors;
pub mod forum_service;
pub mod friend_service;
pub mod preferences_service;
pub mod user_service;
