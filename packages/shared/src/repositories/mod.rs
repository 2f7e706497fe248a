pub mod battle_repository;
pub mod errors;
pub mod forum_repository;
pub mod http;
pub mod social_repository;
pub mod store_repository;
pub mod user_repository;
