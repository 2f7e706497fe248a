pub mod auth;
pub mod battle;
pub mod forum;
pub mod messages;
pub mod preferences;
pub mod question;
pub mod social;
pub mod user;
