pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod username;
pub mod validation;
