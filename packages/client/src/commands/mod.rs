pub mod account;
pub mod dashboard;
pub mod forum;
pub mod social;
