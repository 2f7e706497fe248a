pub mod connection;
pub mod dispatch;
pub mod errors;
pub mod lobby;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
