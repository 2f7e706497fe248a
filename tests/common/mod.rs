pub mod api_helpers;
pub mod utils;
pub mod ws_server;
