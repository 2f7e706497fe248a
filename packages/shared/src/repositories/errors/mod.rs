pub mod api_errors;
pub mod store_errors;
