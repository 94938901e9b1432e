//! HTTP surface

pub mod health;
pub mod middleware;
pub mod models;
pub mod routes;

pub use models::{error_codes, error_response, ApiError};
pub use routes::{build_ask_routes, build_router, build_todo_routes};
