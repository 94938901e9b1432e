//! API error body and mapping from crate errors

use crate::error::AssistantError;
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }
}

/// Standard error codes
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Status and body for a crate error; internal details stay in the logs
pub fn error_response(err: AssistantError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &err {
        AssistantError::InvalidInput(_) => (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST),
        AssistantError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
        AssistantError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::CONFIGURATION_ERROR,
        ),
        AssistantError::Storage(_) => (StatusCode::BAD_GATEWAY, error_codes::STORAGE_UNAVAILABLE),
        AssistantError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
        }
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    }

    (status, Json(ApiError::new(code, err.public_message())))
}
