//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by the storage collaborator and the assistant boundary
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssistantError {
    /// Message safe to show to an end user
    pub fn public_message(&self) -> String {
        match self {
            AssistantError::InvalidInput(msg) | AssistantError::Configuration(msg) => msg.clone(),
            AssistantError::NotFound(id) => format!("Todo not found: {}", id),
            AssistantError::Storage(_) => "Todo storage is unavailable right now.".to_string(),
            AssistantError::Internal(_) => {
                "Unexpected error while handling Ask AI request.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
