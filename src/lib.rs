//! Todo service with an "Ask AI" assistant
//!
//! The assistant ranks a user's todos against a free-text question and
//! answers either with deterministic rule-based replies or through an
//! external chat-completion API.

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod metrics;
pub mod todos;

pub use error::{AssistantError, Result};
