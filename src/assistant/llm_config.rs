//! Configuration for the external chat-completion strategy

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the completion API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat-completion client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Bearer token; read from `OPENAI_API_KEY` when not configured
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Retries after the first failed attempt
    #[serde(default)]
    pub max_retries: usize,

    /// Base backoff in milliseconds, doubled per retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Consecutive failures before the breaker opens
    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    /// Seconds an open breaker waits before a probe
    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,

    /// Conversation turns replayed into the prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_temperature() -> f32 { 0.3 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_retry_backoff_ms() -> u64 { 200 }
fn default_breaker_failures() -> usize { 5 }
fn default_breaker_reset() -> u64 { 30 }
fn default_history_turns() -> usize { 6 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            api_key: None,
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
            history_turns: default_history_turns(),
        }
    }
}

impl LlmConfig {
    /// Fill the API key from `OPENAI_API_KEY` unless one is already set
    pub fn from_env(self) -> Self {
        if self.api_key.is_some() {
            return self;
        }
        let key = std::env::var(API_KEY_ENV).ok();
        self.with_api_key(key)
    }

    /// Blank keys count as missing
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::new);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }
}
