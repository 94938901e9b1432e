//! External chat-completion strategy with retry and circuit breaker
//!
//! Any upstream problem (transport error, timeout, non-2xx status,
//! undecodable body, open breaker) degrades to [`FALLBACK_REPLY`]; the
//! caller never sees an error from [`ExternalCompletionStrategy::answer`].

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::llm_config::{LlmConfig, API_KEY_ENV};
use super::models::{AssistantReply, ConversationMessage};
use super::strategy::{AnswerInput, AnswerStrategy};
use super::tokens::{default_estimator, TokenEstimator};
use crate::error::{AssistantError, Result};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const FALLBACK_REPLY: &str =
    "I'm having trouble reaching the AI service right now. Please try again in a moment.";

pub const EMPTY_COMPLETION_REPLY: &str = "I could not generate a response right now.";

pub const MISSING_KEY_MESSAGE: &str =
    "OPENAI_API_KEY is not configured on the server. Add it to your environment to enable Ask AI.";

const SYSTEM_PROMPT: &str = "\
You are an assistant built into a todo application. The user's current todos are \
given to you as context. Use only those todos when you talk about specific tasks and \
never make up tasks that are not listed.

Your goals:
- Help the user understand, search and plan their work based on their todos.
- For \"what should I do next\" style questions, pick concrete todos and explain why.
- When the user refers to something vaguely, match it to the closest todos by title, description or priority.
- Be concise. Prefer short paragraphs and bullet points.
- You may suggest actions such as \"mark X done\" or \"raise the priority of Y\", but never claim that you changed any data.";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    fn metric_label(&self) -> &'static str {
        match self {
            CompletionError::CircuitOpen => "circuit_open",
            CompletionError::RequestFailed(_) => "request_failed",
            CompletionError::Timeout(_) => "timeout",
            CompletionError::UpstreamError(_) => "upstream_error",
            CompletionError::InvalidResponse(_) => "invalid_response",
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletionClient {
    http: Client,
    config: LlmConfig,
    breaker: CircuitBreaker,
}

impl ChatCompletionClient {
    pub fn new(config: LlmConfig) -> std::result::Result<Self, CompletionError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker_failures,
            reset_timeout: config.breaker_reset_timeout(),
        });

        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Send one system/user exchange; `Ok(None)` when the reply has no content
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> std::result::Result<Option<String>, CompletionError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            if !self.breaker.allow_request() {
                METRICS.completion_circuit_open.inc();
                return Err(CompletionError::CircuitOpen);
            }

            match self.call_api(system, user).await {
                Ok(content) => {
                    self.breaker.record_success();
                    METRICS.record_completion("success");
                    return Ok(content);
                }
                Err(e) => {
                    self.breaker.record_failure();
                    METRICS.record_completion(e.metric_label());

                    if attempt > self.config.max_retries {
                        error!("Completion failed after {} attempts: {}", attempt, e);
                        return Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Completion attempt {} failed: {}, retrying in {:?}",
                        attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn call_api(
        &self,
        system: &str,
        user: &str,
    ) -> std::result::Result<Option<String>, CompletionError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        let mut req = self.http.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key.expose_secret());
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(e.to_string())
            } else {
                CompletionError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::UpstreamError(format!(
                "Status {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.config.retry_backoff_ms;
        let exponent = (attempt.saturating_sub(1)).min(16) as u32;
        Duration::from_millis(base.saturating_mul(2u64.pow(exponent)))
    }
}

/// Render the user prompt for one question
pub fn build_user_prompt(
    user_id: Option<&str>,
    question: &str,
    context_text: &str,
    history: &[ConversationMessage],
) -> String {
    let context = if context_text.is_empty() {
        "No todos found."
    } else {
        context_text
    };

    let history_text = if history.is_empty() {
        "No previous messages.".to_string()
    } else {
        history
            .iter()
            .map(|m| format!("{}: {}", m.author.speaker(), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "User id: {}\n\n\
         Question:\n{}\n\n\
         Relevant todos from the user's list:\n{}\n\n\
         Recent conversation:\n{}\n\n\
         Treat the todos above as the only source of truth when answering. \
         If the user asks to find or show something, say which todos match and why. \
         If the question cannot be answered from these todos, say what is missing.",
        user_id.unwrap_or("anonymous"),
        question,
        context,
        history_text
    )
}

/// Strategy that asks an external chat-completion API
pub struct ExternalCompletionStrategy {
    client: ChatCompletionClient,
    estimator: Arc<dyn TokenEstimator>,
}

impl ExternalCompletionStrategy {
    pub fn new(config: LlmConfig) -> std::result::Result<Self, CompletionError> {
        Self::with_estimator(config, default_estimator())
    }

    pub fn with_estimator(
        config: LlmConfig,
        estimator: Arc<dyn TokenEstimator>,
    ) -> std::result::Result<Self, CompletionError> {
        Ok(Self {
            client: ChatCompletionClient::new(config)?,
            estimator,
        })
    }

    pub fn client(&self) -> &ChatCompletionClient {
        &self.client
    }
}

#[async_trait]
impl AnswerStrategy for ExternalCompletionStrategy {
    fn name(&self) -> &'static str {
        "external_completion"
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.client.config().has_api_key() {
            Ok(())
        } else {
            warn!("{} is not set; external completion unavailable", API_KEY_ENV);
            Err(AssistantError::Configuration(MISSING_KEY_MESSAGE.to_string()))
        }
    }

    async fn answer(&self, input: AnswerInput<'_>) -> AssistantReply {
        let turns = self.client.config().history_turns;
        let history = &input.recent_messages
            [input.recent_messages.len().saturating_sub(turns)..];

        let user_prompt = build_user_prompt(
            input.user_id,
            input.question,
            &input.ranked.context_text,
            history,
        );

        let prompt_tokens = self.estimator.estimate_batch(&[SYSTEM_PROMPT, user_prompt.as_str()]);
        METRICS.prompt_tokens.observe(prompt_tokens as f64);
        debug!(
            "Completion prompt: {} todos in context, {} history turns, ~{} tokens",
            input.ranked.len(),
            history.len(),
            prompt_tokens
        );

        match self.client.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(Some(content)) if !content.trim().is_empty() => {
                AssistantReply::text(content.trim())
            }
            Ok(_) => AssistantReply::text(EMPTY_COMPLETION_REPLY),
            Err(e) => {
                warn!("Completion unavailable, using fallback reply: {}", e);
                AssistantReply::text(FALLBACK_REPLY)
            }
        }
    }
}
