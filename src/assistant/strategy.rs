//! Pluggable answer strategies

use super::completion::ExternalCompletionStrategy;
use super::composer::AnswerComposer;
use super::config::AssistantConfig;
use super::llm_config::LlmConfig;
use super::models::{AssistantReply, ConversationMessage, RankedContext};
use super::ranker::RelevanceRanker;
use crate::error::{AssistantError, Result};
use crate::todos::Todo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Everything a strategy may use to answer one question
#[derive(Debug, Clone, Copy)]
pub struct AnswerInput<'a> {
    pub user_id: Option<&'a str>,
    pub question: &'a str,
    /// The user's full collection
    pub todos: &'a [Todo],
    /// Context ranked from `todos` for `question`
    pub ranked: &'a RankedContext,
    pub recent_messages: &'a [ConversationMessage],
}

/// Turns a question and ranked context into a reply
#[async_trait]
pub trait AnswerStrategy: Send + Sync {
    /// Label used in logs and metrics
    fn name(&self) -> &'static str;

    /// Fails when the strategy cannot run with the current configuration
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Never fails: upstream problems resolve to a reply string
    async fn answer(&self, input: AnswerInput<'_>) -> AssistantReply;
}

/// Strategy selected by `assistant.strategy`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    RuleBased,
    ExternalCompletion,
}

/// Deterministic strategy backed by [`AnswerComposer`]
#[derive(Debug, Clone, Default)]
pub struct RuleBasedStrategy {
    composer: AnswerComposer,
}

impl RuleBasedStrategy {
    pub fn new(composer: AnswerComposer) -> Self {
        Self { composer }
    }

    pub fn composer(&self) -> &AnswerComposer {
        &self.composer
    }
}

#[async_trait]
impl AnswerStrategy for RuleBasedStrategy {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn answer(&self, input: AnswerInput<'_>) -> AssistantReply {
        self.composer.compose_with_context(
            input.question,
            input.todos,
            input.ranked,
            input.recent_messages,
        )
    }
}

/// Build the configured strategy
pub fn build_strategy(
    config: &AssistantConfig,
    llm: &LlmConfig,
) -> Result<Arc<dyn AnswerStrategy>> {
    let strategy: Arc<dyn AnswerStrategy> = match config.strategy {
        StrategyKind::RuleBased => Arc::new(RuleBasedStrategy::new(AnswerComposer::new(
            config.composer.clone(),
            RelevanceRanker::new(config.ranker.clone()),
        ))),
        StrategyKind::ExternalCompletion => Arc::new(
            ExternalCompletionStrategy::new(llm.clone())
                .map_err(|e| AssistantError::Configuration(e.to_string()))?,
        ),
    };

    info!("Answer strategy: {}", strategy.name());
    Ok(strategy)
}
