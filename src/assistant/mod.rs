//! Ask AI: relevance ranking and answer composition over a user's todos
//!
//! - [`ranker`] picks and renders the todos relevant to a question
//! - [`composer`] builds deterministic rule-based replies
//! - [`completion`] asks an external chat-completion API instead
//! - [`service`] is the calling boundary used by the HTTP handler

pub mod circuit_breaker;
pub mod completion;
pub mod composer;
pub mod config;
pub mod handlers;
pub mod llm_config;
pub mod models;
pub mod ranker;
pub mod service;
pub mod strategy;
pub mod text;
pub mod tokens;

pub use completion::{ChatCompletionClient, CompletionError, ExternalCompletionStrategy};
pub use composer::{AnswerComposer, ComposerConfig};
pub use config::AssistantConfig;
pub use handlers::{ask_ai, AskState};
pub use llm_config::LlmConfig;
pub use models::{
    AskRequest, AssistantReply, ConversationMessage, MessageAuthor, RankedContext, RankedTodo,
    Selection, TodoMatch,
};
pub use ranker::{RankerConfig, RelevanceRanker};
pub use service::AssistantService;
pub use strategy::{build_strategy, AnswerInput, AnswerStrategy, RuleBasedStrategy, StrategyKind};
