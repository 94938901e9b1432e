//! Ask AI calling boundary
//!
//! Two thin adapters over the ranker and the configured strategy: one for
//! caller-supplied todos, one that loads the user's todos from storage.

use super::config::AssistantConfig;
use super::models::{AskRequest, AssistantReply, ConversationMessage, Selection};
use super::ranker::RelevanceRanker;
use super::strategy::{AnswerInput, AnswerStrategy};
use crate::error::{AssistantError, Result};
use crate::metrics::METRICS;
use crate::todos::{Todo, TodoStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const MISSING_QUESTION_MESSAGE: &str = "Missing question in request body.";

pub struct AssistantService {
    store: Arc<dyn TodoStore>,
    strategy: Arc<dyn AnswerStrategy>,
    ranker: RelevanceRanker,
    history_window: usize,
}

impl AssistantService {
    pub fn new(
        store: Arc<dyn TodoStore>,
        strategy: Arc<dyn AnswerStrategy>,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            store,
            strategy,
            ranker: RelevanceRanker::new(config.ranker.clone()),
            history_window: config.history_window,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Fails when the configured strategy cannot answer at all
    pub fn ensure_ready(&self) -> Result<()> {
        self.strategy.ensure_configured()
    }

    /// Validate and answer one Ask AI request
    pub async fn ask(&self, request: AskRequest) -> Result<AssistantReply> {
        let start = Instant::now();
        let result = self.ask_inner(request).await;

        METRICS.record_ask(
            self.strategy.name(),
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        if let Err(e) = &result {
            warn!("Ask AI request failed: {}", e);
        }
        result
    }

    async fn ask_inner(&self, request: AskRequest) -> Result<AssistantReply> {
        self.ensure_ready()?;

        let question = request
            .question
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AssistantError::InvalidInput(MISSING_QUESTION_MESSAGE.to_string()))?;

        let messages = recent(&request.messages, self.history_window);
        let user_id = request.user_id.as_deref();

        info!(
            "Ask AI request: strategy={}, question_len={}, history={}, todos_supplied={}",
            self.strategy.name(),
            question.chars().count(),
            messages.len(),
            request.todos.is_some()
        );

        match request.todos {
            Some(todos) => Ok(self
                .answer_with_todos(user_id, &question, &todos, messages)
                .await),
            None => self.answer_for_user(user_id, &question, messages).await,
        }
    }

    /// Answer against todos supplied by the caller
    pub async fn answer_with_todos(
        &self,
        user_id: Option<&str>,
        question: &str,
        todos: &[Todo],
        messages: &[ConversationMessage],
    ) -> AssistantReply {
        let ranked = self.ranker.rank(todos, question);
        METRICS.record_ranking(selection_label(ranked.selection), ranked.len());

        let reply = self
            .strategy
            .answer(AnswerInput {
                user_id,
                question,
                todos,
                ranked: &ranked,
                recent_messages: messages,
            })
            .await;

        debug!(
            "Answered with {} ({} todos, {} matches)",
            self.strategy.name(),
            todos.len(),
            reply.match_count()
        );
        reply
    }

    /// Load the user's todos from storage, then answer
    pub async fn answer_for_user(
        &self,
        user_id: Option<&str>,
        question: &str,
        messages: &[ConversationMessage],
    ) -> Result<AssistantReply> {
        let todos = match user_id {
            Some(id) => self.load_all_todos(id).await?,
            None => Vec::new(),
        };
        Ok(self
            .answer_with_todos(user_id, question, &todos, messages)
            .await)
    }

    async fn load_all_todos(&self, user_id: &str) -> Result<Vec<Todo>> {
        let first = self.store.list_for_user(Some(user_id), 1, None).await?;
        let total_pages = first.total_pages();
        let mut todos = first.todos;

        for page in 2..=total_pages {
            let next = self.store.list_for_user(Some(user_id), page, None).await?;
            if next.todos.is_empty() {
                break;
            }
            todos.extend(next.todos);
        }

        debug!("Loaded {} todos over {} pages", todos.len(), total_pages);
        Ok(todos)
    }
}

fn recent(messages: &[ConversationMessage], window: usize) -> &[ConversationMessage] {
    &messages[messages.len().saturating_sub(window)..]
}

fn selection_label(selection: Selection) -> &'static str {
    match selection {
        Selection::Empty => "empty",
        Selection::Scored => "scored",
        Selection::RecencyFallback => "recency_fallback",
    }
}
