//! Lexical relevance ranking of a user's todos against a question
//!
//! Scoring is deliberately simple and deterministic:
//! - `keyword_weight` for every question keyword found in title/description
//! - `pending_bonus` if the todo is not completed
//!
//! Ties are broken by newest `created_at`. When nothing scores, the most
//! recently created todos are used so the context is never empty.

use super::models::{RankedContext, RankedTodo, Selection};
use super::text;
use crate::todos::Todo;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Context text when the user has no todos at all
pub const EMPTY_CONTEXT_TEXT: &str = "User has no todos yet.";

/// Ranking weights and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Score added per matched keyword
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: u32,

    /// Score added to todos that are not completed
    #[serde(default = "default_pending_bonus")]
    pub pending_bonus: u32,

    /// Shorter question tokens are treated as noise
    #[serde(default = "default_min_keyword_chars")]
    pub min_keyword_chars: usize,

    /// Upper bound on todos placed in the context
    #[serde(default = "default_max_context_todos")]
    pub max_context_todos: usize,
}

fn default_keyword_weight() -> u32 { 2 }
fn default_pending_bonus() -> u32 { 1 }
fn default_min_keyword_chars() -> usize { 3 }
fn default_max_context_todos() -> usize { 12 }

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            keyword_weight: default_keyword_weight(),
            pending_bonus: default_pending_bonus(),
            min_keyword_chars: default_min_keyword_chars(),
            max_context_todos: default_max_context_todos(),
        }
    }
}

/// Pure ranker; holds only its configuration
#[derive(Debug, Clone, Default)]
pub struct RelevanceRanker {
    config: RankerConfig,
}

impl RelevanceRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Score one todo, returning `(score, keyword_hits)`
    pub fn score(&self, todo: &Todo, keywords: &[String]) -> (u32, usize) {
        let haystack = text::haystack(todo);
        let hits = keywords
            .iter()
            .filter(|word| haystack.contains(word.as_str()))
            .count();

        let mut score = self.config.keyword_weight.saturating_mul(hits as u32);
        if !todo.completed {
            score = score.saturating_add(self.config.pending_bonus);
        }
        (score, hits)
    }

    /// Rank `todos` for `question` and render the bounded context
    pub fn rank(&self, todos: &[Todo], question: &str) -> RankedContext {
        if todos.is_empty() {
            return RankedContext {
                context_text: EMPTY_CONTEXT_TEXT.to_string(),
                ranked: Vec::new(),
                selection: Selection::Empty,
            };
        }

        let keywords = text::keywords(question, self.config.min_keyword_chars);
        let limit = self.config.max_context_todos;

        // input order is kept so every later sort is stable against it
        let scored: Vec<RankedTodo> = todos
            .iter()
            .map(|todo| {
                let (score, keyword_hits) = self.score(todo, &keywords);
                RankedTodo {
                    todo: todo.clone(),
                    score,
                    keyword_hits,
                }
            })
            .collect();

        let mut by_score = scored.clone();
        by_score.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.todo.created_at.cmp(&a.todo.created_at))
        });

        let candidates: Vec<RankedTodo> = by_score
            .into_iter()
            .filter(|r| r.score > 0)
            .take(limit)
            .collect();

        let (ranked, selection) = if candidates.is_empty() {
            let mut recent = scored;
            recent.sort_by(|a, b| b.todo.created_at.cmp(&a.todo.created_at));
            recent.truncate(limit);
            (recent, Selection::RecencyFallback)
        } else {
            (candidates, Selection::Scored)
        };

        debug!(
            "Ranked {} of {} todos with {} keywords ({:?})",
            ranked.len(),
            todos.len(),
            keywords.len(),
            selection
        );

        let context_text = ranked
            .iter()
            .enumerate()
            .map(|(i, r)| text::render_todo_line(i + 1, &r.todo))
            .collect::<Vec<_>>()
            .join("\n");

        RankedContext {
            context_text,
            ranked,
            selection,
        }
    }
}
