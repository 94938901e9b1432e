//! Data models for the assistant

use crate::todos::Todo;
use serde::{Deserialize, Deserializer, Serialize};

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    User,
    Ai,
}

impl MessageAuthor {
    /// Speaker label used when replaying history into a prompt
    pub fn speaker(&self) -> &'static str {
        match self {
            MessageAuthor::User => "User",
            MessageAuthor::Ai => "Assistant",
        }
    }
}

/// A chat message supplied by the client; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub author: MessageAuthor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ConversationMessage {
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: MessageAuthor::User,
            timestamp: None,
        }
    }

    pub fn ai(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: MessageAuthor::Ai,
            timestamp: None,
        }
    }
}

/// How the ranked todos were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// No todos at all
    Empty,
    /// Positive scores, best first
    Scored,
    /// Nothing scored; most recently created todos instead
    RecencyFallback,
}

/// A todo together with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTodo {
    pub todo: Todo,
    pub score: u32,
    /// Number of question keywords found in the todo text
    pub keyword_hits: usize,
}

/// Bounded context derived from one question over one todo collection
#[derive(Debug, Clone, PartialEq)]
pub struct RankedContext {
    pub context_text: String,
    pub ranked: Vec<RankedTodo>,
    pub selection: Selection,
}

impl RankedContext {
    pub fn top_todos(&self) -> Vec<&Todo> {
        self.ranked.iter().map(|r| &r.todo).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// True when at least one ranked todo matched a question keyword
    pub fn has_keyword_match(&self) -> bool {
        self.ranked.iter().any(|r| r.keyword_hits > 0)
    }
}

/// A todo reference the client can deep-link to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoMatch {
    pub id: String,
    pub title: String,
}

impl From<&Todo> for TodoMatch {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
        }
    }
}

/// Assistant answer returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<TodoMatch>>,
}

impl AssistantReply {
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            matches: None,
        }
    }

    pub fn with_matches(reply: impl Into<String>, matches: Vec<TodoMatch>) -> Self {
        Self {
            reply: reply.into(),
            matches: Some(matches),
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// `todos` that is present but not an array is coerced to an empty list
fn lenient_todos<'de, D>(deserializer: D) -> Result<Option<Vec<Todo>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Array(items)) => {
            serde_json::from_value(serde_json::Value::Array(items))
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
        Some(_) => Ok(Some(Vec::new())),
    }
}

/// Ask request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, deserialize_with = "lenient_todos")]
    pub todos: Option<Vec<Todo>>,
}
