//! Rule-based answer composition
//!
//! Classifies the question as either a planning ("what should I do next")
//! question or a lookup, then renders a deterministic reply.

use super::models::{AssistantReply, ConversationMessage, RankedContext, TodoMatch};
use super::ranker::RelevanceRanker;
use super::text;
use crate::todos::{Priority, Todo};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

pub const ONBOARDING_REPLY: &str = "You don't have any todos yet. Click 'New Todo' and add your first task, then ask me: 'What should I do first?'.";

pub const NO_MATCH_REPLY: &str = "I couldn't find a specific todo related to your question. Try different words or be more specific about the title/description.";

const PLAN_HEADER: &str = "Based on your tasks, here's how I'd prioritize:";
const LOOKUP_HEADER: &str = "Here's what I found from your todos related to this question:";

/// Composer limits and the next-action phrase list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Pending todos suggested for a planning question
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Todos listed (and returned as matches) for a lookup question
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// A question is a next-action question when every fragment of any
    /// one entry occurs in it (case-insensitive)
    #[serde(default = "default_next_action_phrases")]
    pub next_action_phrases: Vec<Vec<String>>,
}

fn default_max_suggestions() -> usize {
    3
}

fn default_max_matches() -> usize {
    5
}

fn default_next_action_phrases() -> Vec<Vec<String>> {
    [
        &["what should i do"][..],
        &["what next"],
        &["priorit"],
        &["რა გავაკეთო"],
        &["რა", "ვქნა"],
    ]
    .iter()
    .map(|fragments| fragments.iter().map(|f| f.to_string()).collect())
    .collect()
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            max_matches: default_max_matches(),
            next_action_phrases: default_next_action_phrases(),
        }
    }
}

/// Deterministic answer composer
#[derive(Debug, Clone, Default)]
pub struct AnswerComposer {
    config: ComposerConfig,
    ranker: RelevanceRanker,
}

impl AnswerComposer {
    pub fn new(config: ComposerConfig, ranker: RelevanceRanker) -> Self {
        Self { config, ranker }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn ranker(&self) -> &RelevanceRanker {
        &self.ranker
    }

    /// Fixed-phrase detector for "what should I do" style questions
    pub fn is_next_action_question(&self, question: &str) -> bool {
        let lower = question.to_lowercase();
        self.config.next_action_phrases.iter().any(|fragments| {
            !fragments.is_empty()
                && fragments
                    .iter()
                    .all(|fragment| lower.contains(&fragment.to_lowercase()))
        })
    }

    /// Pending todos ordered by priority, then due date, then age (oldest first)
    pub fn prioritize<'a>(&self, todos: &'a [Todo]) -> Vec<&'a Todo> {
        let mut pending: Vec<&Todo> = todos.iter().filter(|t| !t.completed).collect();
        insertion_sort_by(&mut pending, |a, b| planning_order(a, b));
        pending
    }

    /// Compose a reply for `question` over the user's `todos`.
    ///
    /// `recent_messages` is accepted for interface parity with generated
    /// answers and is not read by the rule-based reply.
    pub fn compose(
        &self,
        question: &str,
        todos: &[Todo],
        recent_messages: &[ConversationMessage],
    ) -> AssistantReply {
        let ranked = self.ranker.rank(todos, question);
        self.compose_with_context(question, todos, &ranked, recent_messages)
    }

    /// Same as [`compose`](Self::compose) with a context already ranked
    /// from the same `todos` and `question`
    pub fn compose_with_context(
        &self,
        question: &str,
        todos: &[Todo],
        ranked: &RankedContext,
        _recent_messages: &[ConversationMessage],
    ) -> AssistantReply {
        if todos.is_empty() {
            return AssistantReply::with_matches(ONBOARDING_REPLY, Vec::new());
        }

        let (pending, completed) = text::status_counts(todos);

        if self.is_next_action_question(question) {
            let suggestions: Vec<&Todo> = self
                .prioritize(todos)
                .into_iter()
                .take(self.config.max_suggestions)
                .collect();

            if !suggestions.is_empty() {
                debug!("Next-action question, suggesting {} todos", suggestions.len());
                return AssistantReply::with_matches(
                    render_plan(&suggestions, pending, completed),
                    Vec::new(),
                );
            }
        }

        if ranked.is_empty() || !ranked.has_keyword_match() {
            return AssistantReply::with_matches(NO_MATCH_REPLY, Vec::new());
        }

        let shown: Vec<&Todo> = ranked
            .top_todos()
            .into_iter()
            .take(self.config.max_matches)
            .collect();

        let mut lines = vec![LOOKUP_HEADER.to_string(), String::new()];
        lines.extend(
            shown
                .iter()
                .enumerate()
                .map(|(i, todo)| text::render_todo_line(i + 1, todo)),
        );
        lines.push(String::new());
        lines.push(format!(
            "You have {} active and {} completed tasks.",
            pending, completed
        ));

        let matches = shown.into_iter().map(TodoMatch::from).collect();
        AssistantReply::with_matches(lines.join("\n"), matches)
    }
}

fn render_plan(suggestions: &[&Todo], pending: usize, completed: usize) -> String {
    let mut lines = vec![PLAN_HEADER.to_string(), String::new()];
    lines.extend(
        suggestions
            .iter()
            .enumerate()
            .map(|(i, todo)| format!("{}. {} — {}", i + 1, todo.title, justification(todo))),
    );
    lines.push(String::new());
    lines.push(format!(
        "You have {} pending and {} completed todos.",
        pending, completed
    ));
    lines.join("\n")
}

/// One-line reason a todo was suggested
pub fn justification(todo: &Todo) -> &'static str {
    if todo.priority == Priority::High {
        "High priority."
    } else if todo.due_date.is_some() {
        "Has a due date, should be done soon."
    } else {
        "Has been in your list for a while."
    }
}

fn planning_order(a: &Todo, b: &Todo) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(da), Some(db)) => da.cmp(&db),
            _ => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}

// The planning comparator only compares due dates when both todos have one,
// so it is not transitive; slice::sort_by requires a total order.
fn insertion_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, title: &str, priority: Priority, created_at: i64) -> Todo {
        Todo {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            completed: false,
            priority,
            due_date: None,
            created_at,
            user_id: None,
        }
    }

    fn done(mut t: Todo) -> Todo {
        t.completed = true;
        t
    }

    fn due(mut t: Todo, due_date: i64) -> Todo {
        t.due_date = Some(due_date);
        t
    }

    #[test]
    fn test_onboarding_for_empty_collection() {
        let composer = AnswerComposer::default();
        for question in ["what should I do next", "find milk", ""] {
            let reply = composer.compose(question, &[], &[]);
            assert_eq!(reply.reply, ONBOARDING_REPLY);
            assert_eq!(reply.match_count(), 0);
        }
    }

    #[test]
    fn test_next_action_detection() {
        let composer = AnswerComposer::default();
        assert!(composer.is_next_action_question("What should I do next?"));
        assert!(composer.is_next_action_question("so... WHAT NEXT"));
        assert!(composer.is_next_action_question("help me prioritize"));
        assert!(composer.is_next_action_question("რა გავაკეთო დღეს?"));
        assert!(composer.is_next_action_question("რა უნდა ვქნა?"));
        assert!(!composer.is_next_action_question("ვქნა"));
        assert!(!composer.is_next_action_question("find my milk todo"));
    }

    #[test]
    fn test_next_action_reply() {
        let composer = AnswerComposer::default();
        let todos = vec![
            todo("1", "Water plants", Priority::Low, 10),
            due(todo("2", "File taxes", Priority::Medium, 30), 5_000),
            todo("3", "Fix prod bug", Priority::High, 40),
            todo("4", "Call bank", Priority::Medium, 20),
            done(todo("5", "Old high", Priority::High, 1)),
        ];

        let reply = composer.compose("what should I do next", &todos, &[]);
        let expected = [
            "Based on your tasks, here's how I'd prioritize:",
            "",
            "1. Fix prod bug — High priority.",
            "2. Call bank — Has been in your list for a while.",
            "3. File taxes — Has a due date, should be done soon.",
            "",
            "You have 4 pending and 1 completed todos.",
        ]
        .join("\n");

        assert_eq!(reply.reply, expected);
        assert_eq!(reply.matches, Some(vec![]));
    }

    #[test]
    fn test_prioritize_due_dates_then_age() {
        let composer = AnswerComposer::default();
        let todos = vec![
            due(todo("late", "Later due", Priority::Medium, 1), 900),
            due(todo("soon", "Sooner due", Priority::Medium, 2), 100),
            todo("old", "Oldest", Priority::Low, 0),
            todo("new", "Newest", Priority::Low, 99),
        ];
        let ordered: Vec<&str> = composer
            .prioritize(&todos)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ordered, vec!["soon", "late", "old", "new"]);
    }

    #[test]
    fn test_prioritize_mixed_due_dates_is_deterministic() {
        let composer = AnswerComposer::default();
        let todos = vec![
            due(todo("a", "A", Priority::Medium, 3), 1),
            todo("b", "B", Priority::Medium, 2),
            due(todo("c", "C", Priority::Medium, 1), 2),
        ];
        let first: Vec<String> = composer.prioritize(&todos).iter().map(|t| t.id.clone()).collect();
        let second: Vec<String> = composer.prioritize(&todos).iter().map(|t| t.id.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_next_action_with_only_completed_falls_through_to_lookup() {
        let composer = AnswerComposer::default();
        let todos = vec![done(todo("1", "Prioritize roadmap", Priority::High, 1))];
        let reply = composer.compose("how do I prioritize", &todos, &[]);
        assert!(reply.reply.starts_with(LOOKUP_HEADER));
        assert_eq!(reply.match_count(), 1);
    }

    #[test]
    fn test_lookup_with_matches() {
        let composer = AnswerComposer::default();
        let mut milk = todo("m", "Buy milk", Priority::High, 100);
        milk.description = Some("2 liters".to_string());
        let todos = vec![milk, done(todo("b", "Buy bread", Priority::Low, 200))];

        let reply = composer.compose("milk shopping", &todos, &[]);
        let expected = [
            "Here's what I found from your todos related to this question:",
            "",
            "1. [pending | high] Buy milk — 2 liters",
            "",
            "You have 1 active and 1 completed tasks.",
        ]
        .join("\n");
        assert_eq!(reply.reply, expected);
        assert_eq!(
            reply.matches,
            Some(vec![TodoMatch {
                id: "m".to_string(),
                title: "Buy milk".to_string()
            }])
        );
    }

    #[test]
    fn test_lookup_caps_matches_at_five() {
        let composer = AnswerComposer::default();
        let todos: Vec<Todo> = (0..9)
            .map(|i| todo(&i.to_string(), &format!("gym session {}", i), Priority::Medium, i))
            .collect();
        let reply = composer.compose("gym", &todos, &[]);
        let matches = reply.matches.unwrap();
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[0].id, "8");
        assert!(reply.reply.contains("5. [pending | medium] gym session 4"));
        assert!(!reply.reply.contains("6. "));
    }

    #[test]
    fn test_lookup_without_keyword_match() {
        let composer = AnswerComposer::default();
        let todos = vec![
            todo("1", "Buy milk", Priority::Medium, 1),
            done(todo("2", "Walk dog", Priority::Low, 2)),
        ];
        let reply = composer.compose("show me the passport", &todos, &[]);
        assert_eq!(reply.reply, NO_MATCH_REPLY);
        assert_eq!(reply.match_count(), 0);
    }

    #[test]
    fn test_history_is_ignored() {
        let composer = AnswerComposer::default();
        let todos = vec![todo("1", "Buy milk", Priority::Medium, 1)];
        let history = vec![
            ConversationMessage::user("a", "tell me about milk"),
            ConversationMessage::ai("b", "sure"),
        ];
        assert_eq!(
            composer.compose("milk", &todos, &history),
            composer.compose("milk", &todos, &[])
        );
    }

    #[test]
    fn test_custom_phrase_list() {
        let composer = AnswerComposer::new(
            ComposerConfig {
                next_action_phrases: vec![vec!["Plan My Day".to_string()]],
                ..Default::default()
            },
            RelevanceRanker::default(),
        );
        assert!(composer.is_next_action_question("please plan my day"));
        assert!(!composer.is_next_action_question("what should i do"));
    }
}
