//! Tokenization and line rendering shared by the ranker and the composer

use crate::todos::Todo;

/// Lower-cased whitespace tokens with at least `min_chars` characters.
///
/// Duplicates are kept: a word repeated in the question is checked (and
/// scored) once per occurrence.
pub fn keywords(question: &str, min_chars: usize) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= min_chars)
        .map(str::to_string)
        .collect()
}

/// Lower-cased `title + " " + description` searched by keyword matching
pub fn haystack(todo: &Todo) -> String {
    format!(
        "{} {}",
        todo.title,
        todo.description.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

/// `"{position}. [{status} | {priority}] {title}{ — description}"`
pub fn render_todo_line(position: usize, todo: &Todo) -> String {
    let description = todo
        .description_text()
        .map(|d| format!(" — {}", d))
        .unwrap_or_default();
    format!(
        "{}. [{} | {}] {}{}",
        position,
        todo.status_label(),
        todo.priority,
        todo.title,
        description
    )
}

/// Pending and completed counts
pub fn status_counts(todos: &[Todo]) -> (usize, usize) {
    let completed = todos.iter().filter(|t| t.completed).count();
    (todos.len() - completed, completed)
}
