//! Todo storage collaborator
//!
//! The assistant only ever reads through [`TodoStore`]; the in-memory
//! implementation backs the HTTP API and the tests.

use super::models::*;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Todos returned per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// CRUD and indexed-query operations over todos
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// List one page (1-based) of a user's todos, newest first.
    /// `user_id = None` lists todos that have no owner.
    async fn list_for_user(
        &self,
        user_id: Option<&str>,
        page: u32,
        search: Option<&str>,
    ) -> Result<TodoPage>;

    async fn get(&self, id: &str) -> Result<Option<Todo>>;

    async fn create(&self, fields: NewTodo) -> Result<String>;

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<()>;

    async fn toggle_complete(&self, id: &str) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Concurrent in-memory todo store
pub struct InMemoryTodoStore {
    todos: DashMap<String, Todo>,
    config: StorageConfig,
    last_created_at: AtomicI64,
}

impl InMemoryTodoStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            todos: DashMap::new(),
            config,
            last_created_at: AtomicI64::new(0),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Strictly increasing creation timestamp in epoch milliseconds
    fn next_created_at(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_created_at.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self.last_created_at.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }

    fn matches_search(todo: &Todo, needle: &str) -> bool {
        todo.title.to_lowercase().contains(needle)
            || todo
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn list_for_user(
        &self,
        user_id: Option<&str>,
        page: u32,
        search: Option<&str>,
    ) -> Result<TodoPage> {
        let page = page.max(1);
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut owned: Vec<Todo> = self
            .todos
            .iter()
            .filter(|entry| entry.value().user_id.as_deref() == user_id)
            .filter(|entry| {
                needle
                    .as_deref()
                    .map(|n| Self::matches_search(entry.value(), n))
                    .unwrap_or(true)
            })
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = owned.len();
        let page_size = self.config.page_size.max(1);
        let todos = owned
            .into_iter()
            .skip((page as usize - 1) * page_size)
            .take(page_size)
            .collect::<Vec<_>>();

        debug!(
            "Listed {} of {} todos (page {}, page_size {})",
            todos.len(),
            total,
            page,
            page_size
        );

        Ok(TodoPage {
            todos,
            total,
            page_size,
            page,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Todo>> {
        Ok(self.todos.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, fields: NewTodo) -> Result<String> {
        fields.validate().map_err(AssistantError::InvalidInput)?;

        let id = uuid::Uuid::new_v4().to_string();
        let todo = Todo {
            id: id.clone(),
            title: fields.title,
            description: fields.description,
            completed: false,
            priority: fields.priority,
            due_date: fields.due_date,
            created_at: self.next_created_at(),
            user_id: fields.user_id,
        };

        self.todos.insert(id.clone(), todo);
        info!("Todo created: id={}", id);
        Ok(id)
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<()> {
        patch.validate().map_err(AssistantError::InvalidInput)?;

        let mut entry = self
            .todos
            .get_mut(id)
            .ok_or_else(|| AssistantError::NotFound(id.to_string()))?;
        patch.apply(entry.value_mut());

        debug!("Todo updated: id={}", id);
        Ok(())
    }

    async fn toggle_complete(&self, id: &str) -> Result<()> {
        let mut entry = self
            .todos
            .get_mut(id)
            .ok_or_else(|| AssistantError::NotFound(id.to_string()))?;
        let todo = entry.value_mut();
        todo.completed = !todo.completed;

        debug!("Todo toggled: id={}, completed={}", id, todo.completed);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.todos
            .remove(id)
            .map(|_| info!("Todo deleted: id={}", id))
            .ok_or_else(|| AssistantError::NotFound(id.to_string()))
    }
}
