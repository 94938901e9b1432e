//! Todo storage collaborator and its HTTP surface
//!
//! - Todo records with closed priority variants
//! - Edge validation for titles and descriptions
//! - Per-user, newest-first paginated listing with search

pub mod handlers;
pub mod models;
pub mod store;

pub use handlers::{
    create_todo, delete_todo, get_todo, list_todos, toggle_todo, update_todo, ListTodosQuery,
    TodosState,
};
pub use models::{CreateTodoResponse, NewTodo, Priority, Todo, TodoPage, TodoPatch};
pub use store::{InMemoryTodoStore, StorageConfig, TodoStore};
