//! Todo API handlers

use super::models::*;
use super::store::TodoStore;
use crate::api::models::{error_response, ApiError};
use crate::error::AssistantError;
use crate::metrics::METRICS;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Application state for todo handlers
#[derive(Clone)]
pub struct TodosState {
    pub store: Arc<dyn TodoStore>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn record<T>(operation: &str, result: crate::error::Result<T>) -> ApiResult<T> {
    METRICS.record_todo_operation(operation, result.is_ok());
    result.map_err(error_response)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTodosQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

/// List a user's todos
///
/// GET /api/todos?userId=..&page=..&search=..
pub async fn list_todos(
    State(state): State<TodosState>,
    Query(query): Query<ListTodosQuery>,
) -> ApiResult<Json<TodoPage>> {
    let page = state
        .store
        .list_for_user(
            query.user_id.as_deref(),
            query.page.unwrap_or(1),
            query.search.as_deref(),
        )
        .await;
    record("list", page).map(Json)
}

/// Create a todo
///
/// POST /api/todos
pub async fn create_todo(
    State(state): State<TodosState>,
    Json(fields): Json<NewTodo>,
) -> ApiResult<(StatusCode, Json<CreateTodoResponse>)> {
    info!("Todo create request: priority={}", fields.priority);
    let id = record("create", state.store.create(fields).await)?;
    Ok((StatusCode::CREATED, Json(CreateTodoResponse { id })))
}

/// Fetch one todo
///
/// GET /api/todos/:id
pub async fn get_todo(
    State(state): State<TodosState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Todo>> {
    let found = state
        .store
        .get(&id)
        .await
        .and_then(|todo| todo.ok_or_else(|| AssistantError::NotFound(id.clone())));
    record("get", found).map(Json)
}

/// Apply a partial update
///
/// PATCH /api/todos/:id
pub async fn update_todo(
    State(state): State<TodosState>,
    Path(id): Path<String>,
    Json(patch): Json<TodoPatch>,
) -> ApiResult<StatusCode> {
    record("update", state.store.update(&id, patch).await)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip the completed flag
///
/// POST /api/todos/:id/toggle
pub async fn toggle_todo(
    State(state): State<TodosState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    record("toggle", state.store.toggle_complete(&id).await)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/todos/:id
pub async fn delete_todo(
    State(state): State<TodosState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    record("delete", state.store.delete(&id).await)?;
    Ok(StatusCode::NO_CONTENT)
}
