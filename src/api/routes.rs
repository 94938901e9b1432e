//! Router assembly

use super::health::{health_check, metrics, HealthState};
use super::middleware::log_request;
use crate::assistant::{ask_ai, AskState, AssistantService};
use crate::todos::{self, TodoStore, TodosState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build Ask AI routes
pub fn build_ask_routes(state: AskState) -> Router {
    Router::new()
        .route("/api/ask-ai", post(ask_ai))
        .with_state(state)
}

/// Build todo CRUD routes
pub fn build_todo_routes(state: TodosState) -> Router {
    Router::new()
        .route("/api/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/api/todos/:id",
            get(todos::get_todo)
                .patch(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/api/todos/:id/toggle", post(todos::toggle_todo))
        .with_state(state)
}

/// Build the complete router with health, metrics and middleware
pub fn build_router(
    service: Arc<AssistantService>,
    store: Arc<dyn TodoStore>,
    max_body_bytes: usize,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(HealthState {
            strategy: service.strategy_name(),
        });

    health_routes
        .merge(build_ask_routes(AskState { service }))
        .merge(build_todo_routes(TodosState { store }))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(log_request)),
        )
}
