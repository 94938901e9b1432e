//! Router-level tests for POST /api/ask-ai

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use todo_assistant::{
    api::build_router,
    assistant::{
        completion::{FALLBACK_REPLY, MISSING_KEY_MESSAGE},
        composer::{NO_MATCH_REPLY, ONBOARDING_REPLY},
        tokens::WordBasedEstimator,
        AnswerStrategy, AssistantConfig, AssistantService, ExternalCompletionStrategy, LlmConfig,
        RuleBasedStrategy,
    },
    error::{AssistantError, Result},
    todos::{InMemoryTodoStore, NewTodo, Priority, Todo, TodoPage, TodoPatch, TodoStore},
};
use tower::ServiceExt;

fn app(store: Arc<dyn TodoStore>, strategy: Arc<dyn AnswerStrategy>) -> Router {
    let service = Arc::new(AssistantService::new(
        store.clone(),
        strategy,
        &AssistantConfig::default(),
    ));
    build_router(service, store, 64 * 1024)
}

fn rule_based_app(store: Arc<dyn TodoStore>) -> Router {
    app(store, Arc::new(RuleBasedStrategy::default()))
}

fn external_app(endpoint: &str, api_key: Option<&str>) -> Router {
    let config = LlmConfig {
        endpoint: endpoint.to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    }
    .with_api_key(api_key.map(str::to_string));
    let strategy =
        ExternalCompletionStrategy::with_estimator(config, Arc::new(WordBasedEstimator::default()))
            .unwrap();
    app(Arc::new(InMemoryTodoStore::default()), Arc::new(strategy))
}

async fn ask(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ask-ai")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn todo_json(id: &str, title: &str, completed: bool, priority: &str, created_at: i64) -> Value {
    json!({
        "_id": id,
        "title": title,
        "completed": completed,
        "priority": priority,
        "createdAt": created_at
    })
}

struct UnavailableStore;

#[async_trait]
impl TodoStore for UnavailableStore {
    async fn list_for_user(&self, _: Option<&str>, _: u32, _: Option<&str>) -> Result<TodoPage> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
    async fn get(&self, _: &str) -> Result<Option<Todo>> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
    async fn create(&self, _: NewTodo) -> Result<String> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
    async fn update(&self, _: &str, _: TodoPatch) -> Result<()> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
    async fn toggle_complete(&self, _: &str) -> Result<()> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
    async fn delete(&self, _: &str) -> Result<()> {
        Err(AssistantError::Storage("connection refused".to_string()))
    }
}

#[tokio::test]
async fn lookup_with_supplied_todos_returns_matches() {
    let body = json!({
        "userId": "u1",
        "question": "where is the milk",
        "messages": [{"id": "m1", "text": "hi", "type": "user"}],
        "todos": [
            todo_json("t1", "Buy milk", false, "high", 100),
            todo_json("t2", "Buy bread", true, "low", 200)
        ]
    });

    let (status, value) = ask(rule_based_app(Arc::new(InMemoryTodoStore::default())), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["matches"], json!([{"id": "t1", "title": "Buy milk"}]));
    let reply = value["reply"].as_str().unwrap();
    assert!(reply.contains("1. [pending | high] Buy milk"));
    assert!(reply.ends_with("You have 1 active and 1 completed tasks."));
}

#[tokio::test]
async fn unknown_priority_is_treated_as_medium() {
    let body = json!({
        "question": "milk",
        "todos": [todo_json("t1", "Buy milk", false, "urgent", 1)]
    });
    let (status, value) = ask(rule_based_app(Arc::new(InMemoryTodoStore::default())), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(value["reply"]
        .as_str()
        .unwrap()
        .contains("[pending | medium] Buy milk"));
}

#[tokio::test]
async fn no_match_reply_has_empty_matches() {
    let body = json!({
        "question": "passport renewal",
        "todos": [todo_json("t1", "Buy milk", false, "medium", 1)]
    });
    let (status, value) = ask(rule_based_app(Arc::new(InMemoryTodoStore::default())), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["reply"], NO_MATCH_REPLY);
    assert_eq!(value["matches"], json!([]));
}

#[tokio::test]
async fn non_array_todos_are_treated_as_empty() {
    let body = json!({"question": "what should I do next", "todos": "not a list"});
    let (status, value) = ask(rule_based_app(Arc::new(InMemoryTodoStore::default())), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["reply"], ONBOARDING_REPLY);
}

#[tokio::test]
async fn next_action_over_stored_todos() {
    let store = Arc::new(InMemoryTodoStore::default());
    store
        .create(NewTodo::new("Water plants").with_priority(Priority::Low).for_user("u1"))
        .await
        .unwrap();
    store
        .create(NewTodo::new("Fix prod bug").with_priority(Priority::High).for_user("u1"))
        .await
        .unwrap();
    store
        .create(NewTodo::new("Someone else's task").with_priority(Priority::High).for_user("u2"))
        .await
        .unwrap();

    let body = json!({"userId": "u1", "question": "What should I do next?"});
    let (status, value) = ask(rule_based_app(store), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let expected = [
        "Based on your tasks, here's how I'd prioritize:",
        "",
        "1. Fix prod bug — High priority.",
        "2. Water plants — Has been in your list for a while.",
        "",
        "You have 2 pending and 0 completed todos.",
    ]
    .join("\n");
    assert_eq!(value["reply"], expected);
    assert_eq!(value["matches"], json!([]));
}

#[tokio::test]
async fn missing_question_is_bad_request() {
    for body in [json!({"userId": "u1"}), json!({"question": "  "}), json!({"question": null})] {
        let (status, value) =
            ask(rule_based_app(Arc::new(InMemoryTodoStore::default())), body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "Missing question in request body.");
        assert_eq!(value["code"], "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (status, value) = ask(
        rule_based_app(Arc::new(InMemoryTodoStore::default())),
        "{not json".to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn storage_failure_is_bad_gateway() {
    let body = json!({"userId": "u1", "question": "milk"});
    let (status, value) = ask(rule_based_app(Arc::new(UnavailableStore)), body.to_string()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(value["error"], "Todo storage is unavailable right now.");
    assert!(!value["error"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn missing_api_key_is_server_error() {
    let app = external_app("http://127.0.0.1:1/v1/chat/completions", None);
    let (status, value) = ask(app, json!({"question": "hi"}).to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], MISSING_KEY_MESSAGE);
    assert_eq!(value["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn missing_api_key_reported_before_body_errors() {
    let app = external_app("http://127.0.0.1:1/v1/chat/completions", None);
    let (status, value) = ask(app, "{broken".to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], MISSING_KEY_MESSAGE);
}

#[tokio::test]
async fn upstream_failure_degrades_to_fallback_reply() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("provider exploded")
        .create_async()
        .await;

    let app = external_app(
        &format!("{}/v1/chat/completions", server.url()),
        Some("sk-test"),
    );
    let body = json!({
        "question": "milk?",
        "todos": [todo_json("t1", "Buy milk", false, "high", 1)]
    });
    let (status, value) = ask(app, body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["reply"], FALLBACK_REPLY);
    assert!(value.get("matches").is_none());
}

#[tokio::test]
async fn external_completion_reply_is_returned() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"Start with Buy milk."}}]}"#)
        .create_async()
        .await;

    let app = external_app(
        &format!("{}/v1/chat/completions", server.url()),
        Some("sk-test"),
    );
    let body = json!({
        "question": "what first?",
        "todos": [todo_json("t1", "Buy milk", false, "high", 1)]
    });
    let (status, value) = ask(app, body.to_string()).await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["reply"], "Start with Buy milk.");
}
