use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_assistant::{
    api::build_router,
    assistant::{build_strategy, AssistantService},
    config::{Config, LoggingConfig},
    todos::{InMemoryTodoStore, TodoStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!("Starting todo assistant");

    let store: Arc<dyn TodoStore> = Arc::new(InMemoryTodoStore::new(config.storage.clone()));

    let strategy = build_strategy(&config.assistant, &config.llm)?;
    if let Err(e) = strategy.ensure_configured() {
        tracing::warn!("Ask AI will reject requests until configured: {}", e);
    }

    let service = Arc::new(AssistantService::new(
        store.clone(),
        strategy,
        &config.assistant,
    ));

    let app = build_router(service, store, config.server.max_body_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}
