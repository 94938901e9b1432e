//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry, Counter, CounterVec,
    Histogram, HistogramVec, Opts, Registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Ask AI
    pub ask_requests: CounterVec,
    pub ask_duration: HistogramVec,

    // Ranking
    pub ranking_selections: CounterVec,
    pub context_todos: Histogram,

    // Completion API
    pub completion_requests: CounterVec,
    pub completion_circuit_open: Counter,
    pub prompt_tokens: Histogram,

    // Todo storage
    pub todo_operations: CounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ask_requests = register_counter_vec_with_registry!(
            Opts::new("ask_ai_requests_total", "Total Ask AI requests"),
            &["strategy", "status"],
            registry
        )?;

        let ask_duration = register_histogram_vec_with_registry!(
            "ask_ai_request_duration_seconds",
            "Ask AI request duration in seconds",
            &["strategy"],
            registry
        )?;

        let ranking_selections = register_counter_vec_with_registry!(
            Opts::new("ranking_selections_total", "Ranked contexts by selection path"),
            &["selection"],
            registry
        )?;

        let context_todos = register_histogram_with_registry!(
            "ranking_context_todos",
            "Todos placed in the ranked context",
            registry
        )?;

        let completion_requests = register_counter_vec_with_registry!(
            Opts::new("completion_requests_total", "Total chat-completion API calls"),
            &["status"],
            registry
        )?;

        let completion_circuit_open = register_counter_with_registry!(
            Opts::new(
                "completion_circuit_open_total",
                "Completion calls rejected by the open circuit breaker"
            ),
            registry
        )?;

        let prompt_tokens = register_histogram_with_registry!(
            "completion_prompt_tokens",
            "Estimated prompt tokens per completion request",
            registry
        )?;

        let todo_operations = register_counter_vec_with_registry!(
            Opts::new("todo_operations_total", "Todo storage operations"),
            &["operation", "status"],
            registry
        )?;

        Ok(Self {
            registry,
            ask_requests,
            ask_duration,
            ranking_selections,
            context_todos,
            completion_requests,
            completion_circuit_open,
            prompt_tokens,
            todo_operations,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished Ask AI request
    pub fn record_ask(&self, strategy: &str, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.ask_requests.with_label_values(&[strategy, status]).inc();
        self.ask_duration
            .with_label_values(&[strategy])
            .observe(seconds);
    }

    /// Record which path produced a ranked context
    pub fn record_ranking(&self, selection: &str, context_size: usize) {
        self.ranking_selections.with_label_values(&[selection]).inc();
        self.context_todos.observe(context_size as f64);
    }

    pub fn record_completion(&self, status: &str) {
        self.completion_requests.with_label_values(&[status]).inc();
    }

    pub fn record_todo_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.todo_operations
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
