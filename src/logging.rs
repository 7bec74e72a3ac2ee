//! # Structured Logging Module
//!
//! Environment-aware `tracing` initialization plus a few structured log
//! helpers for the operations operators actually grep for: queue moves,
//! lifecycle transitions, and surfaced errors.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// Filter comes from `LINEUP_LOG` (falling back to `RUST_LOG`, then the
/// environment-based default). Safe to call repeatedly; later calls are
/// no-ops, and an already-installed global subscriber is left alone.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = std::env::var("LINEUP_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| default_log_level(&get_environment()).to_string());

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(filter)),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}

fn get_environment() -> String {
    std::env::var("LINEUP_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for queue operations
pub fn log_queue_operation(
    operation: &str,
    category: &str,
    content_id: Option<&str>,
    position: Option<i32>,
    status: &str,
) {
    tracing::info!(
        operation = %operation,
        category = %category,
        content_id = content_id,
        position = position,
        status = %status,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 QUEUE_OPERATION"
    );
}

/// Log structured data for lifecycle transitions
pub fn log_content_operation(
    operation: &str,
    content_id: Option<&str>,
    from_state: Option<&str>,
    to_state: Option<&str>,
    status: &str,
) {
    tracing::info!(
        operation = %operation,
        content_id = content_id,
        from_state = from_state,
        to_state = to_state,
        status = %status,
        timestamp = %Utc::now().to_rfc3339(),
        "📝 CONTENT_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
