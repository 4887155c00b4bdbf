use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::config;

/// Initialize structured logging for the process.
///
/// RUST_LOG takes precedence; otherwise the configured log level applies.
pub fn init_telemetry() -> Result<()> {
    let (json_logs, log_level) = match config() {
        Ok(cfg) => (
            cfg.observability.json_logs,
            cfg.observability.log_level.clone(),
        ),
        Err(_) => (true, "info".to_string()),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    tracing::info!("Verigate telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common verification workflow attributes.
///
/// The token itself is never recorded.
pub fn create_verification_span(
    operation: &str,
    identifier: Option<&str>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "verification",
        operation = operation,
        email.id = identifier,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    tracing::info!("Verigate telemetry shutdown complete");
}
