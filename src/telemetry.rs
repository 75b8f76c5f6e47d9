use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_thread_names(true))
            .try_init()?;
    }

    tracing::info!(json = config.json_logs, "Traffic light telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related log lines
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span carried by a light's cycle thread
pub fn create_light_span(light_id: &str) -> tracing::Span {
    tracing::info_span!("traffic_light", light.id = light_id)
}

/// Flush point for shutdown; fmt layers write synchronously
pub fn shutdown_telemetry() {
    tracing::info!("Traffic light telemetry shutdown complete");
}
