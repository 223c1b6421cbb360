//! Structured logging setup.

use keepsake_error::{KeepsakeResult, ServerError, ServerErrorKind};
use tracing_subscriber::{
    EnvFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset (e.g., "info", "keepsake_storage=debug")
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_observability(config: &ObservabilityConfig) -> KeepsakeResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ServerError::new(ServerErrorKind::Tracing(e.to_string())))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ServerError::new(ServerErrorKind::Tracing(e.to_string())))?;

    Ok(())
}
