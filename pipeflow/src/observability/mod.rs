//! Observability utilities.

mod tracing;

pub use self::tracing::{
    LoggingTracingEmitter, NoOpTracingEmitter, PipelineSpanAttributes, SpanTimer,
    StageSpanAttributes, TracingEmitter,
};

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, or `default_filter` when unset.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
