//! Tracing setup shared by the binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output shape for a run's log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines carrying target and thread name. Worker
    /// threads are named after their order ids, so fills and cancels
    /// attribute themselves in the output.
    Text,
    /// One JSON object per line, for piping a run into analysis tooling.
    Json,
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides
/// `default_level` entirely.
pub fn init_logger(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_names(true))
            .init(),
    }
}
