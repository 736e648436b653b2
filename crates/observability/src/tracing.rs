//! Tracing/logging initialization.

use campusgate_core::config::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with the default filter.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_filter(DEFAULT_LOG_FILTER);
}

/// Initialize tracing; `RUST_LOG` wins over `default_filter` when set.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // JSON logs + timestamps.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
