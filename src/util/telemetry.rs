//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "orb_thread_pool=info";

/// Install a default `fmt` subscriber unless the application already set one.
///
/// `RUST_LOG` wins over [`DEFAULT_LOG_FILTER`]. Pool internals only emit
/// `tracing` events, so embedding applications are free to install their own
/// subscriber instead.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
