//! Tracing setup
//!
//! `RUST_LOG` filters (default `stemify_api=info`), `RUST_LOG_FORMAT=json`
//! switches to JSON lines.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "stemify_api=info";

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
