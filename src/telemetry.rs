//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process has an effect. Subsequent calls are
/// silently ignored.
///
/// `RUST_LOG` takes precedence over `default_level` (the configured
/// `observability.log_level`).
///
/// # Examples
///
/// ```no_run
/// itemetrics::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directive(default_level)));

        // A subscriber installed by an embedding process wins
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}

/// Default filter: our crate at the configured level, per-request spans
/// from tower-http at debug
fn filter_directive(level: &str) -> String {
    format!(
        "itemetrics={},tower_http=debug",
        level.to_ascii_lowercase()
    )
}
