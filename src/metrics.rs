//! Prometheus metrics for itemetrics
//!
//! This module provides:
//! - A [`MetricRegistry`] holding counters, timers and source-backed gauges,
//!   keyed by metric name plus an unordered label set
//! - [`HttpMetrics`], the request instrumentation built on top of the registry
//! - Text exposition for the `/metrics` endpoint
//!
//! The registry is constructed once at startup and shared through
//! [`crate::handlers::AppState`]. There is no global registry.

pub mod exposition;
pub mod http;
pub mod labels;
pub mod registry;

pub use exposition::TEXT_CONTENT_TYPE;
pub use http::{HttpMetrics, InFlight};
pub use labels::Labels;
pub use registry::{Counter, GaugeSource, MetricKind, MetricRegistry, TimeUnit, Timer};

use thiserror::Error;

/// Errors raised by the metrics layer
///
/// None of these ever reach an HTTP client. The request interceptor logs them
/// and counts them in `http_metrics_recording_failures_total`.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Metric '{name}' is already registered as a {existing}, cannot use it as a {requested}")]
    KindMismatch {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },

    #[error("Metric '{name}' uses labels {expected:?}, got {actual:?}")]
    LabelMismatch {
        name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Convenience type alias for metrics results
pub type MetricsResult<T> = Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = MetricsError::InvalidArgument("negative increment: -1".to_string());
        assert_eq!(err.to_string(), "Invalid argument: negative increment: -1");
    }

    #[test]
    fn test_kind_mismatch_message() {
        let err = MetricsError::KindMismatch {
            name: "jobs".to_string(),
            existing: MetricKind::Counter,
            requested: MetricKind::Timer,
        };
        assert_eq!(
            err.to_string(),
            "Metric 'jobs' is already registered as a counter, cannot use it as a timer"
        );
    }

    #[test]
    fn test_prometheus_error_converts() {
        let err: MetricsError = prometheus::Error::Msg("boom".to_string()).into();
        assert!(matches!(err, MetricsError::Prometheus(_)));
    }
}
