//! HTTP request instrumentation
//!
//! [`HttpMetrics::start`] is the pre-phase of a request: it bumps
//! `http_requests_in_progress` and captures a monotonic start time into the
//! returned [`InFlight`] guard. The post-phase runs exactly once per guard,
//! either through [`InFlight::complete`] or, if the request is dropped before
//! a response exists, from the guard's `Drop` impl.
//!
//! Recording failures are logged and counted, never returned: instrumentation
//! must not be able to fail a request.

use super::labels::Labels;
use super::registry::MetricRegistry;
use super::{MetricsError, MetricsResult};
use axum::http::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Gauge of requests currently being handled
pub const REQUESTS_IN_PROGRESS: &str = "http_requests_in_progress";
/// Counter of completed requests by method, path and status
pub const REQUEST_TOTAL: &str = "http_request_total";
/// Timer of request latency by method, path and status
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
/// Counter of instrumentation failures by operation
pub const RECORDING_FAILURES_TOTAL: &str = "http_metrics_recording_failures_total";
/// `operation` label for a failed request count
pub const RECORD_REQUEST: &str = "record_request";
/// `operation` label for a failed duration observation
pub const RECORD_DURATION: &str = "record_duration";

/// Status label for requests dropped before a response was produced
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Request metrics recorded by the interceptor
///
/// Cheap to clone: the registry and the in-flight source are shared.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Arc<MetricRegistry>,
    in_progress: Arc<AtomicI64>,
}

impl HttpMetrics {
    /// Describe the request metrics and bind the in-progress gauge
    ///
    /// # Errors
    ///
    /// Returns an error if `http_requests_in_progress` is already registered
    /// as a different kind or with labels.
    pub fn new(registry: Arc<MetricRegistry>) -> MetricsResult<Self> {
        registry.describe(
            REQUESTS_IN_PROGRESS,
            "Number of HTTP requests currently in progress",
        );
        registry.describe(REQUEST_TOTAL, "Total number of HTTP requests");
        registry.describe(
            REQUEST_DURATION_SECONDS,
            "HTTP request duration in seconds",
        );
        registry.describe(
            RECORDING_FAILURES_TOTAL,
            "Total number of request metric recording failures by operation. \
            Indicates a metrics registry problem, requests are unaffected.",
        );

        let in_progress = Arc::new(AtomicI64::new(0));
        registry.gauge(
            REQUESTS_IN_PROGRESS,
            &Labels::new(),
            Arc::clone(&in_progress),
        )?;

        Ok(Self {
            registry,
            in_progress,
        })
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Current value of `http_requests_in_progress`
    pub fn in_progress(&self) -> i64 {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Pre-phase: count the request as in flight and start its clock
    pub fn start(&self, method: &str, path: impl Into<String>) -> InFlight {
        self.in_progress.fetch_add(1, Ordering::SeqCst);
        InFlight {
            metrics: self.clone(),
            method: method.to_string(),
            path: path.into(),
            started_at: Some(Instant::now()),
            completed: false,
        }
    }

    /// Completed requests for one `(method, path, status)` series
    ///
    /// Zero for a series that was never observed. Does not create it.
    pub fn request_count(&self, method: &str, path: &str, status: u16) -> u64 {
        self.registry
            .counter_value(REQUEST_TOTAL, &request_labels(method, path, status))
            .unwrap_or(0)
    }

    /// Total number of recording failures across all operations
    pub fn recording_failures_count(&self) -> u64 {
        [RECORD_REQUEST, RECORD_DURATION]
            .into_iter()
            .filter_map(|operation| {
                self.registry.counter_value(
                    RECORDING_FAILURES_TOTAL,
                    &Labels::new().with("operation", operation),
                )
            })
            .sum()
    }

    fn recording_failure(&self, operation: &str, error: &MetricsError) {
        tracing::warn!(
            operation,
            error = %error,
            "Failed to record request metrics, request is unaffected"
        );

        match self.registry.counter(
            RECORDING_FAILURES_TOTAL,
            &Labels::new().with("operation", operation),
        ) {
            Ok(counter) => counter.increment(),
            Err(e) => tracing::error!(
                operation,
                error = %e,
                "Failed to count metrics recording failure"
            ),
        }
    }
}

fn request_labels(method: &str, path: &str, status: u16) -> Labels {
    Labels::new()
        .with("method", method)
        .with("path", path)
        .with("status", status.to_string())
}

/// In-flight request guard carrying the per-request context
///
/// Owned by exactly one request. Dropping it without calling
/// [`InFlight::complete`] records the request with status `499`.
pub struct InFlight {
    metrics: HttpMetrics,
    method: String,
    path: String,
    started_at: Option<Instant>,
    completed: bool,
}

impl InFlight {
    /// Post-phase for a request that produced a response
    pub fn complete(mut self, status: StatusCode) {
        self.finish(status.as_u16());
    }

    fn finish(&mut self, status: u16) {
        // Set first so an unwind out of here cannot run the post-phase twice
        self.completed = true;
        self.metrics.in_progress.fetch_sub(1, Ordering::SeqCst);

        let labels = request_labels(&self.method, &self.path, status);

        match self.metrics.registry.counter(REQUEST_TOTAL, &labels) {
            Ok(counter) => counter.increment(),
            Err(e) => self.metrics.recording_failure(RECORD_REQUEST, &e),
        }

        let Some(started_at) = self.started_at.take() else {
            debug_assert!(false, "request start time missing at completion");
            tracing::error!(
                method = %self.method,
                path = %self.path,
                status,
                "Request start time missing at completion, skipping duration"
            );
            return;
        };

        match self
            .metrics
            .registry
            .timer(REQUEST_DURATION_SECONDS, &labels)
        {
            Ok(timer) => timer.record_duration(started_at.elapsed()),
            Err(e) => self.metrics.recording_failure(RECORD_DURATION, &e),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        tracing::debug!(
            method = %self.method,
            path = %self.path,
            "Request dropped before completion"
        );
        self.finish(CLIENT_CLOSED_REQUEST);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_metrics() -> HttpMetrics {
        HttpMetrics::new(Arc::new(MetricRegistry::new())).expect("should create metrics")
    }

    #[test]
    fn test_complete_records_counter_and_timer() {
        let metrics = create_metrics();

        let in_flight = metrics.start("GET", "/items/1");
        assert_eq!(metrics.in_progress(), 1);
        in_flight.complete(StatusCode::OK);

        assert_eq!(metrics.in_progress(), 0);
        assert_eq!(metrics.request_count("GET", "/items/1", 200), 1);

        let timer = metrics
            .registry()
            .timer(
                REQUEST_DURATION_SECONDS,
                &request_labels("GET", "/items/1", 200),
            )
            .unwrap();
        assert_eq!(timer.count(), 1);
    }

    #[test]
    fn test_gauge_tracks_overlapping_requests() {
        let metrics = create_metrics();

        let first = metrics.start("GET", "/");
        let second = metrics.start("POST", "/items");
        assert_eq!(metrics.in_progress(), 2);

        second.complete(StatusCode::OK);
        assert_eq!(metrics.in_progress(), 1);
        first.complete(StatusCode::OK);
        assert_eq!(metrics.in_progress(), 0);
    }

    #[test]
    fn test_drop_without_complete_records_client_closed() {
        let metrics = create_metrics();

        {
            let _in_flight = metrics.start("GET", "/slow");
            assert_eq!(metrics.in_progress(), 1);
        }

        assert_eq!(metrics.in_progress(), 0);
        assert_eq!(
            metrics.request_count("GET", "/slow", CLIENT_CLOSED_REQUEST),
            1
        );
    }

    #[test]
    fn test_complete_runs_post_phase_once() {
        let metrics = create_metrics();
        metrics.start("DELETE", "/items/3").complete(StatusCode::NOT_FOUND);

        assert_eq!(metrics.in_progress(), 0);
        assert_eq!(metrics.request_count("DELETE", "/items/3", 404), 1);
        assert_eq!(
            metrics.request_count("DELETE", "/items/3", CLIENT_CLOSED_REQUEST),
            0
        );
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "request start time missing"))]
    fn test_missing_start_time_is_an_invariant_violation() {
        let metrics = create_metrics();
        let mut in_flight = metrics.start("GET", "/");
        in_flight.started_at = None;

        in_flight.complete(StatusCode::OK);

        // Release builds skip the duration but keep the count and the gauge
        assert_eq!(metrics.in_progress(), 0);
        assert_eq!(metrics.request_count("GET", "/", 200), 1);
    }

    #[test]
    fn test_recording_failure_is_counted_not_raised() {
        let registry = Arc::new(MetricRegistry::new());
        // Claim the counter name with the wrong labels so every record fails
        registry
            .counter(REQUEST_TOTAL, &Labels::new().with("route", "/"))
            .unwrap();
        let metrics = HttpMetrics::new(Arc::clone(&registry)).unwrap();

        metrics.start("GET", "/").complete(StatusCode::OK);

        assert_eq!(metrics.in_progress(), 0);
        assert_eq!(metrics.recording_failures_count(), 1);
    }

    #[test]
    fn test_count_helpers_do_not_create_series() {
        let metrics = create_metrics();
        metrics.start("GET", "/items/1").complete(StatusCode::OK);
        let before = metrics.registry().gather().unwrap();

        assert_eq!(metrics.request_count("DELETE", "/never", 418), 0);
        assert_eq!(metrics.request_count("GET", "/items/1", 404), 0);
        assert_eq!(metrics.recording_failures_count(), 0);

        let after = metrics.registry().gather().unwrap();
        assert_eq!(before, after);
        assert!(!after.contains(r#"path="/never""#));
        assert!(!after.contains(RECORDING_FAILURES_TOTAL));
    }

    #[test]
    fn test_recording_failure_is_labelled_by_operation() {
        let registry = Arc::new(MetricRegistry::new());
        registry
            .timer(REQUEST_DURATION_SECONDS, &Labels::new().with("route", "/"))
            .unwrap();
        let metrics = HttpMetrics::new(Arc::clone(&registry)).unwrap();

        metrics.start("GET", "/").complete(StatusCode::OK);

        let failures = Labels::new().with("operation", RECORD_DURATION);
        assert_eq!(
            registry.counter_value(RECORDING_FAILURES_TOTAL, &failures),
            Some(1)
        );
        assert_eq!(
            registry.counter_value(
                RECORDING_FAILURES_TOTAL,
                &Labels::new().with("operation", RECORD_REQUEST)
            ),
            None
        );
        assert_eq!(metrics.recording_failures_count(), 1);
    }

    #[test]
    fn test_in_progress_gauge_is_exposed() {
        let metrics = create_metrics();
        let _in_flight = metrics.start("GET", "/");

        let output = metrics.registry().gather().unwrap();
        assert!(output.contains("# TYPE http_requests_in_progress gauge"));
        assert!(output.contains("http_requests_in_progress 1"));
    }

    #[test]
    fn test_new_fails_when_gauge_name_is_taken() {
        let registry = Arc::new(MetricRegistry::new());
        registry
            .counter(REQUESTS_IN_PROGRESS, &Labels::new())
            .unwrap();

        assert!(matches!(
            HttpMetrics::new(registry),
            Err(MetricsError::KindMismatch { .. })
        ));
    }
}
