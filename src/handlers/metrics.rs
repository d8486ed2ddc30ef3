//! Prometheus metrics endpoint
//!
//! Exposes the metric registry in Prometheus text format for scraping.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::handlers::AppState;
use crate::metrics::TEXT_CONTENT_TYPE;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if encoding fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/metrics
/// # HELP http_request_total Total number of HTTP requests
/// # TYPE http_request_total counter
/// http_request_total{method="GET",path="/",status="200"} 3
/// ```
pub async fn handler(State(state): State<AppState>) -> Response {
    match state.metrics().registry().gather() {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            output,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to gather metrics for Prometheus scraping"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Failed to gather metrics: {}", e),
            )
                .into_response()
        }
    }
}
