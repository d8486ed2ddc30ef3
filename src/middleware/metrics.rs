//! Request metrics interceptor
//!
//! Wraps every request: the pre-phase runs before the inner service is
//! called, the post-phase runs when the response is available. If the request
//! future is dropped first, the [`InFlight`](crate::metrics::InFlight) guard
//! completes the post-phase on drop.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::PathLabel;
use crate::handlers::AppState;

/// Middleware recording `http_requests_in_progress`, `http_request_total`
/// and `http_request_duration_seconds` for each request
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = path_label(state.config().observability.path_label, &request);
    let in_flight = state.metrics().start(request.method().as_str(), path);

    let response = next.run(request).await;

    tracing::trace!(status = %response.status(), "Recording request metrics");
    in_flight.complete(response.status());
    response
}

fn path_label(mode: PathLabel, request: &Request) -> String {
    match mode {
        PathLabel::Raw => request.uri().path().to_string(),
        PathLabel::Matched => request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string()),
    }
}
