//! Prometheus text exposition
//!
//! Encodes gathered metric families in the line-oriented text format scraped
//! by Prometheus (`text/plain; version=0.0.4`).

use super::{MetricsError, MetricsResult};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

/// Content type of the `/metrics` response
pub const TEXT_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Encode metric families in Prometheus text format
///
/// # Errors
///
/// Returns an error if the encoder fails or produces invalid UTF-8.
pub fn encode(metric_families: &[MetricFamily]) -> MetricsResult<String> {
    let metric_count = metric_families.len();

    tracing::debug!(
        metric_family_count = metric_count,
        "Encoding metrics to Prometheus text format"
    );

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    encoder.encode(metric_families, &mut buffer).map_err(|e| {
        tracing::error!(
            error = %e,
            metric_family_count = metric_count,
            "Prometheus text encoder failed"
        );

        MetricsError::Prometheus(prometheus::Error::Msg(format!(
            "Failed to encode {} metric families: {}",
            metric_count, e
        )))
    })?;

    String::from_utf8(buffer).map_err(|e| {
        let valid_up_to = e.utf8_error().valid_up_to();
        let buffer_len = e.as_bytes().len();

        tracing::error!(
            invalid_byte_index = valid_up_to,
            buffer_length = buffer_len,
            "Prometheus encoder produced invalid UTF-8"
        );

        MetricsError::Prometheus(prometheus::Error::Msg(format!(
            "Failed to convert metrics to UTF-8 at byte {}/{}: {}",
            valid_up_to, buffer_len, e
        )))
    })
}
