//! Metric recording functions

use std::time::Duration;

use crate::errors::ClientError;

use super::{labels, names};

/// Record an attempt that produced a response (any status)
pub fn record_call_success(client: &str, server: &str, status: u16, duration: Duration) {
    metrics::counter!(
        names::REQUESTS_TOTAL,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::SERVER => server.to_string(),
        labels::keys::STATUS => labels::status_class_label(status)
    )
    .increment(1);

    metrics::histogram!(
        names::REQUEST_DURATION,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::SERVER => server.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record an attempt that failed before producing a response
pub fn record_call_failure(client: &str, server: &str, error: &ClientError, duration: Duration) {
    // Failures still count as requests
    metrics::counter!(
        names::REQUESTS_TOTAL,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::SERVER => server.to_string(),
        labels::keys::STATUS => "error"
    )
    .increment(1);

    metrics::histogram!(
        names::REQUEST_DURATION,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::SERVER => server.to_string()
    )
    .record(duration.as_secs_f64());

    metrics::counter!(
        names::ERRORS_TOTAL,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::SERVER => server.to_string(),
        labels::keys::ERROR_TYPE => labels::error_type_label(error)
    )
    .increment(1);
}

/// Record a retry attempt
pub fn record_retry(client: &str, same_server: bool) {
    metrics::counter!(
        names::RETRIES_TOTAL,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::TARGET => if same_server { "same" } else { "next" }
    )
    .increment(1);
}

/// Record a fallback invocation
pub fn record_fallback(client: &str, command: &str, kind: &'static str) {
    metrics::counter!(
        names::FALLBACKS_TOTAL,
        labels::keys::CLIENT => client.to_string(),
        labels::keys::COMMAND => command.to_string(),
        labels::keys::KIND => kind
    )
    .increment(1);
}
