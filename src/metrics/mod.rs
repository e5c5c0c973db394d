//! Metrics module for lbclient
//!
//! This module provides optional metrics emission for balanced calls and
//! fallback invocations. Enable with the `metrics` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use lbclient::metrics::describe_metrics;
//! use metrics_exporter_prometheus::PrometheusBuilder;
//!
//! // User sets up their preferred exporter
//! // Note: requires `metrics-exporter-prometheus` in your dependencies
//! PrometheusBuilder::new()
//!     .with_http_listener(([127, 0, 0, 1], 9090))
//!     .install()
//!     .expect("prometheus setup");
//!
//! describe_metrics();
//! ```

pub mod labels;
mod recorder;

pub use recorder::*;

/// Metric name constants
pub mod names {
    /// Total number of attempts sent to a server
    pub const REQUESTS_TOTAL: &str = "lbclient_requests_total";
    /// Attempt duration in seconds
    pub const REQUEST_DURATION: &str = "lbclient_request_duration_seconds";
    /// Total number of failed attempts by type
    pub const ERRORS_TOTAL: &str = "lbclient_errors_total";
    /// Total number of retries, same or next server
    pub const RETRIES_TOTAL: &str = "lbclient_retries_total";
    /// Total number of fallback invocations
    pub const FALLBACKS_TOTAL: &str = "lbclient_fallbacks_total";
}

/// Describe all metrics with their units and descriptions.
/// Call this after setting up your metrics exporter for better discovery.
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram, Unit};

    describe_counter!(
        names::REQUESTS_TOTAL,
        Unit::Count,
        "Total number of attempts sent to a server"
    );
    describe_histogram!(
        names::REQUEST_DURATION,
        Unit::Seconds,
        "Attempt duration in seconds"
    );
    describe_counter!(
        names::ERRORS_TOTAL,
        Unit::Count,
        "Total number of failed attempts by type"
    );
    describe_counter!(
        names::RETRIES_TOTAL,
        Unit::Count,
        "Total number of retries"
    );
    describe_counter!(
        names::FALLBACKS_TOTAL,
        Unit::Count,
        "Total number of fallback invocations"
    );
}
