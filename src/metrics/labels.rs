//! Label helpers for consistent metric labeling

use crate::errors::ClientError;

/// Standard label keys
pub mod keys {
    /// Logical client name label key
    pub const CLIENT: &str = "client";
    /// Physical server ("host:port") label key
    pub const SERVER: &str = "server";
    /// Status class label key ("2xx", "5xx", ...)
    pub const STATUS: &str = "status";
    /// Error type label key
    pub const ERROR_TYPE: &str = "error_type";
    /// Retry target label key ("same" or "next")
    pub const TARGET: &str = "target";
    /// Command key label key
    pub const COMMAND: &str = "command";
    /// Fallback kind label key ("instance" or "factory")
    pub const KIND: &str = "kind";
}

/// Collapse a status code into its class, e.g. 404 -> "4xx"
pub fn status_class_label(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Convert ClientError to error type label string
pub fn error_type_label(error: &ClientError) -> &'static str {
    match error {
        ClientError::Transport(_) => "transport",
        ClientError::Io(_) => "io",
        ClientError::Timeout(_) => "timeout",
        ClientError::Configuration(_) => "configuration",
        ClientError::InvalidUri(_) => "invalid_uri",
        ClientError::NoServerAvailable(_) => "no_server",
        ClientError::RetriesExhausted { .. } => "retries_exhausted",
        ClientError::CircuitOpen(_) => "circuit_open",
        ClientError::Parse(_) => "parse",
    }
}
