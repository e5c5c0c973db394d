use crate::config::ClientConfig;
use crate::constants;
use crate::errors::ClientError;

/// Global retry bounds of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryHandler {
    /// Retries on the server that just failed, not counting the first attempt
    pub max_retries_same_server: usize,
    /// Number of other servers to move on to
    pub max_retries_next_server: usize,
}

impl RetryHandler {
    pub fn new(max_retries_same_server: usize, max_retries_next_server: usize) -> Self {
        Self { max_retries_same_server, max_retries_next_server }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_auto_retries, config.max_auto_retries_next_server)
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_MAX_AUTO_RETRIES,
            constants::DEFAULT_MAX_AUTO_RETRIES_NEXT_SERVER,
        )
    }
}

/// Retry decision for one logical call.
///
/// The bounds are copied from the [`RetryHandler`] unchanged; the two flags
/// gate whether each bound may be used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_on_same_server: bool,
    pub retry_on_next_server: bool,
    pub max_retries_same_server: usize,
    pub max_retries_next_server: usize,
}

impl RetryPolicy {
    pub fn new(retry_on_same_server: bool, retry_on_next_server: bool, handler: &RetryHandler) -> Self {
        Self {
            retry_on_same_server,
            retry_on_next_server,
            max_retries_same_server: handler.max_retries_same_server,
            max_retries_next_server: handler.max_retries_next_server,
        }
    }

    /// Whether `error` may be retried, on the same server or on another one
    pub fn is_retriable(&self, error: &ClientError, same_server: bool) -> bool {
        if !error.is_retriable() {
            return false;
        }
        if same_server {
            self.retry_on_same_server
        } else {
            self.retry_on_next_server
        }
    }

    /// Retries actually allowed on one server
    pub fn retries_on_same_server(&self) -> usize {
        if self.retry_on_same_server {
            self.max_retries_same_server
        } else {
            0
        }
    }

    /// Server switches actually allowed
    pub fn retries_on_next_server(&self) -> usize {
        if self.retry_on_next_server {
            self.max_retries_next_server
        } else {
            0
        }
    }
}
