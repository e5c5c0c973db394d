use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Error types for client construction and balanced calls
#[derive(Debug)]
pub enum ClientError {
    /// Error from the HTTP transport
    Transport(reqwest::Error),
    /// I/O error while reading or releasing a response body
    Io(std::io::Error),
    /// The call did not complete within its deadline
    Timeout(Duration),
    /// Fatal misconfiguration detected while building a client
    Configuration(String),
    /// A URI could not be parsed or rebuilt
    InvalidUri(String),
    /// The load balancer had no server to offer
    NoServerAvailable(String),
    /// Every allowed attempt failed; carries the last cause
    RetriesExhausted {
        attempts: usize,
        last: Box<ClientError>,
    },
    /// The circuit breaker rejected the call and no fallback was bound
    CircuitOpen(String),
    /// Response payload could not be decoded
    Parse(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "Transport error: {}", err),
            ClientError::Io(err) => write!(f, "I/O error: {}", err),
            ClientError::Timeout(after) => write!(f, "Call timed out after {:?}", after),
            ClientError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ClientError::InvalidUri(msg) => write!(f, "Invalid URI: {}", msg),
            ClientError::NoServerAvailable(key) => {
                write!(f, "No server available for client '{}'", key)
            }
            ClientError::RetriesExhausted { attempts, last } => {
                write!(f, "Gave up after {} attempts: {}", attempts, last)
            }
            ClientError::CircuitOpen(command) => write!(f, "Circuit open for command {}", command),
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Io(err) => Some(err),
            ClientError::RetriesExhausted { last, .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Configuration(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUri(err.to_string())
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Whether a failed attempt may be repeated at all.
    ///
    /// Only transport-level failures qualify; whether the retry goes to the
    /// same server or another one is decided by the per-call retry policy.
    /// Requests that could not even be built fail the same way everywhere.
    pub fn is_retriable(&self) -> bool {
        match self {
            ClientError::Transport(err) => !err.is_builder(),
            ClientError::Io(_) | ClientError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Failures that count against a server's health in the balancer stats
    pub fn is_server_failure(&self) -> bool {
        match self {
            ClientError::Transport(err) => err.is_connect() || err.is_request(),
            ClientError::Timeout(_) | ClientError::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_retriable() {
        let err = ClientError::Configuration("broken".to_string());
        assert!(!err.is_retriable());
        assert!(!err.is_server_failure());
    }

    #[test]
    fn test_io_errors_are_retriable() {
        let err: ClientError = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(err.is_retriable());
        assert!(err.is_server_failure());
    }

    #[test]
    fn test_builder_errors_are_not_retriable() {
        let err: ClientError = reqwest::Client::new()
            .get("http://items/list")
            .header("bad header", "x")
            .build()
            .unwrap_err()
            .into();
        assert!(!err.is_retriable());
        assert!(!err.is_server_failure());
    }

    #[test]
    fn test_retries_exhausted_exposes_last_cause() {
        let err = ClientError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ClientError::Timeout(Duration::from_millis(10))),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.source().is_some());
    }
}
