//! TOML-based global client configuration.
//!
//! Holds the defaults every client starts from (timeouts, retry bounds, the
//! "retry on all operations" switch), the circuit-breaker switch, and
//! per-client overrides.
//!
//! # Example Configuration File
//!
//! ```toml
//! [defaults]
//! connect_timeout_ms = 60000
//! read_timeout_ms = 10000
//! max_auto_retries_next_server = 1
//!
//! [circuit_breaker]
//! enabled = true
//!
//! [clients.items]
//! read_timeout_ms = 2500
//! servers = ["10.0.0.5:8080", "${ITEMS_BACKUP_HOST}"]
//! ```
//!
//! # Environment Variables
//!
//! Server entries can reference environment variables using the `${VAR_NAME}`
//! syntax. These are resolved at load time.

mod types;
mod loader;

pub use types::{Config, Defaults, CircuitBreakerSettings, ClientOverrides, ClientConfig};
pub use loader::{load_config, parse_config};
