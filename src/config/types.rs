//! Configuration types for TOML-based configuration.
//!
//! These types map directly to the TOML configuration file structure.
//! [`ClientConfig`] is the resolved view handed to a single client.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::constants;

/// Root configuration structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Global client configuration applied to every client.
    #[serde(default)]
    pub defaults: Defaults,

    /// Circuit-breaker integration switch.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    /// Per-client overrides keyed by client name.
    #[serde(default)]
    pub clients: HashMap<String, ClientOverrides>,
}

/// Global defaults for all clients.
#[derive(Debug, Deserialize, Clone)]
pub struct Defaults {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Allow retries on another server for every HTTP method, not only GET.
    #[serde(default)]
    pub ok_to_retry_on_all_operations: bool,

    /// Retries on the same server, not counting the first attempt.
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: usize,

    /// Number of different servers to try after the first one.
    #[serde(default = "default_max_auto_retries_next_server")]
    pub max_auto_retries_next_server: usize,

    /// Server selection strategy: "round_robin" or "random".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Ports considered secure by the default server introspector.
    #[serde(default = "default_secure_ports")]
    pub secure_ports: Vec<u16>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            ok_to_retry_on_all_operations: constants::DEFAULT_OK_TO_RETRY_ON_ALL_OPERATIONS,
            max_auto_retries: default_max_auto_retries(),
            max_auto_retries_next_server: default_max_auto_retries_next_server(),
            strategy: default_strategy(),
            secure_ports: default_secure_ports(),
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    constants::DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    constants::DEFAULT_READ_TIMEOUT_MS
}

fn default_max_auto_retries() -> usize {
    constants::DEFAULT_MAX_AUTO_RETRIES
}

fn default_max_auto_retries_next_server() -> usize {
    constants::DEFAULT_MAX_AUTO_RETRIES_NEXT_SERVER
}

fn default_strategy() -> String {
    constants::DEFAULT_STRATEGY.to_string()
}

fn default_secure_ports() -> Vec<u16> {
    constants::DEFAULT_SECURE_PORTS.to_vec()
}

/// Circuit-breaker integration settings.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CircuitBreakerSettings {
    /// When false, clients are built plain and fallbacks are never looked up.
    #[serde(default)]
    pub enabled: bool,
}

/// Per-client overrides. Every field falls back to [`Defaults`].
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ClientOverrides {
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub ok_to_retry_on_all_operations: Option<bool>,
    pub max_auto_retries: Option<usize>,
    pub max_auto_retries_next_server: Option<usize>,
    pub strategy: Option<String>,

    /// Forces the secure-scheme decision instead of asking the introspector.
    pub is_secure: Option<bool>,

    /// Static server list, "host:port" entries (supports "${VAR}").
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Fully resolved configuration for one named client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub client_name: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub ok_to_retry_on_all_operations: bool,
    pub max_auto_retries: usize,
    pub max_auto_retries_next_server: usize,
    pub strategy: String,
    pub is_secure: Option<bool>,
    pub secure_ports: Vec<u16>,
    pub servers: Vec<String>,
}

impl ClientConfig {
    /// Configuration built purely from the global defaults.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self::resolve(client_name.into(), &Defaults::default(), None)
    }

    pub(crate) fn resolve(client_name: String, defaults: &Defaults, overrides: Option<&ClientOverrides>) -> Self {
        let empty = ClientOverrides::default();
        let o = overrides.unwrap_or(&empty);
        Self {
            client_name,
            connect_timeout_ms: o.connect_timeout_ms.unwrap_or(defaults.connect_timeout_ms),
            read_timeout_ms: o.read_timeout_ms.unwrap_or(defaults.read_timeout_ms),
            ok_to_retry_on_all_operations: o
                .ok_to_retry_on_all_operations
                .unwrap_or(defaults.ok_to_retry_on_all_operations),
            max_auto_retries: o.max_auto_retries.unwrap_or(defaults.max_auto_retries),
            max_auto_retries_next_server: o
                .max_auto_retries_next_server
                .unwrap_or(defaults.max_auto_retries_next_server),
            strategy: o.strategy.clone().unwrap_or_else(|| defaults.strategy.clone()),
            is_secure: o.is_secure,
            secure_ports: defaults.secure_ports.clone(),
            servers: o.servers.clone(),
        }
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout_ms(mut self, millis: u64) -> Self {
        self.connect_timeout_ms = millis;
        self
    }

    /// Sets the read timeout.
    pub fn with_read_timeout_ms(mut self, millis: u64) -> Self {
        self.read_timeout_ms = millis;
        self
    }

    /// Enables or disables retrying every HTTP method on another server.
    pub fn with_ok_to_retry_on_all_operations(mut self, enabled: bool) -> Self {
        self.ok_to_retry_on_all_operations = enabled;
        self
    }

    /// Sets both retry bounds.
    pub fn with_retries(mut self, same_server: usize, next_server: usize) -> Self {
        self.max_auto_retries = same_server;
        self.max_auto_retries_next_server = next_server;
        self
    }

    /// Forces the secure-scheme decision for every server of this client.
    pub fn with_is_secure(mut self, secure: bool) -> Self {
        self.is_secure = Some(secure);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
