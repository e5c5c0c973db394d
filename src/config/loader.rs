//! Configuration file loading and environment variable resolution.

use std::env;
use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use super::types::{ClientConfig, Config};
use crate::errors::{ClientError, ClientResult};
use crate::load_balancer::Server;

const VALID_STRATEGIES: [&str; 2] = ["round_robin", "random"];

/// Load and parse a TOML configuration file.
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// * `ClientResult<Config>` - Parsed configuration with environment variables resolved
///
/// # Example
/// ```no_run
/// use lbclient::config::load_config;
///
/// let config = load_config("clients.toml").unwrap();
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> ClientResult<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        ClientError::Configuration(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&content)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> ClientResult<Config> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| ClientError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    resolve_env_vars(&mut config)?;
    validate_config(&config)?;

    debug!("Loaded configuration for {} client(s)", config.clients.len());
    Ok(config)
}

impl Config {
    /// Resolve the configuration of one client over the global defaults.
    ///
    /// Clients without a `[clients.<name>]` section get the defaults as is.
    pub fn client_config(&self, client_name: &str) -> ClientConfig {
        ClientConfig::resolve(
            client_name.to_string(),
            &self.defaults,
            self.clients.get(client_name),
        )
    }
}

/// Resolve `${VAR_NAME}` references in server lists.
fn resolve_env_vars(config: &mut Config) -> ClientResult<()> {
    let env_var_pattern = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ClientError::Configuration(format!("Invalid env pattern: {}", e)))?;

    for (name, client) in config.clients.iter_mut() {
        for (idx, server) in client.servers.iter_mut().enumerate() {
            match resolve_env_var_string(server, &env_var_pattern) {
                Ok(Some(resolved)) => *server = resolved,
                Ok(None) => {}
                Err(ClientError::Configuration(msg)) => {
                    return Err(ClientError::Configuration(format!(
                        "{}\n  → Referenced in clients.{}.servers[{}]",
                        msg, name, idx
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}

/// Returns None if no env vars are present, Some(resolved) if all resolved successfully.
fn resolve_env_var_string(s: &str, pattern: &Regex) -> ClientResult<Option<String>> {
    if !pattern.is_match(s) {
        return Ok(None);
    }

    let mut result = s.to_string();

    for caps in pattern.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        match env::var(var_name.as_str()) {
            Ok(value) => {
                result = result.replace(full_match.as_str(), &value);
            }
            Err(_) => {
                return Err(ClientError::Configuration(format!(
                    "Environment variable '{}' not found\n  \
                     → Set it with: export {}=\"host:port\"",
                    var_name.as_str(),
                    var_name.as_str()
                )));
            }
        }
    }

    Ok(Some(result))
}

/// Validate the configuration for consistency.
fn validate_config(config: &Config) -> ClientResult<()> {
    validate_strategy(&config.defaults.strategy, "defaults")?;
    validate_timeouts(config.defaults.connect_timeout_ms, config.defaults.read_timeout_ms, "defaults")?;

    for (name, client) in &config.clients {
        let scope = format!("clients.{}", name);
        if let Some(ref strategy) = client.strategy {
            validate_strategy(strategy, &scope)?;
        }
        validate_timeouts(
            client.connect_timeout_ms.unwrap_or(config.defaults.connect_timeout_ms),
            client.read_timeout_ms.unwrap_or(config.defaults.read_timeout_ms),
            &scope,
        )?;

        for (idx, entry) in client.servers.iter().enumerate() {
            entry.parse::<Server>().map_err(|e| {
                ClientError::Configuration(format!(
                    "Invalid server '{}' in {}.servers[{}]: {}",
                    entry, scope, idx, e
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_strategy(strategy: &str, scope: &str) -> ClientResult<()> {
    let lowered = strategy.to_lowercase();
    if !VALID_STRATEGIES.contains(&lowered.as_str()) {
        return Err(ClientError::Configuration(format!(
            "Unknown strategy '{}' in {}\n  \
             → Valid strategies: {}",
            strategy,
            scope,
            VALID_STRATEGIES.join(", ")
        )));
    }
    Ok(())
}

fn validate_timeouts(connect_ms: u64, read_ms: u64, scope: &str) -> ClientResult<()> {
    if connect_ms == 0 || read_ms == 0 {
        return Err(ClientError::Configuration(format!(
            "Timeouts in {} must be greater than zero",
            scope
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.defaults.connect_timeout_ms, 60_000);
        assert_eq!(config.defaults.read_timeout_ms, 10_000);
        assert!(!config.defaults.ok_to_retry_on_all_operations);
        assert!(!config.circuit_breaker.enabled);
        assert!(config.clients.is_empty());
    }

    #[test]
    fn test_env_var_resolution_in_servers() {
        env::set_var("LBCLIENT_LOADER_TEST_HOST", "10.1.2.3:9000");

        let toml = r#"
[clients.items]
servers = ["${LBCLIENT_LOADER_TEST_HOST}"]
"#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.clients["items"].servers, vec!["10.1.2.3:9000".to_string()]);

        env::remove_var("LBCLIENT_LOADER_TEST_HOST");
    }

    #[test]
    fn test_missing_env_var_names_location() {
        let toml = r#"
[clients.items]
servers = ["${LBCLIENT_LOADER_TEST_MISSING}"]
"#;

        let err = parse_config(toml).unwrap_err().to_string();
        assert!(err.contains("LBCLIENT_LOADER_TEST_MISSING"));
        assert!(err.contains("clients.items.servers[0]"));
    }

    #[test]
    fn test_invalid_strategy() {
        let toml = r#"
[defaults]
strategy = "weighted"
"#;

        let err = parse_config(toml).unwrap_err().to_string();
        assert!(err.contains("Unknown strategy"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml = r#"
[clients.items]
read_timeout_ms = 0
"#;

        assert!(parse_config(toml).is_err());
    }
}
