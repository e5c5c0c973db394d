//! Tests for TOML configuration loading and per-client resolution.

use lbclient::config::{load_config, parse_config, ClientConfig};
use lbclient::BalancedCallExecutor;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// TOML Parsing Tests
// ============================================================================

#[test]
fn test_parse_full_config() {
    let toml = r#"
[defaults]
connect_timeout_ms = 2000
read_timeout_ms = 5000
max_auto_retries = 1
max_auto_retries_next_server = 2
strategy = "random"
secure_ports = [443, 9443]

[circuit_breaker]
enabled = true

[clients.items]
read_timeout_ms = 2500
ok_to_retry_on_all_operations = true
servers = ["10.0.0.5:8080", "10.0.0.6:8080"]

[clients.billing]
is_secure = true
strategy = "round_robin"
servers = ["billing.internal:443"]
"#;

    let config = parse_config(toml).unwrap();
    assert_eq!(config.defaults.connect_timeout_ms, 2000);
    assert_eq!(config.defaults.secure_ports, vec![443, 9443]);
    assert!(config.circuit_breaker.enabled);
    assert_eq!(config.clients.len(), 2);
    assert_eq!(config.clients["items"].servers.len(), 2);
    assert_eq!(config.clients["billing"].is_secure, Some(true));
}

#[test]
fn test_client_config_falls_back_to_defaults() {
    let toml = r#"
[defaults]
connect_timeout_ms = 2000
read_timeout_ms = 5000
max_auto_retries = 1

[clients.items]
read_timeout_ms = 2500
servers = ["10.0.0.5:8080"]
"#;

    let config = parse_config(toml).unwrap();
    let items = config.client_config("items");
    assert_eq!(items.client_name, "items");
    assert_eq!(items.connect_timeout_ms, 2000);
    assert_eq!(items.read_timeout_ms, 2500);
    assert_eq!(items.max_auto_retries, 1);
    assert_eq!(items.max_auto_retries_next_server, 1);
    assert!(!items.ok_to_retry_on_all_operations);
    assert_eq!(items.is_secure, None);
    assert_eq!(items.servers, vec!["10.0.0.5:8080".to_string()]);

    // Unknown clients get the defaults as is
    let other = config.client_config("other");
    assert_eq!(other.read_timeout_ms, 5000);
    assert!(other.servers.is_empty());
}

#[test]
fn test_builtin_defaults() {
    let config = ClientConfig::new("items");
    assert_eq!(config.connect_timeout_ms, 60_000);
    assert_eq!(config.read_timeout_ms, 10_000);
    assert_eq!(config.max_auto_retries, 0);
    assert_eq!(config.max_auto_retries_next_server, 1);
    assert!(!config.ok_to_retry_on_all_operations);
    assert_eq!(config.strategy, "round_robin");
    assert_eq!(config.secure_ports, vec![443, 8443]);
}

#[test]
fn test_resolved_config_drives_executor() {
    let toml = r#"
[clients.items]
connect_timeout_ms = 100
read_timeout_ms = 200
servers = ["10.0.0.5:8080"]
"#;

    let config = parse_config(toml).unwrap();
    let executor = BalancedCallExecutor::from_config(config.client_config("items")).unwrap();
    assert_eq!(executor.client_name(), "items");
    assert_eq!(executor.default_timeouts().connect_timeout_ms, 100);
    assert_eq!(executor.default_timeouts().read_timeout_ms, 200);
    assert_eq!(executor.load_balancer().reachable_servers().len(), 1);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_invalid_toml() {
    let result = parse_config("[defaults\nconnect_timeout_ms = ");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_unknown_client_strategy() {
    let toml = r#"
[clients.items]
strategy = "least_connections"
"#;

    let err = parse_config(toml).unwrap_err().to_string();
    assert!(err.contains("least_connections"));
    assert!(err.contains("clients.items"));
}

#[test]
fn test_invalid_server_entry() {
    let toml = r#"
[clients.items]
servers = ["10.0.0.5:http"]
"#;

    let err = parse_config(toml).unwrap_err().to_string();
    assert!(err.contains("clients.items.servers[0]"));
}

#[test]
fn test_zero_connect_timeout_in_defaults() {
    let toml = r#"
[defaults]
connect_timeout_ms = 0
"#;

    assert!(parse_config(toml).is_err());
}

// ============================================================================
// Environment Variable Resolution Tests
// ============================================================================

#[test]
fn test_env_var_in_server_list() {
    env::set_var("LBCLIENT_TEST_ITEMS_HOST", "10.9.9.9");

    let toml = r#"
[clients.items]
servers = ["${LBCLIENT_TEST_ITEMS_HOST}:8080", "static:9090"]
"#;

    let config = parse_config(toml).unwrap();
    assert_eq!(
        config.clients["items"].servers,
        vec!["10.9.9.9:8080".to_string(), "static:9090".to_string()]
    );

    env::remove_var("LBCLIENT_TEST_ITEMS_HOST");
}

#[test]
fn test_env_var_missing() {
    env::remove_var("LBCLIENT_NONEXISTENT_HOST");

    let toml = r#"
[clients.items]
servers = ["${LBCLIENT_NONEXISTENT_HOST}"]
"#;

    let err = parse_config(toml).unwrap_err().to_string();
    assert!(err.contains("LBCLIENT_NONEXISTENT_HOST"));
}

// ============================================================================
// File Loading Tests
// ============================================================================

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[circuit_breaker]
enabled = true

[clients.items]
servers = ["10.0.0.5:8080"]
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert!(config.circuit_breaker.enabled);
    assert_eq!(config.client_config("items").servers.len(), 1);
}

#[test]
fn test_load_config_missing_file() {
    let err = load_config("/definitely/not/here/clients.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
