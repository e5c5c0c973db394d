//! Example: Balanced calls over a static server list
//!
//! This example loads a client configuration from inline TOML, then sends a
//! few GET requests to the logical address `http://items/...`. Each request is
//! bound to one of the configured servers; a refused connection moves the
//! call on to the next server.
//!
//! Run with: cargo run --example balanced_call
//!
//! Point it at your own servers with:
//! - ITEMS_PRIMARY (default "127.0.0.1:8080")
//! - ITEMS_BACKUP  (default "127.0.0.1:8081")

use std::env;
use std::sync::Arc;

use lbclient::http::{Method, Request};
use lbclient::{parse_config, BalancedCallExecutor, BalancedRequest, ReqwestClient, TimeoutOverride};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    lbclient::use_logging();

    println!("=== lbclient Balanced Call Example ===\n");

    set_default_env("ITEMS_PRIMARY", "127.0.0.1:8080");
    set_default_env("ITEMS_BACKUP", "127.0.0.1:8081");

    let config = parse_config(
        r#"
[defaults]
connect_timeout_ms = 1000
read_timeout_ms = 3000

[clients.items]
max_auto_retries_next_server = 1
servers = ["${ITEMS_PRIMARY}", "${ITEMS_BACKUP}"]
"#,
    )?;

    let client_config = config.client_config("items");
    println!("Servers: {:?}\n", client_config.servers);

    let transport = Arc::new(ReqwestClient::from_config(&client_config)?);
    let executor = BalancedCallExecutor::from_config(client_config)?;

    for path in ["/items", "/items?page=2", "/health"] {
        let request = Request::new(Method::GET, &format!("http://items{}", path))?
            .header("Accept", "application/json");
        let balanced = BalancedRequest::new(transport.clone(), request);

        // Health checks get a tighter read timeout than the client default
        let timeout = (path == "/health").then(|| TimeoutOverride::read(500));

        match executor.execute_with_load_balancer(balanced, timeout.as_ref()).await {
            Ok(mut response) => {
                let body = match response.payload_mut() {
                    Some(payload) => payload.text().await.unwrap_or_default(),
                    None => String::new(),
                };
                println!(
                    "{} -> {} (success: {}) {} bytes",
                    response.requested_uri(),
                    response.status(),
                    response.is_success(),
                    body.len()
                );
                response.close()?;
            }
            Err(e) => println!("{} failed: {}", path, e),
        }
    }

    println!("\n--- Server stats ---\n");
    for stats in executor.load_balancer().stats() {
        println!(
            "{}: {} requests, {:.1}% errors, avg {:?}",
            stats.server, stats.request_count, stats.error_rate, stats.avg_response_time
        );
    }

    Ok(())
}

fn set_default_env(name: &str, value: &str) {
    if env::var(name).is_err() {
        env::set_var(name, value);
    }
}
