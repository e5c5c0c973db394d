//! Example: A client interface with a registered fallback
//!
//! `ItemsApi` is implemented over balanced HTTP calls. With the circuit
//! breaker enabled in configuration, the targeter looks up the fallback bean
//! registered for the client and serves cached items whenever the remote
//! call fails.
//!
//! Run with: cargo run --example fallback_client
//!
//! Nothing needs to listen on the configured port; the failed call is what
//! triggers the fallback.

use std::sync::Arc;

use async_trait::async_trait;
use lbclient::http::{Method, Request};
use lbclient::targeter::{AlwaysClosed, CallStrategy};
use lbclient::{
    parse_config, BalancedCallExecutor, BalancedRequest, BeanRegistry, ClientBuilder, ClientError,
    ClientResult, ClientTarget, FallbackTargeter, ReqwestClient,
};

#[async_trait]
trait ItemsApi: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<String>>;
}

/// Remote implementation over the balanced executor
struct HttpItems {
    base_url: String,
    transport: Arc<ReqwestClient>,
    executor: Arc<BalancedCallExecutor>,
}

#[async_trait]
impl ItemsApi for HttpItems {
    async fn list(&self) -> ClientResult<Vec<String>> {
        let request = Request::new(Method::GET, &format!("{}/items", self.base_url))?;
        let mut response = self
            .executor
            .execute_with_load_balancer(BalancedRequest::new(self.transport.clone(), request), None)
            .await?;

        if !response.is_success() {
            response.close()?;
            return Err(ClientError::Parse(format!("unexpected status {}", response.status())));
        }
        match response.payload_mut() {
            Some(payload) => payload.json().await,
            None => Ok(Vec::new()),
        }
    }
}

struct CachedItems;

#[async_trait]
impl ItemsApi for CachedItems {
    async fn list(&self) -> ClientResult<Vec<String>> {
        Ok(vec!["cached-1".to_string(), "cached-2".to_string()])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lbclient::use_logging();

    println!("=== lbclient Fallback Client Example ===\n");

    let config = parse_config(
        r#"
[circuit_breaker]
enabled = true

[clients.items]
connect_timeout_ms = 300
read_timeout_ms = 1000
servers = ["127.0.0.1:1"]
"#,
    )?;

    let client_config = config.client_config("items");
    let transport = Arc::new(ReqwestClient::from_config(&client_config)?);
    let executor = Arc::new(BalancedCallExecutor::from_config(client_config)?);

    let mut registry = BeanRegistry::new();
    registry
        .register("items", CachedItems)
        .exposing(|b| b as Arc<dyn ItemsApi>);

    let builder = ClientBuilder::from_settings(
        &config.circuit_breaker,
        move |target: &ClientTarget| {
            Arc::new(HttpItems {
                base_url: target.url().to_string(),
                transport: transport.clone(),
                executor: executor.clone(),
            }) as Arc<dyn ItemsApi>
        },
        Arc::new(AlwaysClosed),
    );

    let target = ClientTarget::of::<dyn ItemsApi>("items").with_fallback::<CachedItems>();
    let client = FallbackTargeter::new().target(&target, builder, &registry)?;

    println!("Bound with strategy: {:?}", client.strategy());
    assert_eq!(client.strategy(), CallStrategy::WithFallback);

    let items = client
        .call("list", |api: Arc<dyn ItemsApi>| async move { api.list().await })
        .await?;
    println!("Items: {:?}", items);

    Ok(())
}
