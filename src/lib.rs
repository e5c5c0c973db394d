//! lbclient provides the adapters between declarative HTTP clients, a
//! circuit breaker and a client-side load balancer.
//!
//! # Features
//!
//! - **Fallback targeting**: bind a generated client once, either directly or
//!   wrapped so failures fall back to a registered implementation or factory
//! - **Balanced calls**: rewrite logical URIs onto servers picked by a load
//!   balancer, upgrading to a secure scheme where needed
//! - **Retry policy**: idempotent calls may move to another server, mutating
//!   calls stay on the one they started on
//! - **Timeouts**: per-call overrides merged field by field over client defaults
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lbclient::{BalancedCallExecutor, BalancedRequest, ClientConfig, ReqwestClient};
//! use lbclient::http::{Method, Request};
//!
//! async fn example() -> lbclient::ClientResult<()> {
//!     let mut config = ClientConfig::new("items");
//!     config.servers = vec!["10.0.0.5:8080".to_string()];
//!
//!     let transport = Arc::new(ReqwestClient::from_config(&config)?);
//!     let executor = BalancedCallExecutor::from_config(config)?;
//!
//!     let request = Request::new(Method::GET, "http://items/list")?;
//!     let mut response = executor
//!         .execute_with_load_balancer(BalancedRequest::new(transport, request), None)
//!         .await?;
//!
//!     println!("{} from {}", response.status(), response.requested_uri());
//!     response.close()
//! }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod http;
pub mod load_balancer;
pub mod targeter;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use config::{load_config, parse_config, ClientConfig, Config};

pub use errors::{ClientError, ClientResult};

pub use executor::{BalancedCallExecutor, BalancedRequest, BalancedResponse};

pub use http::{HttpClient, ReqwestClient, TimeoutConfig, TimeoutOverride};

pub use load_balancer::{BaseLoadBalancer, LoadBalancer, RetryPolicy, Server};

pub use targeter::{BeanRegistry, ClientBuilder, ClientTarget, FallbackTargeter, TargetedClient};

#[cfg(feature = "metrics")]
pub use metrics::describe_metrics;

/// Initialize the logging system
///
/// This should be called at the start of your application in case
/// you want to activate the library's debug and info logging.
pub fn use_logging() {
    env_logger::init();
}
