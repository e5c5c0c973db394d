pub mod balancer;
pub mod introspector;
pub mod retry;
pub mod server;
pub mod strategies;
pub mod tracker;

pub use balancer::{BaseLoadBalancer, LoadBalancer};
pub use introspector::{DefaultServerIntrospector, ServerIntrospector, update_to_secure_connection_if_needed};
pub use retry::{RetryHandler, RetryPolicy};
pub use server::Server;
pub use strategies::{LoadBalancingStrategy, RandomStrategy, RoundRobinStrategy};
pub use tracker::{ServerStats, ServerTracker};
