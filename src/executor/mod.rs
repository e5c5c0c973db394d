//! Load-balanced call execution.
//!
//! [`BalancedCallExecutor`] turns a logical request (`http://items/list`) into
//! attempts against physical servers chosen by a
//! [`LoadBalancer`](crate::load_balancer::LoadBalancer), with per-call timeout
//! merging and a method-dependent retry policy.

mod balanced;
mod request;
mod response;

pub use balanced::BalancedCallExecutor;
pub use request::{to_http_request_view, BalancedRequest, HttpRequestView};
pub use response::BalancedResponse;
