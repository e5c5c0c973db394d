//! HTTP request/response model and the transport seam.
//!
//! Generated clients produce [`Request`] values; an [`HttpClient`] turns them
//! into [`Response`] values whose [`ResponseBody`] owns the connection until
//! released.

pub mod body;
pub mod transport;
pub mod types;

pub use body::{ByteStream, ResponseBody};
pub use transport::{HttpClient, ReqwestClient};
pub use types::{Headers, Request, Response, TimeoutConfig, TimeoutOverride};

pub use reqwest::Method;
