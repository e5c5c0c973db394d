use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::{Client, Method};

use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::http::body::ResponseBody;
use crate::http::types::{Headers, Request, Response, TimeoutConfig};

/// Pluggable HTTP transport used by balanced calls
///
/// Implementations send exactly one request and report transport failures as
/// errors; HTTP error statuses are returned as ordinary responses.
#[async_trait]
pub trait HttpClient {
    /// Send one request with the given timeouts
    async fn execute(&self, request: &Request, timeouts: &TimeoutConfig) -> ClientResult<Response>;
}

/// Default transport built on `reqwest`
///
/// The connect timeout is fixed when the underlying client is built; each
/// request gets a total deadline of connect + read timeout.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Create a transport with the given connect timeout
    pub fn new(connect_timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport from a client's resolved configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.connect_timeout())
    }

    /// Wrap an already configured `reqwest::Client`
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn has_body(method: &Method, status: u16) -> bool {
        *method != Method::HEAD && status != 204 && status != 205
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: &Request, timeouts: &TimeoutConfig) -> ClientResult<Response> {
        let deadline = timeouts.total();
        let mut builder = self
            .client
            .request(request.method().clone(), request.uri().clone())
            .timeout(deadline);

        for (name, values) in request.headers().iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }
        if !request.body_bytes().is_empty() {
            builder = builder.body(request.body_bytes().clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(deadline)
            } else {
                ClientError::Transport(e)
            }
        })?;

        let status = response.status();
        let headers = Headers::from(response.headers());
        debug!("{} {} -> {}", request.method(), request.uri(), status);

        let body = if Self::has_body(request.method(), status.as_u16()) {
            let length = response.content_length();
            let stream = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| {
                    if e.is_timeout() {
                        ClientError::Timeout(deadline)
                    } else {
                        ClientError::Transport(e)
                    }
                })
            });
            Some(ResponseBody::from_stream(stream, length))
        } else {
            None
        };

        let mut result = Response::new(status.as_u16(), headers, body);
        if let Some(reason) = status.canonical_reason() {
            result = result.with_reason(reason);
        }
        Ok(result)
    }
}
