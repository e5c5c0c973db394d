use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use url::Url;

use crate::http::{HttpClient, Request};

/// A request travelling through the load balancer together with the
/// transport that will send it.
///
/// The URI starts out logical (`http://service-a/items`); binding a server
/// produces a new value with a physical URI and leaves this one unchanged.
#[derive(Clone)]
pub struct BalancedRequest {
    client: Arc<dyn HttpClient + Send + Sync>,
    request: Request,
}

impl BalancedRequest {
    pub fn new(client: Arc<dyn HttpClient + Send + Sync>, request: Request) -> Self {
        Self { client, request }
    }

    /// Same request aimed at `uri`
    pub fn with_uri(&self, uri: Url) -> Self {
        Self {
            client: self.client.clone(),
            request: self.request.with_uri(uri),
        }
    }

    pub fn uri(&self) -> &Url {
        self.request.uri()
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn client(&self) -> &Arc<dyn HttpClient + Send + Sync> {
        &self.client
    }

    /// Generic view of the request for interceptors and signers.
    pub fn to_http_request_view(&self) -> HttpRequestView {
        to_http_request_view(&self.request)
    }
}

impl fmt::Debug for BalancedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BalancedRequest")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Method, URI and headers of a request, detached from its body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestView {
    pub method: Method,
    pub uri: Url,
    pub headers: HashMap<String, Vec<String>>,
}

pub fn to_http_request_view(request: &Request) -> HttpRequestView {
    HttpRequestView {
        method: request.method().clone(),
        uri: request.uri().clone(),
        headers: request.headers().to_map(),
    }
}
