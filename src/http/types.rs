use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use url::Url;

use crate::errors::{ClientError, ClientResult};
use crate::http::body::ResponseBody;

/// Ordered header multimap.
///
/// Names keep the spelling they were first added with; lookups ignore case,
/// and values for the same name are merged under the first spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, keeping any values already present for the name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Replaces every value of a name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = values,
            None => self.entries.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// First value of a header, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unordered copy, one entry per header name.
    pub fn to_map(&self) -> HashMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

impl From<&reqwest::header::HeaderMap> for Headers {
    fn from(map: &reqwest::header::HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

/// An HTTP request as produced by a generated client.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: Url,
    headers: Headers,
    body: Bytes,
    charset: Option<String>,
}

impl Request {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: &str) -> ClientResult<Self> {
        let uri = Url::parse(uri).map_err(|e| ClientError::InvalidUri(format!("'{}': {}", uri, e)))?;
        Ok(Self::from_parts(method, uri, Headers::new(), Bytes::new(), None))
    }

    pub fn from_parts(method: Method, uri: Url, headers: Headers, body: Bytes, charset: Option<String>) -> Self {
        Self { method, uri, headers, body, charset }
    }

    /// Adds a header value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the charset the body is encoded with.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Same request aimed at another URI.
    pub fn with_uri(&self, uri: Url) -> Self {
        Self {
            uri,
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn charset_name(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

/// Raw transport response. Owns the body, if the transport produced one.
#[derive(Debug)]
pub struct Response {
    status: u16,
    reason: Option<String>,
    headers: Headers,
    body: Option<ResponseBody>,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: Option<ResponseBody>) -> Self {
        Self { status, reason: None, headers, body }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut ResponseBody> {
        self.body.as_mut()
    }
}

/// Effective connect/read timeouts of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl TimeoutConfig {
    pub fn new(connect_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        Self { connect_timeout_ms, read_timeout_ms }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Longest a single attempt may block.
    pub fn total(&self) -> Duration {
        self.connect_timeout() + self.read_timeout()
    }
}

/// Per-call timeout override; absent fields keep the client defaults.
///
/// With [`ReqwestClient`](crate::http::ReqwestClient) the connect phase is fixed
/// when the client is built, so `connect_timeout_ms` only changes the total
/// deadline of the attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutOverride {
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
}

impl TimeoutOverride {
    pub fn connect(millis: u64) -> Self {
        Self { connect_timeout_ms: Some(millis), read_timeout_ms: None }
    }

    pub fn read(millis: u64) -> Self {
        Self { connect_timeout_ms: None, read_timeout_ms: Some(millis) }
    }

    pub fn with_read(mut self, millis: u64) -> Self {
        self.read_timeout_ms = Some(millis);
        self
    }

    pub fn with_connect(mut self, millis: u64) -> Self {
        self.connect_timeout_ms = Some(millis);
        self
    }

    /// Merge over defaults, field by field.
    pub fn merge(&self, defaults: TimeoutConfig) -> TimeoutConfig {
        TimeoutConfig {
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(defaults.connect_timeout_ms),
            read_timeout_ms: self.read_timeout_ms.unwrap_or(defaults.read_timeout_ms),
        }
    }
}
