use url::Url;

use crate::errors::ClientResult;
use crate::http::{Headers, Response, ResponseBody};

/// Transport response paired with the URI that was requested.
///
/// Owns the response body. [`close`](BalancedResponse::close) releases it
/// once; dropping the response releases it as well.
#[derive(Debug)]
pub struct BalancedResponse {
    requested_uri: Url,
    response: Response,
}

impl BalancedResponse {
    pub fn new(requested_uri: Url, response: Response) -> Self {
        Self { requested_uri, response }
    }

    pub fn status(&self) -> u16 {
        self.response.status()
    }

    /// Only 200 counts; 201, 204 and the rest of 2xx do not.
    pub fn is_success(&self) -> bool {
        self.response.status() == 200
    }

    pub fn has_payload(&self) -> bool {
        self.response.body().is_some()
    }

    pub fn payload(&self) -> Option<&ResponseBody> {
        self.response.body()
    }

    pub fn payload_mut(&mut self) -> Option<&mut ResponseBody> {
        self.response.body_mut()
    }

    pub fn headers(&self) -> &Headers {
        self.response.headers()
    }

    pub fn requested_uri(&self) -> &Url {
        &self.requested_uri
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    /// Release the body. No-op without one.
    pub fn close(&mut self) -> ClientResult<()> {
        match self.response.body_mut() {
            Some(body) => body.close(),
            None => Ok(()),
        }
    }
}
