use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Method;
use url::Url;

use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::executor::request::BalancedRequest;
use crate::executor::response::BalancedResponse;
use crate::http::{TimeoutConfig, TimeoutOverride};
use crate::load_balancer::introspector::{self, DefaultServerIntrospector, ServerIntrospector};
use crate::load_balancer::{BaseLoadBalancer, LoadBalancer, RetryHandler, RetryPolicy, Server};

/// Executes HTTP calls for one logical client through a load balancer.
///
/// Everything here is fixed at construction and only read afterwards, so a
/// single executor can serve concurrent calls.
pub struct BalancedCallExecutor {
    load_balancer: Arc<dyn LoadBalancer + Send + Sync>,
    client_config: ClientConfig,
    introspector: Arc<dyn ServerIntrospector + Send + Sync>,
    retry_handler: RetryHandler,
    default_timeouts: TimeoutConfig,
}

impl BalancedCallExecutor {
    pub fn new(
        load_balancer: Arc<dyn LoadBalancer + Send + Sync>,
        client_config: ClientConfig,
        introspector: Arc<dyn ServerIntrospector + Send + Sync>,
    ) -> Self {
        let default_timeouts = TimeoutConfig::new(client_config.connect_timeout_ms, client_config.read_timeout_ms);
        let retry_handler = RetryHandler::from_config(&client_config);
        debug!(
            "Executor for '{}': timeouts {:?}, retries {:?}",
            client_config.client_name, default_timeouts, retry_handler
        );
        Self {
            load_balancer,
            client_config,
            introspector,
            retry_handler,
            default_timeouts,
        }
    }

    /// Executor over the client's static server list with the default introspector
    pub fn from_config(client_config: ClientConfig) -> ClientResult<Self> {
        let load_balancer = Arc::new(BaseLoadBalancer::from_config(&client_config)?);
        let introspector = Arc::new(DefaultServerIntrospector::from_config(&client_config));
        Ok(Self::new(load_balancer, client_config, introspector))
    }

    pub fn client_name(&self) -> &str {
        &self.client_config.client_name
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    pub fn load_balancer(&self) -> &Arc<dyn LoadBalancer + Send + Sync> {
        &self.load_balancer
    }

    pub fn default_timeouts(&self) -> TimeoutConfig {
        self.default_timeouts
    }

    /// Override fields win; missing ones come from the client defaults.
    pub fn effective_timeouts(&self, timeout_override: Option<&TimeoutOverride>) -> TimeoutConfig {
        match timeout_override {
            Some(o) => o.merge(self.default_timeouts),
            None => self.default_timeouts,
        }
    }

    /// Send one attempt of `request` as is.
    ///
    /// The request URI must already point at a physical server. Non-200
    /// statuses come back as ordinary responses.
    pub async fn execute(
        &self,
        request: BalancedRequest,
        timeout_override: Option<&TimeoutOverride>,
    ) -> ClientResult<BalancedResponse> {
        let timeouts = self.effective_timeouts(timeout_override);
        let response = request.client().execute(request.request(), &timeouts).await?;
        Ok(BalancedResponse::new(request.uri().clone(), response))
    }

    /// Retry policy for one logical call, decided before the first attempt.
    pub fn request_specific_retry_policy(&self, request: &BalancedRequest) -> RetryPolicy {
        if self.client_config.ok_to_retry_on_all_operations {
            return RetryPolicy::new(true, true, &self.retry_handler);
        }
        if *request.method() != Method::GET {
            RetryPolicy::new(true, false, &self.retry_handler)
        } else {
            RetryPolicy::new(true, true, &self.retry_handler)
        }
    }

    /// Point `original` at `server`, upgrading the scheme first if the server is secure.
    pub fn reconstruct_uri_with_server(&self, server: &Server, original: &Url) -> ClientResult<Url> {
        let mut uri = introspector::update_to_secure_connection_if_needed(
            original,
            &self.client_config,
            self.introspector.as_ref(),
            server,
        )?;

        let host = if server.host().contains(':') {
            format!("[{}]", server.host())
        } else {
            server.host().to_string()
        };
        uri.set_host(Some(host.as_str()))
            .map_err(|e| ClientError::InvalidUri(format!("Cannot bind '{}' to {}: {}", original, server, e)))?;
        uri.set_port(Some(server.port()))
            .map_err(|_| ClientError::InvalidUri(format!("Cannot set port {} on '{}'", server.port(), original)))?;

        debug!("Reconstructed {} -> {}", original, uri);
        Ok(uri)
    }

    /// Run a logical call: pick servers, bind the URI, execute and retry per policy.
    pub async fn execute_with_load_balancer(
        &self,
        request: BalancedRequest,
        timeout_override: Option<&TimeoutOverride>,
    ) -> ClientResult<BalancedResponse> {
        let policy = self.request_specific_retry_policy(&request);
        let mut attempts = 0;
        let mut servers_tried = 0;

        loop {
            let server = self
                .load_balancer
                .choose_server(Some(self.client_name()))
                .ok_or_else(|| ClientError::NoServerAvailable(self.client_name().to_string()))?;
            servers_tried += 1;

            let mut same_server_retries = 0;
            let last_error = loop {
                attempts += 1;
                match self.attempt(&server, &request, timeout_override).await {
                    Ok(response) => return Ok(response),
                    Err(e) => {
                        if same_server_retries < policy.retries_on_same_server() && policy.is_retriable(&e, true) {
                            same_server_retries += 1;
                            #[cfg(feature = "metrics")]
                            crate::metrics::record_retry(self.client_name(), true);
                            info!(
                                "Retrying {} on same server {} ({}/{}): {}",
                                request.uri(), server, same_server_retries, policy.retries_on_same_server(), e
                            );
                            continue;
                        }
                        break e;
                    }
                }
            };

            if servers_tried > policy.retries_on_next_server() || !policy.is_retriable(&last_error, false) {
                if attempts == 1 {
                    return Err(last_error);
                }
                warn!("Giving up on {} after {} attempts", request.uri(), attempts);
                return Err(ClientError::RetriesExhausted {
                    attempts,
                    last: Box::new(last_error),
                });
            }

            #[cfg(feature = "metrics")]
            crate::metrics::record_retry(self.client_name(), false);
            info!("Moving {} off {} to another server: {}", request.uri(), server, last_error);
        }
    }

    async fn attempt(
        &self,
        server: &Server,
        request: &BalancedRequest,
        timeout_override: Option<&TimeoutOverride>,
    ) -> ClientResult<BalancedResponse> {
        let uri = self.reconstruct_uri_with_server(server, request.uri())?;
        let bound = request.with_uri(uri);

        let guard = AttemptGuard::start(self.load_balancer.as_ref(), server);
        let result = self.execute(bound, timeout_override).await;
        let elapsed = guard.elapsed();

        match &result {
            Ok(response) => {
                guard.finish(response.is_success());
                #[cfg(feature = "metrics")]
                crate::metrics::record_call_success(self.client_name(), &server.host_port(), response.status(), elapsed);
            }
            Err(e) => {
                if e.is_server_failure() {
                    guard.finish(false);
                } else {
                    guard.release();
                }
                debug!("Attempt against {} failed after {:?}: {}", server, elapsed, e);
                #[cfg(feature = "metrics")]
                crate::metrics::record_call_failure(self.client_name(), &server.host_port(), e, elapsed);
            }
        }
        result
    }
}

/// Keeps the balancer's in-flight count honest for one attempt.
///
/// An attempt dropped before it finishes (the caller's future was cancelled)
/// is recorded as a failure against its server.
struct AttemptGuard<'a> {
    load_balancer: &'a (dyn LoadBalancer + Send + Sync),
    server: &'a Server,
    start: Instant,
    done: bool,
}

impl<'a> AttemptGuard<'a> {
    fn start(load_balancer: &'a (dyn LoadBalancer + Send + Sync), server: &'a Server) -> Self {
        load_balancer.record_start(server);
        Self {
            load_balancer,
            server,
            start: Instant::now(),
            done: false,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn finish(mut self, success: bool) {
        self.done = true;
        self.load_balancer.record_result(self.server, self.elapsed(), success);
    }

    fn release(mut self) {
        self.done = true;
        self.load_balancer.record_release(self.server);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            debug!("Attempt against {} abandoned after {:?}", self.server, self.elapsed());
            self.load_balancer.record_result(self.server, self.elapsed(), false);
        }
    }
}
