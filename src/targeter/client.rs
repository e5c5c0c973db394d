use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};

use crate::errors::{ClientError, ClientResult};
use crate::targeter::builder::{CircuitBreaker, SetterFactory};
use crate::targeter::target::ClientTarget;

/// Produces a fallback for one failed call, given what went wrong
pub trait FallbackFactory<T: ?Sized> {
    fn create(&self, cause: &ClientError) -> Arc<T>;
}

/// Fallback bound to a wrapped client
pub enum Fallback<T: ?Sized> {
    None,
    Instance(Arc<T>),
    Factory(Arc<dyn FallbackFactory<T> + Send + Sync>),
}

/// Calling strategy a client was bound with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStrategy {
    /// Calls go straight to the primary implementation
    Direct,
    /// Calls are wrapped by the circuit breaker, errors surface as is
    Guarded,
    /// Wrapped, with a fixed fallback instance
    WithFallback,
    /// Wrapped, with a fallback created per failure
    WithFallbackFactory,
}

enum Binding<T: ?Sized> {
    Direct,
    Guarded {
        target: ClientTarget,
        breaker: Arc<dyn CircuitBreaker + Send + Sync>,
        setter_factory: Arc<dyn SetterFactory + Send + Sync>,
        fallback: Fallback<T>,
    },
}

/// A generated client bound to its calling strategy.
///
/// The strategy is fixed when the client is built and never changes.
pub struct TargetedClient<T: ?Sized> {
    primary: Arc<T>,
    binding: Binding<T>,
}

impl<T> TargetedClient<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn direct(primary: Arc<T>) -> Self {
        Self {
            primary,
            binding: Binding::Direct,
        }
    }

    pub(crate) fn guarded(
        target: ClientTarget,
        primary: Arc<T>,
        breaker: Arc<dyn CircuitBreaker + Send + Sync>,
        setter_factory: Arc<dyn SetterFactory + Send + Sync>,
        fallback: Fallback<T>,
    ) -> Self {
        Self {
            primary,
            binding: Binding::Guarded {
                target,
                breaker,
                setter_factory,
                fallback,
            },
        }
    }

    pub fn strategy(&self) -> CallStrategy {
        match &self.binding {
            Binding::Direct => CallStrategy::Direct,
            Binding::Guarded { fallback, .. } => match fallback {
                Fallback::None => CallStrategy::Guarded,
                Fallback::Instance(_) => CallStrategy::WithFallback,
                Fallback::Factory(_) => CallStrategy::WithFallbackFactory,
            },
        }
    }

    /// The primary implementation, bypassing any wrapping
    pub fn primary(&self) -> &Arc<T> {
        &self.primary
    }

    /// Invoke `method` through the bound strategy.
    ///
    /// `invoke` receives the implementation to run against: the primary first,
    /// then the fallback if the primary failed or the breaker is open.
    pub async fn call<R, F, Fut>(&self, method: &str, invoke: F) -> ClientResult<R>
    where
        F: Fn(Arc<T>) -> Fut,
        Fut: Future<Output = ClientResult<R>>,
    {
        let Binding::Guarded { target, breaker, setter_factory, fallback } = &self.binding else {
            return invoke(self.primary.clone()).await;
        };

        let setter = setter_factory.create(target, method);
        let key = setter.command_key.as_str();

        let outcome = if !breaker.allow_request(key) {
            debug!("Circuit open for {} ({})", key, setter.group_key);
            Err(ClientError::CircuitOpen(key.to_string()))
        } else {
            let result = match setter.timeout {
                Some(limit) => tokio::time::timeout(limit, invoke(self.primary.clone()))
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Timeout(limit))),
                None => invoke(self.primary.clone()).await,
            };
            match &result {
                Ok(_) => breaker.record_success(key),
                Err(_) => breaker.record_failure(key),
            }
            result
        };

        let cause = match outcome {
            Ok(value) => return Ok(value),
            Err(cause) => cause,
        };

        match fallback {
            Fallback::None => Err(cause),
            Fallback::Instance(instance) => {
                warn!("{} failed, using fallback: {}", key, cause);
                #[cfg(feature = "metrics")]
                crate::metrics::record_fallback(target.resolved_name(), key, "instance");
                invoke(instance.clone()).await
            }
            Fallback::Factory(factory) => {
                warn!("{} failed, using fallback factory: {}", key, cause);
                #[cfg(feature = "metrics")]
                crate::metrics::record_fallback(target.resolved_name(), key, "factory");
                invoke(factory.create(&cause)).await
            }
        }
    }
}

impl<T: ?Sized> fmt::Debug for TargetedClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = match &self.binding {
            Binding::Direct => "Direct",
            Binding::Guarded { fallback: Fallback::None, .. } => "Guarded",
            Binding::Guarded { fallback: Fallback::Instance(_), .. } => "WithFallback",
            Binding::Guarded { fallback: Fallback::Factory(_), .. } => "WithFallbackFactory",
        };
        f.debug_struct("TargetedClient").field("binding", &binding).finish()
    }
}
