use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CircuitBreakerSettings;
use crate::targeter::client::{Fallback, TargetedClient};
use crate::targeter::target::ClientTarget;

/// Circuit-breaker state machine consulted around each wrapped call
///
/// Only the hooks live here; the breaker itself is provided by the caller.
pub trait CircuitBreaker {
    /// Whether the command may run now
    fn allow_request(&self, command_key: &str) -> bool;
    /// Record a successful run
    fn record_success(&self, command_key: &str);
    /// Record a failed run
    fn record_failure(&self, command_key: &str);
}

/// Breaker that never opens
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysClosed;

impl CircuitBreaker for AlwaysClosed {
    fn allow_request(&self, _command_key: &str) -> bool {
        true
    }

    fn record_success(&self, _command_key: &str) {}

    fn record_failure(&self, _command_key: &str) {}
}

/// Keys and limits applied to one wrapped method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSetter {
    pub group_key: String,
    pub command_key: String,
    pub timeout: Option<Duration>,
}

/// Customises how each method of a client is wrapped
pub trait SetterFactory {
    fn create(&self, target: &ClientTarget, method: &str) -> CommandSetter;
}

/// Group by client name, one command per interface method, no timeout
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSetterFactory;

impl SetterFactory for DefaultSetterFactory {
    fn create(&self, target: &ClientTarget, method: &str) -> CommandSetter {
        CommandSetter {
            group_key: target.name().to_string(),
            command_key: target.method_key(method),
            timeout: None,
        }
    }
}

/// Produces the primary implementation of a client interface
pub type ClientFactory<T> = Arc<dyn Fn(&ClientTarget) -> Arc<T> + Send + Sync>;

/// How a builder binds clients
#[derive(Clone)]
pub enum BuilderKind {
    /// Direct binding, no fallback support
    Plain,
    /// Calls wrapped in a circuit breaker, fallbacks supported
    CircuitBreaker {
        breaker: Arc<dyn CircuitBreaker + Send + Sync>,
        setter_factory: Arc<dyn SetterFactory + Send + Sync>,
    },
}

impl fmt::Debug for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderKind::Plain => f.write_str("Plain"),
            BuilderKind::CircuitBreaker { .. } => f.write_str("CircuitBreaker"),
        }
    }
}

/// Binds a [`ClientTarget`] to a callable client
pub struct ClientBuilder<T: ?Sized> {
    kind: BuilderKind,
    factory: ClientFactory<T>,
}

impl<T> ClientBuilder<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Builder producing direct clients only
    pub fn plain<F>(factory: F) -> Self
    where
        F: Fn(&ClientTarget) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            kind: BuilderKind::Plain,
            factory: Arc::new(factory),
        }
    }

    /// Builder wrapping calls in `breaker`
    pub fn circuit_breaker<F>(factory: F, breaker: Arc<dyn CircuitBreaker + Send + Sync>) -> Self
    where
        F: Fn(&ClientTarget) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            kind: BuilderKind::CircuitBreaker {
                breaker,
                setter_factory: Arc::new(DefaultSetterFactory),
            },
            factory: Arc::new(factory),
        }
    }

    /// Picks the builder kind from configuration, once.
    pub fn from_settings<F>(
        settings: &CircuitBreakerSettings,
        factory: F,
        breaker: Arc<dyn CircuitBreaker + Send + Sync>,
    ) -> Self
    where
        F: Fn(&ClientTarget) -> Arc<T> + Send + Sync + 'static,
    {
        if settings.enabled {
            Self::circuit_breaker(factory, breaker)
        } else {
            Self::plain(factory)
        }
    }

    pub fn kind(&self) -> &BuilderKind {
        &self.kind
    }

    pub fn supports_fallback(&self) -> bool {
        matches!(self.kind, BuilderKind::CircuitBreaker { .. })
    }

    /// Replace the setter factory. Ignored by plain builders.
    pub fn set_setter_factory(&mut self, factory: Arc<dyn SetterFactory + Send + Sync>) {
        if let BuilderKind::CircuitBreaker { setter_factory, .. } = &mut self.kind {
            *setter_factory = factory;
        }
    }

    /// Bind without a fallback
    pub fn target(&self, target: &ClientTarget) -> TargetedClient<T> {
        self.bind(target, Fallback::None)
    }

    pub(crate) fn bind(&self, target: &ClientTarget, fallback: Fallback<T>) -> TargetedClient<T> {
        let primary = (self.factory)(target);
        match &self.kind {
            BuilderKind::Plain => TargetedClient::direct(primary),
            BuilderKind::CircuitBreaker { breaker, setter_factory } => TargetedClient::guarded(
                target.clone(),
                primary,
                breaker.clone(),
                setter_factory.clone(),
                fallback,
            ),
        }
    }
}
