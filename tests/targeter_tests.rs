//! Tests for binding clients through the fallback targeter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lbclient::config::CircuitBreakerSettings;
use lbclient::targeter::{
    AlwaysClosed, BuilderKind, CallStrategy, CircuitBreaker, ClientBuilder, ClientTarget, CommandSetter,
    FallbackFactory, FallbackTargeter, SetterFactory,
};
use lbclient::{BeanRegistry, ClientError, ClientResult, TargetedClient};

#[async_trait]
trait ItemsApi: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<String>>;
}

/// Primary implementation that fails or succeeds on demand
struct RemoteItems {
    fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ItemsApi for RemoteItems {
    async fn list(&self) -> ClientResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "items refused",
            )))
        } else {
            Ok(vec!["remote".to_string()])
        }
    }
}

struct CachedItems;

#[async_trait]
impl ItemsApi for CachedItems {
    async fn list(&self) -> ClientResult<Vec<String>> {
        Ok(vec!["cached".to_string()])
    }
}

struct CauseEcho(String);

#[async_trait]
impl ItemsApi for CauseEcho {
    async fn list(&self) -> ClientResult<Vec<String>> {
        Ok(vec![self.0.clone()])
    }
}

struct ItemsFallbackFactory;

impl FallbackFactory<dyn ItemsApi> for ItemsFallbackFactory {
    fn create(&self, cause: &ClientError) -> Arc<dyn ItemsApi> {
        Arc::new(CauseEcho(cause.to_string()))
    }
}

#[derive(Default)]
struct RecordingBreaker {
    open: bool,
    successes: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl CircuitBreaker for RecordingBreaker {
    fn allow_request(&self, _command_key: &str) -> bool {
        !self.open
    }

    fn record_success(&self, command_key: &str) {
        self.successes.lock().unwrap().push(command_key.to_string());
    }

    fn record_failure(&self, command_key: &str) {
        self.failures.lock().unwrap().push(command_key.to_string());
    }
}

struct TightSetterFactory;

impl SetterFactory for TightSetterFactory {
    fn create(&self, target: &ClientTarget, method: &str) -> CommandSetter {
        CommandSetter {
            group_key: format!("tight-{}", target.name()),
            command_key: target.method_key(method),
            timeout: Some(Duration::from_millis(20)),
        }
    }
}

fn remote(fail: bool, calls: &Arc<AtomicUsize>) -> impl Fn(&ClientTarget) -> Arc<dyn ItemsApi> + Send + Sync + 'static {
    let calls = calls.clone();
    move |_target: &ClientTarget| {
        Arc::new(RemoteItems {
            fail,
            delay: None,
            calls: calls.clone(),
        }) as Arc<dyn ItemsApi>
    }
}

async fn list(client: &TargetedClient<dyn ItemsApi>) -> ClientResult<Vec<String>> {
    client.call("list", |api: Arc<dyn ItemsApi>| async move { api.list().await }).await
}

fn target() -> ClientTarget {
    ClientTarget::of::<dyn ItemsApi>("items")
}

// ============================================================================
// Plain Builder Tests
// ============================================================================

#[tokio::test]
async fn test_plain_builder_binds_directly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::plain(remote(true, &calls));
    // Fallback declared but not registered: plain builders never look it up
    let target = target().with_fallback::<CachedItems>();

    let client = FallbackTargeter::new()
        .target(&target, builder, &BeanRegistry::new())
        .unwrap();

    assert_eq!(client.strategy(), CallStrategy::Direct);
    let err = list(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_settings_pick_builder_kind() {
    let calls = Arc::new(AtomicUsize::new(0));
    let disabled = CircuitBreakerSettings { enabled: false };
    let enabled = CircuitBreakerSettings { enabled: true };

    let plain = ClientBuilder::from_settings(&disabled, remote(false, &calls), Arc::new(AlwaysClosed));
    assert!(matches!(plain.kind(), BuilderKind::Plain));
    assert!(!plain.supports_fallback());

    let wrapped = ClientBuilder::from_settings(&enabled, remote(false, &calls), Arc::new(AlwaysClosed));
    assert!(wrapped.supports_fallback());
}

// ============================================================================
// Circuit Breaker Builder Tests
// ============================================================================

#[tokio::test]
async fn test_no_fallback_configured() {
    let calls = Arc::new(AtomicUsize::new(0));
    let breaker = Arc::new(RecordingBreaker::default());
    let builder = ClientBuilder::circuit_breaker(remote(true, &calls), breaker.clone());

    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let client = FallbackTargeter::new().target(&target(), builder, &registry).unwrap();
    assert_eq!(client.strategy(), CallStrategy::Guarded);

    let err = list(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    assert_eq!(*breaker.failures.lock().unwrap(), vec!["ItemsApi#list".to_string()]);
}

#[tokio::test]
async fn test_fallback_used_on_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let breaker = Arc::new(RecordingBreaker::default());
    let builder = ClientBuilder::circuit_breaker(remote(true, &calls), breaker.clone());

    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let client = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &registry)
        .unwrap();
    assert_eq!(client.strategy(), CallStrategy::WithFallback);

    assert_eq!(list(&client).await.unwrap(), vec!["cached"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(breaker.failures.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fallback_not_used_on_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let breaker = Arc::new(RecordingBreaker::default());
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), breaker.clone());

    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let client = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &registry)
        .unwrap();

    assert_eq!(list(&client).await.unwrap(), vec!["remote"]);
    assert_eq!(*breaker.successes.lock().unwrap(), vec!["ItemsApi#list".to_string()]);
    assert!(breaker.failures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fallback_factory_receives_cause() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(true, &calls), Arc::new(AlwaysClosed));

    let mut registry = BeanRegistry::new();
    registry
        .register("items", ItemsFallbackFactory)
        .exposing(|b| b as Arc<dyn FallbackFactory<dyn ItemsApi> + Send + Sync>);

    let client = FallbackTargeter::new()
        .target(&target().with_fallback_factory::<ItemsFallbackFactory>(), builder, &registry)
        .unwrap();
    assert_eq!(client.strategy(), CallStrategy::WithFallbackFactory);

    let result = list(&client).await.unwrap();
    assert!(result[0].contains("items refused"));
}

#[tokio::test]
async fn test_open_circuit_skips_primary() {
    let calls = Arc::new(AtomicUsize::new(0));
    let breaker = Arc::new(RecordingBreaker {
        open: true,
        ..Default::default()
    });

    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let with_fallback = FallbackTargeter::new()
        .target(
            &target().with_fallback::<CachedItems>(),
            ClientBuilder::circuit_breaker(remote(false, &calls), breaker.clone()),
            &registry,
        )
        .unwrap();
    assert_eq!(list(&with_fallback).await.unwrap(), vec!["cached"]);

    let without = FallbackTargeter::new()
        .target(
            &target(),
            ClientBuilder::circuit_breaker(remote(false, &calls), breaker.clone()),
            &registry,
        )
        .unwrap();
    let err = list(&without).await.unwrap_err();
    assert!(matches!(err, ClientError::CircuitOpen(ref key) if key == "ItemsApi#list"));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Registry Lookup Tests
// ============================================================================

#[test]
fn test_missing_fallback_bean() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), Arc::new(AlwaysClosed));

    let err = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &BeanRegistry::new())
        .unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, ClientError::Configuration(_)));
    assert!(msg.contains("No fallback instance of type"));
    assert!(msg.contains("CachedItems"));
    assert!(msg.contains("found for client items"));
}

#[test]
fn test_missing_fallback_factory_bean() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), Arc::new(AlwaysClosed));

    let err = FallbackTargeter::new()
        .target(
            &target().with_fallback_factory::<ItemsFallbackFactory>(),
            builder,
            &BeanRegistry::new(),
        )
        .unwrap_err();

    assert!(err.to_string().contains("No fallbackFactory instance of type"));
}

#[test]
fn test_incompatible_fallback_bean() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), Arc::new(AlwaysClosed));

    // Registered, but never declared usable as the client interface
    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems);

    let err = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &registry)
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Incompatible fallback instance"));
    assert!(msg.contains("is not assignable to"));
    assert!(msg.contains("ItemsApi"));
}

#[test]
fn test_incompatible_fallback_factory_bean() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), Arc::new(AlwaysClosed));

    // A client implementation is not a factory
    let mut registry = BeanRegistry::new();
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let err = FallbackTargeter::new()
        .target(&target().with_fallback_factory::<CachedItems>(), builder, &registry)
        .unwrap_err();

    assert!(err.to_string().contains("Incompatible fallbackFactory instance"));
}

#[tokio::test]
async fn test_context_id_selects_scope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(true, &calls), Arc::new(AlwaysClosed));

    let mut registry = BeanRegistry::new();
    registry.register("items-admin", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let err = FallbackTargeter::new()
        .target(
            &target().with_fallback::<CachedItems>(),
            ClientBuilder::circuit_breaker(remote(true, &calls), Arc::new(AlwaysClosed)),
            &registry,
        )
        .unwrap_err();
    assert!(err.to_string().contains("found for client items"));

    let client = FallbackTargeter::new()
        .target(
            &target().with_context_id("items-admin").with_fallback::<CachedItems>(),
            builder,
            &registry,
        )
        .unwrap();
    assert_eq!(list(&client).await.unwrap(), vec!["cached"]);
}

#[tokio::test]
async fn test_default_scope_is_shared() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(true, &calls), Arc::new(AlwaysClosed));

    let mut registry = BeanRegistry::new();
    registry.register_default(CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let client = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &registry)
        .unwrap();
    assert_eq!(list(&client).await.unwrap(), vec!["cached"]);
}

// ============================================================================
// Setter Factory Tests
// ============================================================================

#[tokio::test]
async fn test_registered_setter_factory_is_installed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let slow_calls = calls.clone();
    let builder = ClientBuilder::circuit_breaker(
        move |_target: &ClientTarget| {
            Arc::new(RemoteItems {
                fail: false,
                delay: Some(Duration::from_secs(5)),
                calls: slow_calls.clone(),
            }) as Arc<dyn ItemsApi>
        },
        Arc::new(AlwaysClosed),
    );

    let mut registry = BeanRegistry::new();
    registry
        .register("items", TightSetterFactory)
        .exposing(|b| b as Arc<dyn SetterFactory + Send + Sync>);
    registry.register("items", CachedItems).exposing(|b| b as Arc<dyn ItemsApi>);

    let client = FallbackTargeter::new()
        .target(&target().with_fallback::<CachedItems>(), builder, &registry)
        .unwrap();

    // The 20ms command timeout cuts the 5s primary short
    assert_eq!(list(&client).await.unwrap(), vec!["cached"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_command_timeout_without_fallback() {
    let calls = Arc::new(AtomicUsize::new(0));
    let slow_calls = calls.clone();
    let builder = ClientBuilder::circuit_breaker(
        move |_target: &ClientTarget| {
            Arc::new(RemoteItems {
                fail: false,
                delay: Some(Duration::from_secs(5)),
                calls: slow_calls.clone(),
            }) as Arc<dyn ItemsApi>
        },
        Arc::new(AlwaysClosed),
    );

    let mut registry = BeanRegistry::new();
    registry
        .register("items", TightSetterFactory)
        .exposing(|b| b as Arc<dyn SetterFactory + Send + Sync>);

    let client = FallbackTargeter::new().target(&target(), builder, &registry).unwrap();

    let err = list(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(limit) if limit == Duration::from_millis(20)));
}

#[test]
fn test_ambiguous_setter_factory() {
    struct OtherSetterFactory;
    impl SetterFactory for OtherSetterFactory {
        fn create(&self, target: &ClientTarget, method: &str) -> CommandSetter {
            CommandSetter {
                group_key: target.name().to_string(),
                command_key: method.to_string(),
                timeout: None,
            }
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let builder = ClientBuilder::circuit_breaker(remote(false, &calls), Arc::new(AlwaysClosed));

    let mut registry = BeanRegistry::new();
    registry
        .register("items", TightSetterFactory)
        .exposing(|b| b as Arc<dyn SetterFactory + Send + Sync>);
    registry
        .register("items", OtherSetterFactory)
        .exposing(|b| b as Arc<dyn SetterFactory + Send + Sync>);

    let err = FallbackTargeter::new().target(&target(), builder, &registry).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}
