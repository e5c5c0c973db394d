//! Binding generated clients to their calling strategy.
//!
//! A [`FallbackTargeter`] runs once per client at construction time. Given a
//! [`ClientBuilder`] (plain or circuit-breaker) and a [`BeanRegistry`], it
//! produces a [`TargetedClient`] that either calls the primary implementation
//! directly or wraps each call and falls back on failure.

pub mod builder;
pub mod client;
mod fallback_targeter;
pub mod registry;
pub mod target;

pub use builder::{
    AlwaysClosed, BuilderKind, CircuitBreaker, ClientBuilder, ClientFactory, CommandSetter,
    DefaultSetterFactory, SetterFactory,
};
pub use client::{CallStrategy, Fallback, FallbackFactory, TargetedClient};
pub use fallback_targeter::FallbackTargeter;
pub use registry::{Bean, BeanRegistration, BeanRegistry, BeanType};
pub use target::{ClientTarget, FallbackSpec};
