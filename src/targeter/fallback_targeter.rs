use std::any::type_name;
use std::sync::Arc;

use log::{debug, info};

use crate::errors::{ClientError, ClientResult};
use crate::targeter::builder::{ClientBuilder, SetterFactory};
use crate::targeter::client::{Fallback, FallbackFactory, TargetedClient};
use crate::targeter::registry::{BeanRegistry, BeanType};
use crate::targeter::target::{ClientTarget, FallbackSpec};

/// Decides, once per generated client, how its calls are dispatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackTargeter;

impl FallbackTargeter {
    pub fn new() -> Self {
        Self
    }

    /// Bind `target` through `builder`, attaching the configured fallback.
    ///
    /// Plain builders bind directly and never touch the registry. A missing
    /// or incompatible fallback bean is a configuration error.
    pub fn target<T>(
        &self,
        target: &ClientTarget,
        mut builder: ClientBuilder<T>,
        registry: &BeanRegistry,
    ) -> ClientResult<TargetedClient<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if !builder.supports_fallback() {
            debug!("Client '{}' bound directly (no circuit breaker)", target.name());
            return Ok(builder.target(target));
        }

        let name = target.resolved_name();
        if let Some(setter_factory) = registry.find::<dyn SetterFactory + Send + Sync>(name)? {
            debug!("Installing custom setter factory for client '{}'", name);
            builder.set_setter_factory(setter_factory);
        }

        match target.fallback() {
            FallbackSpec::Fallback(bean_type) => {
                let instance = get_from_registry::<T>("fallback", name, registry, &bean_type)?;
                info!("Client '{}' bound with fallback {}", name, bean_type);
                Ok(builder.bind(target, Fallback::Instance(instance)))
            }
            FallbackSpec::Factory(bean_type) => {
                let factory = get_from_registry::<dyn FallbackFactory<T> + Send + Sync>(
                    "fallbackFactory",
                    name,
                    registry,
                    &bean_type,
                )?;
                info!("Client '{}' bound with fallback factory {}", name, bean_type);
                Ok(builder.bind(target, Fallback::Factory(factory)))
            }
            FallbackSpec::None => Ok(builder.target(target)),
        }
    }
}

fn get_from_registry<V>(
    mechanism: &str,
    client_name: &str,
    registry: &BeanRegistry,
    bean_type: &BeanType,
) -> ClientResult<Arc<V>>
where
    V: ?Sized + Send + Sync + 'static,
{
    let bean = registry.get_instance(client_name, bean_type).ok_or_else(|| {
        ClientError::Configuration(format!(
            "No {} instance of type {} found for client {}",
            mechanism, bean_type, client_name
        ))
    })?;

    bean.view::<V>().ok_or_else(|| {
        ClientError::Configuration(format!(
            "Incompatible {} instance. Fallback/fallbackFactory of type {} is not assignable to {} for client {}",
            mechanism,
            bean_type,
            type_name::<V>(),
            client_name
        ))
    })
}
