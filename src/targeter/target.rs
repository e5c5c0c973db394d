use std::any::type_name;

use crate::constants;
use crate::targeter::registry::BeanType;

/// Fallback configured for a client; at most one kind per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackSpec {
    #[default]
    None,
    /// A bean implementing the client interface itself
    Fallback(BeanType),
    /// A bean producing a fallback per failure
    Factory(BeanType),
}

/// Identity of a generated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTarget {
    name: String,
    context_id: Option<String>,
    url: String,
    interface: &'static str,
    fallback: FallbackSpec,
}

impl ClientTarget {
    /// Target for interface `T` talking to the service `name`.
    ///
    /// The URL defaults to `http://{name}`, the logical address the load
    /// balancer resolves.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            url: format!("http://{}", name),
            name,
            context_id: None,
            interface: type_name::<T>(),
            fallback: FallbackSpec::None,
        }
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Use a registered bean of type `B` as fallback
    pub fn with_fallback<B: 'static>(mut self) -> Self {
        self.fallback = FallbackSpec::Fallback(BeanType::of::<B>());
        self
    }

    /// Use a registered bean of type `B` as fallback factory
    pub fn with_fallback_factory<B: 'static>(mut self) -> Self {
        self.fallback = FallbackSpec::Factory(BeanType::of::<B>());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fallback(&self) -> FallbackSpec {
        self.fallback
    }

    /// Name used for bean lookups: the context id when set, else the name.
    pub fn resolved_name(&self) -> &str {
        match self.context_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.name,
        }
    }

    /// Full type name of the client interface
    pub fn interface(&self) -> &'static str {
        self.interface
    }

    /// Interface name without `dyn` or module path, e.g. `ItemsApi`
    pub fn interface_simple_name(&self) -> &'static str {
        let name = self.interface.trim_start_matches("dyn ");
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }

    /// Key identifying one method of this client, e.g. `ItemsApi#list`
    pub fn method_key(&self, method: &str) -> String {
        format!("{}{}{}", self.interface_simple_name(), constants::METHOD_KEY_SEPARATOR, method)
    }
}
