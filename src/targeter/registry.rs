use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{ClientError, ClientResult};

/// Identity of a registered bean type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeanType {
    id: TypeId,
    name: &'static str,
}

impl BeanType {
    pub fn of<B: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<B>(),
            name: type_name::<B>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A registered instance plus the typed views it can be used as.
///
/// A view of `T` exists only if it was declared at registration, which is
/// what makes a bean "assignable" to `T`.
pub struct Bean {
    bean_type: BeanType,
    views: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Bean {
    pub fn bean_type(&self) -> BeanType {
        self.bean_type
    }

    /// The bean as a `T`, if it was registered as one
    pub fn view<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.views
            .get(&TypeId::of::<T>())
            .and_then(|view| view.downcast_ref::<Arc<T>>())
            .cloned()
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("bean_type", &self.bean_type)
            .field("views", &self.views.len())
            .finish()
    }
}

/// Handle returned by registration to declare more views of the bean
pub struct BeanRegistration<'a, B> {
    bean: &'a mut Bean,
    instance: Arc<B>,
}

impl<'a, B> BeanRegistration<'a, B>
where
    B: Send + Sync + 'static,
{
    /// Declare that the bean can be used as a `T`.
    ///
    /// `cast` is usually an unsizing coercion, e.g.
    /// `|b| b as Arc<dyn ItemsApi>`.
    pub fn exposing<T, F>(mut self, cast: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce(Arc<B>) -> Arc<T>,
    {
        let view: Arc<T> = cast(self.instance.clone());
        self.bean.views.insert(TypeId::of::<T>(), Box::new(view));
        self
    }
}

/// Explicit registry of per-client beans.
///
/// Beans live in a scope named after the client; the default scope is shared
/// by every client and consulted only when the named scope has no match.
#[derive(Debug, Default)]
pub struct BeanRegistry {
    scopes: HashMap<String, Vec<Bean>>,
    defaults: Vec<Bean>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bean` for one client
    pub fn register<B>(&mut self, client_name: &str, bean: B) -> BeanRegistration<'_, B>
    where
        B: Send + Sync + 'static,
    {
        let scope = self.scopes.entry(client_name.to_string()).or_default();
        Self::push(scope, bean)
    }

    /// Register `bean` for every client
    pub fn register_default<B>(&mut self, bean: B) -> BeanRegistration<'_, B>
    where
        B: Send + Sync + 'static,
    {
        Self::push(&mut self.defaults, bean)
    }

    fn push<B>(scope: &mut Vec<Bean>, bean: B) -> BeanRegistration<'_, B>
    where
        B: Send + Sync + 'static,
    {
        let instance = Arc::new(bean);
        let mut views: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
        views.insert(TypeId::of::<B>(), Box::new(instance.clone()));

        scope.retain(|existing| existing.bean_type != BeanType::of::<B>());
        scope.push(Bean {
            bean_type: BeanType::of::<B>(),
            views,
        });
        let last = scope.len() - 1;
        BeanRegistration {
            bean: &mut scope[last],
            instance,
        }
    }

    /// The bean of exactly `bean_type` visible to `client_name`
    pub fn get_instance(&self, client_name: &str, bean_type: &BeanType) -> Option<&Bean> {
        let named = self
            .scopes
            .get(client_name)
            .and_then(|beans| beans.iter().find(|b| b.bean_type == *bean_type));
        named.or_else(|| self.defaults.iter().find(|b| b.bean_type == *bean_type))
    }

    /// The single bean usable as a `T` for `client_name`, if any.
    ///
    /// More than one candidate in the same scope is a configuration error.
    pub fn find<T>(&self, client_name: &str) -> ClientResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Some(beans) = self.scopes.get(client_name) {
            if let Some(found) = Self::unique_view::<T>(beans, client_name)? {
                return Ok(Some(found));
            }
        }
        Self::unique_view::<T>(&self.defaults, client_name)
    }

    fn unique_view<T>(beans: &[Bean], client_name: &str) -> ClientResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut matches = beans.iter().filter_map(|b| b.view::<T>().map(|v| (b.bean_type, v)));
        let Some((first_type, first)) = matches.next() else {
            return Ok(None);
        };
        if let Some((second_type, _)) = matches.next() {
            return Err(ClientError::Configuration(format!(
                "Expected a single bean of type {} for client {} but found {} and {}",
                type_name::<T>(),
                client_name,
                first_type,
                second_type
            )));
        }
        Ok(Some(first))
    }
}
