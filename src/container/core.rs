use anyhow::anyhow;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::handler::{Handler, SharedHandler};

/// Something a resolver can hand back for a class name.
#[derive(Clone)]
pub enum Service {
    /// A dispatchable handler instance
    Handler(SharedHandler),
    /// Any other registered service; dispatching to it is an invalid-handler
    /// fault
    Other(Arc<dyn Any + Send + Sync>),
}

impl Service {
    pub fn handler<H: Handler>(handler: H) -> Self {
        Service::Handler(SharedHandler::new(handler))
    }

    pub fn as_handler(&self) -> Option<&SharedHandler> {
        match self {
            Service::Handler(h) => Some(h),
            Service::Other(_) => None,
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Handler(h) => f.debug_tuple("Handler").field(h).finish(),
            Service::Other(_) => f.write_str("Other(..)"),
        }
    }
}

/// Maps handler class names to instances for the dispatcher.
pub trait HandlerResolver: Send + Sync {
    /// A named service is registered for `class`.
    fn has(&self, class: &str) -> bool;

    /// `class` can be constructed without a named service.
    fn class_exists(&self, _class: &str) -> bool {
        false
    }

    /// Returns the shared instance for `class`, constructing it on first use.
    fn get_shared(&self, class: &str) -> anyhow::Result<Service>;

    /// Evicts the cached instance so the next lookup constructs a new one.
    fn remove(&self, class: &str);
}

type Factory = Arc<dyn Fn() -> anyhow::Result<Service> + Send + Sync>;

/// In-process [`HandlerResolver`] with named services and constructible
/// classes.
#[derive(Default)]
pub struct Container {
    services: DashMap<String, Factory>,
    classes: DashMap<String, Factory>,
    shared: DashMap<String, Service>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named service factory, replacing any previous definition
    /// and its cached instance.
    pub fn set<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> anyhow::Result<Service> + Send + Sync + 'static,
    {
        if self.services.insert(name.to_string(), Arc::new(factory)).is_some() {
            warn!(service = %name, "Replaced existing service definition");
        }
        self.shared.remove(name);
        debug!(service = %name, total_services = self.services.len(), "Service registered");
    }

    /// Registers a named handler service.
    pub fn set_handler<H, F>(&self, name: &str, factory: F)
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.set(name, move || Ok(Service::handler(factory())));
    }

    /// Registers a class that can be constructed directly when no named
    /// service matches.
    pub fn register_class<H, F>(&self, class: &str, ctor: F)
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Ok(Service::handler(ctor())));
        self.classes.insert(class.to_string(), factory);
        self.shared.remove(class);
    }

    /// Installs a pre-built shared instance under `name`.
    ///
    /// Without a factory for `name`, evicting it makes `name` unresolvable.
    pub fn set_shared(&self, name: &str, service: Service) {
        self.shared.insert(name.to_string(), service);
    }

    /// Whether an instance for `class` is currently cached.
    pub fn is_cached(&self, class: &str) -> bool {
        self.shared.contains_key(class)
    }

    fn factory_for(&self, class: &str) -> Option<Factory> {
        self.services
            .get(class)
            .or_else(|| self.classes.get(class))
            .map(|f| Arc::clone(f.value()))
    }
}

impl HandlerResolver for Container {
    fn has(&self, class: &str) -> bool {
        self.services.contains_key(class) || self.shared.contains_key(class)
    }

    fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn get_shared(&self, class: &str) -> anyhow::Result<Service> {
        if let Some(cached) = self.shared.get(class) {
            return Ok(cached.value().clone());
        }

        // no map guard may be held while the factory runs: it can call back
        // into the container
        let factory = self
            .factory_for(class)
            .ok_or_else(|| anyhow!("service '{class}' is not registered in the container"))?;
        let service = factory()?;

        info!(
            service = %class,
            handler_id = ?service.as_handler().map(SharedHandler::id),
            "Shared service constructed"
        );
        self.shared.insert(class.to_string(), service.clone());
        Ok(service)
    }

    fn remove(&self, class: &str) {
        if self.shared.remove(class).is_some() {
            debug!(service = %class, "Shared instance evicted");
        }
    }
}
