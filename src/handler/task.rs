use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Handler;
use crate::config::DEFAULT_ACTION_SUFFIX;
use crate::dispatcher::Dispatcher;
use crate::events::Signal;
use crate::naming::{camelize, lcfirst};

type ActionFn = Arc<dyn Fn(&mut Dispatcher, &[Value]) -> anyhow::Result<Value> + Send + Sync>;
type InitFn = Arc<dyn Fn(&mut Dispatcher) -> anyhow::Result<()> + Send + Sync>;
type HookFn = Arc<dyn Fn(&mut Dispatcher) -> anyhow::Result<Signal> + Send + Sync>;
type AfterExecuteFn = Arc<dyn Fn(&mut Dispatcher, &Value) -> anyhow::Result<Signal> + Send + Sync>;

/// Handler assembled from closures, keyed by method name.
#[derive(Clone, Default)]
pub struct TaskHandler {
    name: String,
    methods: HashMap<String, ActionFn>,
    initialize: Option<InitFn>,
    before_execute_route: Option<HookFn>,
    after_binding: Option<HookFn>,
    after_execute_route: Option<AfterExecuteFn>,
}

impl TaskHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers an action under its conventional method name:
    /// `"list_all"` becomes `"listAllAction"`.
    pub fn action<F>(self, action: &str, f: F) -> Self
    where
        F: Fn(&mut Dispatcher, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let method = format!("{}{}", lcfirst(&camelize(action)), DEFAULT_ACTION_SUFFIX);
        self.method(method, f)
    }

    /// Registers a method under an exact name, for non-default suffixes.
    pub fn method<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Dispatcher, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), Arc::new(f));
        self
    }

    pub fn on_initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Dispatcher) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(f));
        self
    }

    pub fn on_before_execute_route<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Dispatcher) -> anyhow::Result<Signal> + Send + Sync + 'static,
    {
        self.before_execute_route = Some(Arc::new(f));
        self
    }

    pub fn on_after_binding<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Dispatcher) -> anyhow::Result<Signal> + Send + Sync + 'static,
    {
        self.after_binding = Some(Arc::new(f));
        self
    }

    pub fn on_after_execute_route<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Dispatcher, &Value) -> anyhow::Result<Signal> + Send + Sync + 'static,
    {
        self.after_execute_route = Some(Arc::new(f));
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl Handler for TaskHandler {
    fn has_action(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn call_action(
        &self,
        method: &str,
        args: &[Value],
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Value> {
        let f = self.methods.get(method).ok_or_else(|| {
            anyhow::anyhow!("method '{method}' is not defined on '{}'", self.name)
        })?;
        f(dispatcher, args)
    }

    fn initialize(&self, dispatcher: &mut Dispatcher) -> anyhow::Result<()> {
        match &self.initialize {
            Some(f) => f(dispatcher),
            None => Ok(()),
        }
    }

    fn before_execute_route(&self, dispatcher: &mut Dispatcher) -> anyhow::Result<Signal> {
        match &self.before_execute_route {
            Some(f) => f(dispatcher),
            None => Ok(Signal::Continue),
        }
    }

    fn after_binding(&self, dispatcher: &mut Dispatcher) -> anyhow::Result<Signal> {
        match &self.after_binding {
            Some(f) => f(dispatcher),
            None => Ok(Signal::Continue),
        }
    }

    fn after_execute_route(
        &self,
        dispatcher: &mut Dispatcher,
        returned: &Value,
    ) -> anyhow::Result<Signal> {
        match &self.after_execute_route {
            Some(f) => f(dispatcher, returned),
            None => Ok(Signal::Continue),
        }
    }
}

impl fmt::Debug for TaskHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods().collect();
        methods.sort_unstable();
        f.debug_struct("TaskHandler")
            .field("name", &self.name)
            .field("methods", &methods)
            .finish()
    }
}
