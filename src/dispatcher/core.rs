//! Dispatcher state surface: configuration, routing target, collaborators
//! and the accessors handlers and listeners use while the loop runs.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::binder::ParamBinder;
use crate::config::DispatcherConfig;
use crate::container::HandlerResolver;
use crate::error::{DispatchError, Result};
use crate::events::{DispatchEvent, EventNotifier, Signal};
use crate::handler::{ArgVec, SharedHandler};
use crate::ids::DispatchId;
use crate::naming::{camelize, join_namespace, lcfirst, NAMESPACE_SEPARATOR};
use crate::state::{DispatchState, Forward, ParamKey};

/// Iteration count at which the loop gives up with a cyclic routing fault
pub const MAX_DISPATCHES: usize = 256;

/// Forward-aware task/controller dispatcher.
///
/// Owns its [`DispatchState`] exclusively; handlers and listeners reach it
/// through the `&mut Dispatcher` they are handed.
pub struct Dispatcher {
    pub(super) config: DispatcherConfig,
    pub(super) state: DispatchState,
    pub(super) options: Map<String, Value>,
    pub(super) resolver: Option<Arc<dyn HandlerResolver>>,
    pub(super) events: Option<Arc<dyn EventNotifier>>,
    pub(super) binder: Option<Arc<dyn ParamBinder>>,
    camel_case_map: HashMap<String, String>,
    pub(super) dispatch_id: Option<DispatchId>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with CLI defaults (`main` task, `main` action).
    ///
    /// A resolver must be installed with [`Dispatcher::set_resolver`] before
    /// dispatching.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Dispatcher {
            config,
            state: DispatchState::new(),
            options: Map::new(),
            resolver: None,
            events: None,
            binder: None,
            camel_case_map: HashMap::new(),
            dispatch_id: None,
        }
    }

    // ----- collaborators -------------------------------------------------

    pub fn set_resolver(&mut self, resolver: Arc<dyn HandlerResolver>) -> &mut Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn resolver(&self) -> Option<&Arc<dyn HandlerResolver>> {
        self.resolver.as_ref()
    }

    pub fn set_events_manager(&mut self, events: Arc<dyn EventNotifier>) -> &mut Self {
        self.events = Some(events);
        self
    }

    pub fn events_manager(&self) -> Option<&Arc<dyn EventNotifier>> {
        self.events.as_ref()
    }

    /// Installs a binder; binding runs for every action from now on.
    pub fn set_model_binder(&mut self, binder: Arc<dyn ParamBinder>) -> &mut Self {
        self.binder = Some(binder);
        self
    }

    pub fn model_binder(&self) -> Option<&Arc<dyn ParamBinder>> {
        self.binder.as_ref()
    }

    pub fn is_model_binding(&self) -> bool {
        self.binder.is_some()
    }

    /// Models bound by the installed binder, empty without one.
    pub fn bound_models(&self) -> Map<String, Value> {
        self.binder
            .as_ref()
            .map(|b| b.bound_models())
            .unwrap_or_default()
    }

    // ----- configuration -------------------------------------------------

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.config.default_namespace = Some(namespace.into());
        self
    }

    pub fn set_default_handler(&mut self, handler: impl Into<String>) -> &mut Self {
        self.config.default_handler = handler.into();
        self
    }

    pub fn set_default_task(&mut self, task: impl Into<String>) -> &mut Self {
        self.set_default_handler(task)
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.config.default_action = action.into();
        self
    }

    pub fn set_handler_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.config.handler_suffix = suffix.into();
        self
    }

    pub fn set_task_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.set_handler_suffix(suffix)
    }

    pub fn handler_suffix(&self) -> &str {
        &self.config.handler_suffix
    }

    pub fn set_action_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.config.action_suffix = suffix.into();
        self
    }

    pub fn action_suffix(&self) -> &str {
        &self.config.action_suffix
    }

    // ----- routing target ------------------------------------------------

    pub fn set_namespace_name(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.state.namespace_name = Some(namespace.into());
        self
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.state.namespace_name()
    }

    pub fn set_module_name(&mut self, module: impl Into<String>) -> &mut Self {
        self.state.module_name = Some(module.into());
        self
    }

    pub fn module_name(&self) -> Option<&str> {
        self.state.module_name()
    }

    pub fn set_handler_name(&mut self, handler: impl Into<String>) -> &mut Self {
        self.state.handler_name = Some(handler.into());
        self
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.state.handler_name()
    }

    pub fn set_task_name(&mut self, task: impl Into<String>) -> &mut Self {
        self.set_handler_name(task)
    }

    pub fn task_name(&self) -> Option<&str> {
        self.handler_name()
    }

    pub fn set_action_name(&mut self, action: impl Into<String>) -> &mut Self {
        self.state.action_name = Some(action.into());
        self
    }

    pub fn action_name(&self) -> Option<&str> {
        self.state.action_name()
    }

    /// Replaces the action params. Arrays are positional, objects keyed;
    /// anything else fails the next dispatch with `InvalidParams`.
    pub fn set_params(&mut self, params: Value) -> &mut Self {
        self.state.params = params;
        self
    }

    pub fn params(&self) -> &Value {
        self.state.params()
    }

    pub fn set_param(&mut self, key: impl Into<ParamKey>, value: Value) -> &mut Self {
        self.state.set_param(key.into(), value);
        self
    }

    pub fn get_param(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.state.param(&key.into())
    }

    pub fn get_param_or(&self, key: impl Into<ParamKey>, default: Value) -> Value {
        self.get_param(key).cloned().unwrap_or(default)
    }

    pub fn has_param(&self, key: impl Into<ParamKey>) -> bool {
        self.get_param(key).is_some()
    }

    /// Named CLI options, appended after the positional params of every
    /// action call.
    pub fn set_options(&mut self, options: Map<String, Value>) -> &mut Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn get_option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    // ----- loop state ----------------------------------------------------

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn previous_namespace_name(&self) -> Option<&str> {
        self.state.previous_namespace_name()
    }

    pub fn previous_handler_name(&self) -> Option<&str> {
        self.state.previous_handler_name()
    }

    pub fn previous_task_name(&self) -> Option<&str> {
        self.previous_handler_name()
    }

    pub fn previous_action_name(&self) -> Option<&str> {
        self.state.previous_action_name()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn was_forwarded(&self) -> bool {
        self.state.was_forwarded()
    }

    pub fn returned_value(&self) -> &Value {
        self.state.returned_value()
    }

    pub fn set_returned_value(&mut self, value: Value) -> &mut Self {
        self.state.returned_value = value;
        self
    }

    /// Handler being processed by the current (or last) iteration.
    pub fn active_handler(&self) -> Option<&SharedHandler> {
        self.state.active_handler()
    }

    pub fn active_task(&self) -> Option<&SharedHandler> {
        self.active_handler()
    }

    /// Handler whose action method ran last.
    pub fn last_handler(&self) -> Option<&SharedHandler> {
        self.state.last_handler()
    }

    pub fn last_task(&self) -> Option<&SharedHandler> {
        self.last_handler()
    }

    /// True only while a handler's `initialize` hook runs.
    pub fn is_initializing(&self) -> bool {
        self.state.is_initializing()
    }

    /// Id of the running (or most recent) top-level dispatch.
    pub fn dispatch_id(&self) -> Option<DispatchId> {
        self.dispatch_id
    }

    /// Requests another loop iteration against a new target.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ForwardDuringInitialization`] when called from a
    /// handler's `initialize` hook.
    pub fn forward(&mut self, update: Forward) -> Result<()> {
        self.state.forward(update)
    }

    // ----- naming --------------------------------------------------------

    /// Fully-qualified handler class for the current target, with defaults
    /// applied to unset fields.
    ///
    /// The handler name is camel-cased unless it already contains the `::`
    /// namespace separator, then the handler suffix is appended.
    pub fn handler_class(&self) -> String {
        let handler = match self.state.handler_name() {
            Some(name) if !name.is_empty() => name,
            _ => self.config.default_handler.as_str(),
        };
        let namespace = match self.state.namespace_name() {
            Some(ns) if !ns.is_empty() => Some(ns),
            _ => self.config.default_namespace.as_deref(),
        };

        let class = if handler.contains(NAMESPACE_SEPARATOR) {
            handler.to_string()
        } else {
            camelize(handler)
        };
        let class = format!("{class}{}", self.config.handler_suffix);
        match namespace {
            Some(ns) => join_namespace(ns, &class),
            None => class,
        }
    }

    /// Method name for the current action, e.g. `"list_all"` gives
    /// `"listAllAction"`. The camel-cased form is cached per action.
    pub fn active_method(&mut self) -> String {
        let action = self
            .state
            .action_name()
            .filter(|a| !a.is_empty())
            .unwrap_or(self.config.default_action.as_str())
            .to_string();
        let camelized = self
            .camel_case_map
            .entry(action)
            .or_insert_with_key(|action| lcfirst(&camelize(action)));
        format!("{camelized}{}", self.config.action_suffix)
    }

    // ----- invocation ----------------------------------------------------

    /// Builds the argument list for an action call: the params in order
    /// (numeric keys first, by index, then named keys), followed by the
    /// option values.
    pub fn build_arguments(&self, params: &Value) -> ArgVec {
        let mut args = ArgVec::new();
        match params {
            Value::Array(items) => args.extend(items.iter().cloned()),
            Value::Object(map) => {
                let mut positional: Vec<(usize, &Value)> = map
                    .iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|idx| (idx, v)))
                    .collect();
                positional.sort_by_key(|(idx, _)| *idx);
                args.extend(positional.into_iter().map(|(_, v)| v.clone()));
                args.extend(
                    map.iter()
                        .filter(|(k, _)| k.parse::<usize>().is_err())
                        .map(|(_, v)| v.clone()),
                );
            }
            Value::Null => {}
            other => args.push(other.clone()),
        }
        args.extend(self.options.values().cloned());
        args
    }

    /// Invokes `method` on `handler` with `params` plus the options.
    pub fn call_action_method(
        &mut self,
        handler: &SharedHandler,
        method: &str,
        params: &Value,
    ) -> Result<Value> {
        let args = self.build_arguments(params);
        handler
            .call_action(method, &args, self)
            .map_err(DispatchError::from_handler)
    }

    /// Fires `event` through the events manager; `Continue` without one.
    pub(super) fn fire(&mut self, event: DispatchEvent<'_>) -> Result<Signal> {
        let Some(events) = self.events.clone() else {
            return Ok(Signal::Continue);
        };
        events
            .fire(&event, self)
            .map_err(DispatchError::from_handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handler_class_camelizes_and_suffixes() {
        let mut d = Dispatcher::new();
        d.set_handler_name("user_posts");
        assert_eq!(d.handler_class(), "UserPostsTask");

        d.set_namespace_name("App::Tasks");
        assert_eq!(d.handler_class(), "App::Tasks::UserPostsTask");

        d.set_namespace_name("App::Tasks::");
        assert_eq!(d.handler_class(), "App::Tasks::UserPostsTask");
    }

    #[test]
    fn test_handler_class_keeps_qualified_names() {
        let mut d = Dispatcher::new();
        d.set_handler_name("Admin::user_posts");
        assert_eq!(d.handler_class(), "Admin::user_postsTask");
    }

    #[test]
    fn test_handler_class_uses_defaults() {
        let mut d = Dispatcher::new();
        d.set_default_namespace("Cli");
        assert_eq!(d.handler_class(), "Cli::MainTask");
        assert_eq!(d.handler_name(), None);
    }

    #[test]
    fn test_active_method() {
        let mut d = Dispatcher::new();
        assert_eq!(d.active_method(), "mainAction");
        d.set_action_name("list-all");
        assert_eq!(d.active_method(), "listAllAction");
        d.set_action_suffix("Command");
        assert_eq!(d.active_method(), "listAllCommand");
    }

    #[test]
    fn test_arguments_put_options_after_positional() {
        let mut d = Dispatcher::new();
        let mut options = Map::new();
        options.insert("verbose".into(), json!(true));
        d.set_options(options);

        let args = d.build_arguments(&json!([10, 20]));
        assert_eq!(args.as_slice(), &[json!(10), json!(20), json!(true)]);

        let args = d.build_arguments(&json!({"name": "x", "1": 20, "0": 10}));
        assert_eq!(
            args.as_slice(),
            &[json!(10), json!(20), json!("x"), json!(true)]
        );
    }
}
