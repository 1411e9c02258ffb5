use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Weak;
use tracing::debug;

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Result};
use crate::handler::{Handler, SharedHandler};
use crate::ids::HandlerId;

/// Address of a single action parameter.
///
/// Positional params are addressed by index, keyed params by name. A name
/// made of digits also addresses a positional param.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(idx: usize) -> Self {
        ParamKey::Index(idx)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(idx) => write!(f, "{idx}"),
            ParamKey::Name(name) => f.write_str(name),
        }
    }
}

/// Partial routing update applied by [`DispatchState::forward`].
///
/// Omitted fields keep their current value. Deserializes from a map with
/// `namespace`, `task` (or `controller`/`handler`), `action` and `params`.
///
/// ```
/// use dispatchloop::Forward;
/// use serde_json::json;
///
/// let fwd = Forward::default().task("users").action("list");
/// assert_eq!(fwd.handler.as_deref(), Some("users"));
///
/// let parsed: Forward = serde_json::from_value(json!({"controller": "posts"})).unwrap();
/// assert_eq!(parsed.handler.as_deref(), Some("posts"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Forward {
    pub namespace: Option<String>,
    #[serde(alias = "task", alias = "controller")]
    pub handler: Option<String>,
    pub action: Option<String>,
    pub params: Option<Value>,
}

impl Forward {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Alias of [`Forward::handler`] for CLI tasks.
    pub fn task(self, task: impl Into<String>) -> Self {
        self.handler(task)
    }

    /// Alias of [`Forward::handler`] for MVC controllers.
    pub fn controller(self, controller: impl Into<String>) -> Self {
        self.handler(controller)
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Routing state owned by one dispatcher.
///
/// The loop sets `finished` at the start of every iteration; a forward flips
/// it back to request another one. `forwarded` stays set until the next
/// top-level dispatch begins.
#[derive(Debug, Clone)]
pub struct DispatchState {
    pub(crate) namespace_name: Option<String>,
    pub(crate) module_name: Option<String>,
    pub(crate) handler_name: Option<String>,
    pub(crate) action_name: Option<String>,
    pub(crate) params: Value,
    pub(crate) previous_namespace_name: Option<String>,
    pub(crate) previous_handler_name: Option<String>,
    pub(crate) previous_action_name: Option<String>,
    pub(crate) finished: bool,
    pub(crate) forwarded: bool,
    pub(crate) returned_value: Value,
    pub(crate) active_handler: Option<SharedHandler>,
    pub(crate) last_handler: Option<SharedHandler>,
    pub(crate) is_initializing: bool,
    handler_init_tracker: HashMap<HandlerId, Weak<dyn Handler>>,
}

impl Default for DispatchState {
    fn default() -> Self {
        Self {
            namespace_name: None,
            module_name: None,
            handler_name: None,
            action_name: None,
            params: Value::Array(Vec::new()),
            previous_namespace_name: None,
            previous_handler_name: None,
            previous_action_name: None,
            finished: false,
            forwarded: false,
            returned_value: Value::Null,
            active_handler: None,
            last_handler: None,
            is_initializing: false,
            handler_init_tracker: HashMap::new(),
        }
    }
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects the loop to another namespace/handler/action/params.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ForwardDuringInitialization`] while a handler's
    /// `initialize` hook runs; the state is left untouched.
    pub fn forward(&mut self, update: Forward) -> Result<()> {
        if self.is_initializing {
            return Err(DispatchError::ForwardDuringInitialization);
        }

        self.previous_namespace_name = self.namespace_name.clone();
        self.previous_handler_name = self.handler_name.clone();
        self.previous_action_name = self.action_name.clone();

        if let Some(namespace) = update.namespace {
            self.namespace_name = Some(namespace);
        }
        if let Some(handler) = update.handler {
            self.handler_name = Some(handler);
        }
        if let Some(action) = update.action {
            self.action_name = Some(action);
        }
        if let Some(params) = update.params {
            self.params = params;
        }

        self.finished = false;
        self.forwarded = true;

        debug!(
            from_handler = ?self.previous_handler_name,
            from_action = ?self.previous_action_name,
            to_handler = ?self.handler_name,
            to_action = ?self.action_name,
            "Forward requested"
        );
        Ok(())
    }

    /// Fills namespace, handler and action from `config` when unset or empty.
    pub fn resolve_defaults(&mut self, config: &DispatcherConfig) {
        if is_unset(&self.namespace_name) {
            if let Some(default) = &config.default_namespace {
                self.namespace_name = Some(default.clone());
            }
        }
        if is_unset(&self.handler_name) {
            self.handler_name = Some(config.default_handler.clone());
        }
        if is_unset(&self.action_name) {
            self.action_name = Some(config.default_action.clone());
        }
    }

    /// Clears per-dispatch bookkeeping while keeping the routing target and
    /// the handler initialization tracker.
    pub fn reset_for_dispatch(&mut self) {
        self.previous_namespace_name = None;
        self.previous_handler_name = None;
        self.previous_action_name = None;
        self.finished = false;
        self.forwarded = false;
        self.returned_value = Value::Null;
        self.active_handler = None;
        self.last_handler = None;
        self.is_initializing = false;
    }

    /// Records `handler` as initialized; true when it had not been seen
    /// before.
    ///
    /// The tracker keeps a weak reference per instance so an id cannot be
    /// reused by another allocation while its entry exists. Entries of
    /// dropped instances are pruned here.
    pub fn track_handler(&mut self, handler: &SharedHandler) -> bool {
        self.handler_init_tracker
            .retain(|_, weak| weak.strong_count() > 0);
        let id = handler.id();
        if self.handler_init_tracker.contains_key(&id) {
            return false;
        }
        self.handler_init_tracker.insert(id, handler.downgrade());
        true
    }

    pub fn is_tracked(&self, handler: &SharedHandler) -> bool {
        self.handler_init_tracker
            .get(&handler.id())
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of live handler instances already initialized.
    pub fn tracked_handlers(&self) -> usize {
        self.handler_init_tracker
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace_name.as_deref()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.handler_name.as_deref()
    }

    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn previous_namespace_name(&self) -> Option<&str> {
        self.previous_namespace_name.as_deref()
    }

    pub fn previous_handler_name(&self) -> Option<&str> {
        self.previous_handler_name.as_deref()
    }

    pub fn previous_action_name(&self) -> Option<&str> {
        self.previous_action_name.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn was_forwarded(&self) -> bool {
        self.forwarded
    }

    pub fn returned_value(&self) -> &Value {
        &self.returned_value
    }

    pub fn active_handler(&self) -> Option<&SharedHandler> {
        self.active_handler.as_ref()
    }

    pub fn last_handler(&self) -> Option<&SharedHandler> {
        self.last_handler.as_ref()
    }

    pub fn is_initializing(&self) -> bool {
        self.is_initializing
    }

    /// Looks up a single param by index or name.
    pub fn param(&self, key: &ParamKey) -> Option<&Value> {
        match (&self.params, key) {
            (Value::Array(items), ParamKey::Index(idx)) => items.get(*idx),
            (Value::Array(items), ParamKey::Name(name)) => {
                name.parse::<usize>().ok().and_then(|idx| items.get(idx))
            }
            (Value::Object(map), ParamKey::Name(name)) => map.get(name),
            (Value::Object(map), ParamKey::Index(idx)) => map.get(&idx.to_string()),
            _ => None,
        }
    }

    /// Sets a single param, converting positional params to keyed ones when
    /// a name is used.
    pub fn set_param(&mut self, key: ParamKey, value: Value) {
        match (&mut self.params, key) {
            (Value::Array(items), ParamKey::Index(idx)) if idx < items.len() => {
                items[idx] = value;
            }
            (Value::Array(items), ParamKey::Index(idx)) if idx == items.len() => {
                items.push(value);
            }
            (Value::Object(map), key) => {
                map.insert(key.to_string(), value);
            }
            (params, key) => {
                let mut map = match std::mem::take(params) {
                    Value::Array(items) => items
                        .into_iter()
                        .enumerate()
                        .map(|(idx, v)| (idx.to_string(), v))
                        .collect(),
                    _ => serde_json::Map::new(),
                };
                map.insert(key.to_string(), value);
                *params = Value::Object(map);
            }
        }
    }
}

fn is_unset(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, str::is_empty)
}
