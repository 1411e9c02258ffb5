use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::dispatcher::Dispatcher;
use crate::events::Signal;
use crate::ids::HandlerId;

/// Maximum inline action arguments before heap allocation
pub const MAX_INLINE_ARGS: usize = 8;

/// Argument list handed to an action method
pub type ArgVec = SmallVec<[Value; MAX_INLINE_ARGS]>;

/// A dispatchable task or controller.
///
/// Handlers are shared between loop iterations (and between dispatches when
/// the resolver caches them), so every method takes `&self`; keep mutable
/// state behind a lock or an atomic.
pub trait Handler: Send + Sync + 'static {
    /// Whether `method` (e.g. `"indexAction"`) can be invoked.
    fn has_action(&self, method: &str) -> bool;

    /// Invokes `method` with the final argument list.
    fn call_action(
        &self,
        method: &str,
        args: &[Value],
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Value>;

    /// One-time setup, run the first time the loop resolves this instance.
    ///
    /// Calling [`Dispatcher::forward`] from here fails with
    /// `ForwardDuringInitialization`.
    fn initialize(&self, _dispatcher: &mut Dispatcher) -> anyhow::Result<()> {
        Ok(())
    }

    fn before_execute_route(&self, _dispatcher: &mut Dispatcher) -> anyhow::Result<Signal> {
        Ok(Signal::Continue)
    }

    fn after_binding(&self, _dispatcher: &mut Dispatcher) -> anyhow::Result<Signal> {
        Ok(Signal::Continue)
    }

    fn after_execute_route(
        &self,
        _dispatcher: &mut Dispatcher,
        _returned: &Value,
    ) -> anyhow::Result<Signal> {
        Ok(Signal::Continue)
    }
}

/// A handler instance with a stable identity.
///
/// The identity is the shared allocation, so wrapping clones of one `Arc`
/// yields equal handlers.
#[derive(Clone)]
pub struct SharedHandler {
    inner: Arc<dyn Handler>,
}

impl SharedHandler {
    /// Wraps a freshly constructed handler.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Wraps an existing instance, keeping its identity.
    pub fn from_arc(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> HandlerId {
        HandlerId::of(&self.inner)
    }

    /// True when both refer to the same instance.
    pub fn same_instance(&self, other: &SharedHandler) -> bool {
        self.id() == other.id()
    }

    pub fn as_arc(&self) -> &Arc<dyn Handler> {
        &self.inner
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Handler> {
        Arc::downgrade(&self.inner)
    }
}

impl Deref for SharedHandler {
    type Target = dyn Handler;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl PartialEq for SharedHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Eq for SharedHandler {}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandler").field("id", &self.id()).finish()
    }
}
