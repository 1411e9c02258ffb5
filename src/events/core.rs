use serde_json::Value;
use std::fmt;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// Answer of a hook or listener.
///
/// `Stop` is the "returned false" of a lifecycle hook: the loop abandons the
/// current iteration.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    #[default]
    Continue,
    Stop,
}

impl Signal {
    pub fn is_stop(self) -> bool {
        matches!(self, Signal::Stop)
    }
}

impl From<bool> for Signal {
    /// `false` stops, `true` continues.
    fn from(proceed: bool) -> Self {
        if proceed {
            Signal::Continue
        } else {
            Signal::Stop
        }
    }
}

/// Payload-free classification of a [`DispatchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeDispatchLoop,
    BeforeDispatch,
    BeforeNotFoundAction,
    BeforeExecuteRoute,
    AfterInitialize,
    AfterBinding,
    AfterExecuteRoute,
    AfterDispatch,
    AfterDispatchLoop,
    BeforeException,
}

impl EventKind {
    /// Stable event name, e.g. `dispatch:beforeDispatch`.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::BeforeDispatchLoop => "dispatch:beforeDispatchLoop",
            EventKind::BeforeDispatch => "dispatch:beforeDispatch",
            EventKind::BeforeNotFoundAction => "dispatch:beforeNotFoundAction",
            EventKind::BeforeExecuteRoute => "dispatch:beforeExecuteRoute",
            EventKind::AfterInitialize => "dispatch:afterInitialize",
            EventKind::AfterBinding => "dispatch:afterBinding",
            EventKind::AfterExecuteRoute => "dispatch:afterExecuteRoute",
            EventKind::AfterDispatch => "dispatch:afterDispatch",
            EventKind::AfterDispatchLoop => "dispatch:afterDispatchLoop",
            EventKind::BeforeException => "dispatch:beforeException",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle notification, carrying the returned value or the fault when
/// the hook point has one.
#[derive(Debug, Clone, Copy)]
pub enum DispatchEvent<'a> {
    BeforeDispatchLoop,
    BeforeDispatch,
    BeforeNotFoundAction,
    BeforeExecuteRoute,
    AfterInitialize,
    AfterBinding,
    AfterExecuteRoute(&'a Value),
    AfterDispatch(&'a Value),
    AfterDispatchLoop,
    BeforeException(&'a DispatchError),
}

impl DispatchEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            DispatchEvent::BeforeDispatchLoop => EventKind::BeforeDispatchLoop,
            DispatchEvent::BeforeDispatch => EventKind::BeforeDispatch,
            DispatchEvent::BeforeNotFoundAction => EventKind::BeforeNotFoundAction,
            DispatchEvent::BeforeExecuteRoute => EventKind::BeforeExecuteRoute,
            DispatchEvent::AfterInitialize => EventKind::AfterInitialize,
            DispatchEvent::AfterBinding => EventKind::AfterBinding,
            DispatchEvent::AfterExecuteRoute(_) => EventKind::AfterExecuteRoute,
            DispatchEvent::AfterDispatch(_) => EventKind::AfterDispatch,
            DispatchEvent::AfterDispatchLoop => EventKind::AfterDispatchLoop,
            DispatchEvent::BeforeException(_) => EventKind::BeforeException,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Value returned by the action, for the after-execute events.
    pub fn returned_value(&self) -> Option<&Value> {
        match self {
            DispatchEvent::AfterExecuteRoute(v) | DispatchEvent::AfterDispatch(v) => Some(v),
            _ => None,
        }
    }

    /// The fault under recovery, for `dispatch:beforeException`.
    pub fn fault(&self) -> Option<&DispatchError> {
        match self {
            DispatchEvent::BeforeException(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Fires lifecycle events on behalf of the dispatcher.
///
/// Implementations must return [`Signal::Continue`] when nobody listens to
/// an event.
pub trait EventNotifier: Send + Sync {
    fn fire(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal>;
}
