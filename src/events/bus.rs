use std::sync::Arc;
use tracing::debug;

use super::{DispatchEvent, EventKind, EventNotifier, Signal};
use crate::dispatcher::Dispatcher;

/// A single event listener.
///
/// Closures with the matching signature are listeners, so most callers never
/// implement this by hand.
pub trait Listener: Send + Sync {
    fn on_event(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal>;
}

impl<F> Listener for F
where
    F: Fn(&DispatchEvent<'_>, &mut Dispatcher) -> anyhow::Result<Signal> + Send + Sync,
{
    fn on_event(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal> {
        self(event, dispatcher)
    }
}

struct Registration {
    kind: Option<EventKind>,
    listener: Arc<dyn Listener>,
}

/// Ordered listener chain implementing [`EventNotifier`].
///
/// Listeners run in attachment order. A `Stop` from one listener does not
/// skip the rest; the fire result is `Stop` if any listener stopped. The
/// first listener error ends the fire and becomes the fault.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Registration>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener that receives every event.
    pub fn attach<L: Listener + 'static>(&mut self, listener: L) -> &mut Self {
        self.listeners.push(Registration {
            kind: None,
            listener: Arc::new(listener),
        });
        self
    }

    /// Attaches a listener that only receives events of `kind`.
    pub fn attach_to<L>(&mut self, kind: EventKind, listener: L) -> &mut Self
    where
        L: Listener + 'static,
    {
        self.listeners.push(Registration {
            kind: Some(kind),
            listener: Arc::new(listener),
        });
        self
    }

    /// Registers a closure for events of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, f: F) -> &mut Self
    where
        F: Fn(&DispatchEvent<'_>, &mut Dispatcher) -> anyhow::Result<Signal>
            + Send
            + Sync
            + 'static,
    {
        self.attach_to(kind, f)
    }

    /// Registers a closure for every event.
    pub fn on_any<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&DispatchEvent<'_>, &mut Dispatcher) -> anyhow::Result<Signal>
            + Send
            + Sync
            + 'static,
    {
        self.attach(f)
    }

    /// Attaches an already shared listener, e.g. one the caller keeps a
    /// handle to for inspection.
    pub fn attach_shared(
        &mut self,
        kind: Option<EventKind>,
        listener: Arc<dyn Listener>,
    ) -> &mut Self {
        self.listeners.push(Registration { kind, listener });
        self
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listeners
            .iter()
            .any(|reg| reg.kind.map_or(true, |k| k == kind))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventNotifier for EventBus {
    fn fire(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal> {
        let kind = event.kind();
        let mut signal = Signal::Continue;
        for (idx, reg) in self.listeners.iter().enumerate() {
            if reg.kind.is_some_and(|k| k != kind) {
                continue;
            }
            if reg.listener.on_event(event, dispatcher)?.is_stop() {
                if !signal.is_stop() {
                    debug!(event = %kind, listener_idx = idx, "Listener stopped event");
                }
                signal = Signal::Stop;
            }
        }
        Ok(signal)
    }
}
