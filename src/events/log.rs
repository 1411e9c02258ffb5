use tracing::{debug, warn};

use super::{DispatchEvent, EventKind, Listener, Signal};
use crate::dispatcher::Dispatcher;

/// Listener that records every lifecycle event with `tracing`.
///
/// Never stops the loop; attach it first so it sees events even when a later
/// listener stops or fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl TracingListener {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Listener for TracingListener {
    fn on_event(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal> {
        match event {
            DispatchEvent::BeforeException(fault) => {
                warn!(
                    event = %event.kind(),
                    fault = %fault,
                    fault_kind = fault.as_label(),
                    handler = ?dispatcher.handler_name(),
                    action = ?dispatcher.action_name(),
                    "Dispatch fault under recovery"
                );
            }
            DispatchEvent::AfterExecuteRoute(value) | DispatchEvent::AfterDispatch(value) => {
                debug!(
                    event = %event.kind(),
                    handler = ?dispatcher.handler_name(),
                    action = ?dispatcher.action_name(),
                    returned = %value,
                    "Dispatch event"
                );
            }
            _ => {
                debug!(
                    event = %event.kind(),
                    handler = ?dispatcher.handler_name(),
                    action = ?dispatcher.action_name(),
                    forwarded = dispatcher.was_forwarded(),
                    loop_event = matches!(
                        event.kind(),
                        EventKind::BeforeDispatchLoop | EventKind::AfterDispatchLoop
                    ),
                    "Dispatch event"
                );
            }
        }
        Ok(Signal::Continue)
    }
}
