//! The dispatch loop.
//!
//! Every fallible step funnels its outcome through [`Dispatcher::after_hook`]
//! or [`Dispatcher::after_fault`], which decide between finishing the
//! iteration, aborting the loop and re-raising.

use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::core::{Dispatcher, MAX_DISPATCHES};
use crate::error::{DispatchError, Result};
use crate::events::{DispatchEvent, Signal};
use crate::handler::SharedHandler;
use crate::ids::DispatchId;

/// How an iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Iteration over; the loop runs again only when a forward is pending.
    Next,
    /// A fault was suppressed without a forward; stop with the failure
    /// sentinel.
    Abort,
}

/// Where a fault came from, which decides how an unsuppressed fault with a
/// pending forward is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultOrigin {
    /// Error returned by hook, listener, binder or action code. A pending
    /// forward wins over re-raising.
    Caught,
    /// Routing fault produced by the loop itself. Re-raised unless
    /// suppressed.
    Raised,
}

impl Dispatcher {
    /// Runs the dispatch loop until no forward is pending.
    ///
    /// Returns the handler resolved by the final iteration, `None` when a
    /// fault was suppressed by a `dispatch:beforeException` listener without
    /// forwarding (or a `dispatch:beforeDispatchLoop` listener stopped the
    /// dispatch), and the fault itself when nobody suppressed it.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NoContainerConfigured`] without a resolver
    /// - [`DispatchError::CyclicRouting`] when [`MAX_DISPATCHES`] iterations
    ///   are reached
    /// - any unsuppressed routing or handler fault
    pub fn dispatch(&mut self) -> Result<Option<SharedHandler>> {
        if self.resolver.is_none() {
            error!("No handler resolver configured");
            return Err(DispatchError::NoContainerConfigured { service: "handlers" });
        }

        let dispatch_id = DispatchId::new();
        self.dispatch_id = Some(dispatch_id);
        let span = info_span!("dispatch", dispatch_id = %dispatch_id);
        let _guard = span.enter();

        self.state.reset_for_dispatch();
        self.state.finished = true;

        match self.fire(DispatchEvent::BeforeDispatchLoop) {
            Ok(Signal::Stop) if self.state.finished => {
                info!("Dispatch stopped by beforeDispatchLoop");
                return Ok(None);
            }
            Ok(_) => {}
            Err(fault) => {
                if fault.is_fatal() {
                    return Err(fault);
                }
                let suppressed = self.handle_exception(&fault)?;
                if self.state.finished {
                    return if suppressed { Ok(None) } else { Err(fault) };
                }
            }
        }

        let mut handler: Option<SharedHandler> = None;
        let mut aborted = false;
        let mut pending: Option<DispatchError> = None;
        let mut iterations = 0_usize;
        self.state.finished = false;

        while !self.state.finished {
            iterations += 1;

            if iterations == MAX_DISPATCHES {
                error!(
                    iterations,
                    handler = ?self.state.handler_name(),
                    action = ?self.state.action_name(),
                    "Cyclic routing detected, aborting dispatch loop"
                );
                if let Err(fault) =
                    self.after_fault(DispatchError::CyclicRouting, FaultOrigin::Raised)
                {
                    pending = Some(fault);
                }
                aborted = true;
                break;
            }

            match self.run_iteration(iterations, &mut handler)? {
                Flow::Next => {}
                Flow::Abort => {
                    debug!(iterations, "Dispatch loop aborted after suppressed fault");
                    aborted = true;
                    break;
                }
            }
        }

        if let Err(fault) = self.fire(DispatchEvent::AfterDispatchLoop) {
            if fault.is_fatal() {
                return Err(fault);
            }
            return if self.handle_exception(&fault)? {
                Ok(None)
            } else {
                Err(fault)
            };
        }

        if let Some(fault) = pending {
            return Err(fault);
        }

        info!(
            iterations,
            forwarded = self.state.was_forwarded(),
            aborted,
            "Dispatch finished"
        );
        Ok(if aborted { None } else { handler })
    }

    fn run_iteration(
        &mut self,
        iteration: usize,
        handler: &mut Option<SharedHandler>,
    ) -> Result<Flow> {
        self.state.finished = true;
        self.state.resolve_defaults(&self.config);

        let res = self.fire(DispatchEvent::BeforeDispatch);
        if let Some(flow) = self.after_hook(res)? {
            return Ok(flow);
        }

        let class = self.handler_class();
        let Some(resolver) = self.resolver.clone() else {
            return Err(DispatchError::NoContainerConfigured { service: "handlers" });
        };

        // D1: handler resolution
        if !(resolver.has(&class) || resolver.class_exists(&class)) {
            warn!(handler_class = %class, iteration, "Handler class not found");
            let fault = DispatchError::HandlerNotFound { class };
            return self.after_fault(fault, FaultOrigin::Raised);
        }
        let service = match resolver.get_shared(&class) {
            Ok(service) => service,
            Err(e) => {
                return self.after_fault(DispatchError::from_handler(e), FaultOrigin::Raised)
            }
        };
        let Some(h) = service.as_handler().cloned() else {
            warn!(handler_class = %class, "Resolver returned a non-handler service");
            let fault = DispatchError::InvalidHandler { class };
            return self.after_fault(fault, FaultOrigin::Raised);
        };
        *handler = Some(h.clone());

        let is_new = self.state.track_handler(&h);
        self.state.active_handler = Some(h.clone());
        let params = self.state.params.clone();

        debug!(
            handler_class = %class,
            handler_id = %h.id(),
            is_new,
            iteration,
            "Handler resolved"
        );

        if !matches!(params, Value::Array(_) | Value::Object(_)) {
            return self.after_fault(DispatchError::InvalidParams, FaultOrigin::Raised);
        }

        let method = self.active_method();

        if !h.has_action(&method) {
            warn!(handler_class = %class, method = %method, "Action method not found");
            let res = self.fire(DispatchEvent::BeforeNotFoundAction);
            if let Some(flow) = self.after_hook(res)? {
                return Ok(flow);
            }
            let fault = DispatchError::ActionNotFound {
                action: self.state.action_name().unwrap_or_default().to_string(),
                handler: self.state.handler_name().unwrap_or_default().to_string(),
            };
            return self.after_fault(fault, FaultOrigin::Raised);
        }

        // D2: before-execute hooks may veto; the instance is then evicted
        let res = self.fire(DispatchEvent::BeforeExecuteRoute);
        if let Some(flow) = self.after_hook(res)? {
            self.evict(&class);
            return Ok(flow);
        }
        let res = h
            .before_execute_route(self)
            .map_err(DispatchError::from_handler);
        if let Some(flow) = self.after_hook(res)? {
            self.evict(&class);
            return Ok(flow);
        }

        if is_new {
            self.state.is_initializing = true;
            let res = h.initialize(self);
            self.state.is_initializing = false;
            if let Err(e) = res {
                return self.after_fault(DispatchError::from_handler(e), FaultOrigin::Caught);
            }
            debug!(handler_id = %h.id(), "Handler initialized");

            let res = self.fire(DispatchEvent::AfterInitialize);
            if let Some(flow) = self.after_hook(res)? {
                return Ok(flow);
            }
        }

        let params = match self.binder.clone() {
            Some(binder) => {
                let cache_key = format!("{class}::{method}");
                match binder.bind_to_handler(&h, params, &cache_key, &method) {
                    Ok(bound) => bound,
                    Err(e) => {
                        return self.after_fault(DispatchError::from_handler(e), FaultOrigin::Caught)
                    }
                }
            }
            None => params,
        };

        let res = self.fire(DispatchEvent::AfterBinding);
        if let Some(flow) = self.after_hook(res)? {
            return Ok(flow);
        }
        let res = h.after_binding(self).map_err(DispatchError::from_handler);
        if let Some(flow) = self.after_hook(res)? {
            return Ok(flow);
        }

        self.state.last_handler = Some(h.clone());

        // D3: action invoked
        info!(handler_class = %class, method = %method, iteration, "Action invoked");
        let start = Instant::now();
        match self.call_action_method(&h, &method, &params) {
            Ok(value) => {
                info!(
                    handler_class = %class,
                    method = %method,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Action completed"
                );
                self.state.returned_value = value;
            }
            Err(fault) => {
                warn!(
                    handler_class = %class,
                    method = %method,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %fault,
                    "Action failed"
                );
                return self.after_fault(fault, FaultOrigin::Caught);
            }
        }

        if !self.state.finished {
            debug!(method = %method, "Forward detected after action");
            return Ok(Flow::Next);
        }

        let returned = self.state.returned_value.clone();
        let res = self.fire(DispatchEvent::AfterExecuteRoute(&returned));
        if let Some(flow) = self.after_hook(res)? {
            return Ok(flow);
        }
        let res = h
            .after_execute_route(self, &returned)
            .map_err(DispatchError::from_handler);
        if let Some(flow) = self.after_hook(res)? {
            return Ok(flow);
        }

        // a Stop from afterDispatch has nothing left to veto
        if let Err(fault) = self.fire(DispatchEvent::AfterDispatch(&returned)) {
            if fault.is_fatal() || !self.handle_exception(&fault)? {
                return Err(fault);
            }
        }

        Ok(Flow::Next)
    }

    /// Offers `fault` to `dispatch:beforeException`; true when a listener
    /// suppressed it.
    fn handle_exception(&mut self, fault: &DispatchError) -> Result<bool> {
        warn!(
            error = %fault,
            kind = fault.as_label(),
            code = fault.code(),
            "Dispatch fault raised"
        );
        let suppressed = self.fire(DispatchEvent::BeforeException(fault))?.is_stop();
        if suppressed {
            info!(
                kind = fault.as_label(),
                forwarded = !self.state.finished,
                "Dispatch fault suppressed"
            );
        }
        Ok(suppressed)
    }

    /// Interprets a hook outcome: `None` proceeds with the iteration.
    fn after_hook(&mut self, res: Result<Signal>) -> Result<Option<Flow>> {
        match res {
            Ok(Signal::Stop) => Ok(Some(Flow::Next)),
            Ok(Signal::Continue) if !self.state.finished => Ok(Some(Flow::Next)),
            Ok(Signal::Continue) => Ok(None),
            Err(fault) => self.after_fault(fault, FaultOrigin::Caught).map(Some),
        }
    }

    fn after_fault(&mut self, fault: DispatchError, origin: FaultOrigin) -> Result<Flow> {
        if fault.is_fatal() {
            return Err(fault);
        }
        let suppressed = self.handle_exception(&fault)?;
        match (suppressed, self.state.finished, origin) {
            (true, true, _) => Ok(Flow::Abort),
            (true, false, _) | (false, false, FaultOrigin::Caught) => Ok(Flow::Next),
            (false, _, _) => Err(fault),
        }
    }

    fn evict(&self, class: &str) {
        if let Some(resolver) = &self.resolver {
            debug!(handler_class = %class, "Evicting handler after vetoed execution");
            resolver.remove(class);
        }
    }
}
