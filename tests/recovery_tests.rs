//! Tests for `dispatch:beforeException` recovery
//!
//! A listener answering `Stop` suppresses the fault. With a forward the loop
//! carries on against the new target; without one the dispatch ends with no
//! handler. Unsuppressed faults reach the caller, except errors from handler
//! code when the listener already forwarded.

mod common;

use common::{posts_container, posts_dispatcher, recording_bus, Counters};
use dispatchloop::{
    DispatchError, DispatchEvent, Dispatcher, EventBus, EventKind, Forward, Signal, TaskHandler,
};
use serde_json::json;
use std::sync::Arc;

fn forward_to_index(answer: Signal) -> EventBus {
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeException, move |_ev: &DispatchEvent<'_>, d: &mut Dispatcher| {
        if d.action_name() != Some("index") || d.handler_name() != Some("posts") {
            d.forward(Forward::default().task("posts").action("index"))?;
        }
        Ok(answer)
    });
    bus
}

#[test]
fn test_suppressed_fault_with_forward_continues() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(forward_to_index(Signal::Stop)))
        .set_handler_name("missing");

    let handler = dispatcher.dispatch().unwrap();

    assert!(handler.is_some());
    assert_eq!(dispatcher.returned_value(), &json!("ok"));
    assert_eq!(dispatcher.previous_handler_name(), Some("missing"));
    assert!(dispatcher.was_forwarded());
}

#[test]
fn test_suppressed_fault_without_forward_returns_none() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeException, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        Ok(Signal::Stop)
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(bus))
        .set_action_name("missing");

    assert!(dispatcher.dispatch().unwrap().is_none());
    assert!(dispatcher.active_handler().is_some());
    assert!(!dispatcher.was_forwarded());
}

#[test]
fn test_suppressed_fault_after_forward_drops_earlier_handler() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeException, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        Ok(Signal::Stop)
    });
    bus.on(EventKind::AfterExecuteRoute, |_ev: &DispatchEvent<'_>, d: &mut Dispatcher| {
        if d.action_name() == Some("index") {
            d.forward(Forward::default().action("missing"))?;
        }
        Ok(Signal::Continue)
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher.set_events_manager(Arc::new(bus));

    let handler = dispatcher.dispatch().unwrap();

    assert!(handler.is_none());
    assert_eq!(counters.invoked(), 1);
    assert!(dispatcher.was_forwarded());
    assert_eq!(dispatcher.previous_action_name(), Some("index"));
    assert!(dispatcher.active_handler().is_some());
}

#[test]
fn test_routing_fault_reraised_even_after_forward() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(forward_to_index(Signal::Continue)))
        .set_handler_name("missing");

    let err = dispatcher.dispatch().unwrap_err();

    assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
    assert_eq!(counters.invoked(), 0);
}

#[test]
fn test_action_error_with_forward_continues() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    container.set_handler("BrokenTask", || {
        TaskHandler::new("broken")
            .action("index", |_d, _args| Err(anyhow::anyhow!("boom")))
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(forward_to_index(Signal::Continue)))
        .set_handler_name("broken");

    dispatcher.dispatch().unwrap().expect("handler");

    assert_eq!(dispatcher.returned_value(), &json!("ok"));
    assert_eq!(dispatcher.previous_handler_name(), Some("broken"));
}

#[test]
fn test_action_error_without_recovery_propagates() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    container.set_handler("BrokenTask", || {
        TaskHandler::new("broken")
            .action("index", |_d, _args| Err(anyhow::anyhow!("boom")))
    });
    let (bus, recorder) = recording_bus();
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(bus))
        .set_handler_name("broken");

    let err = dispatcher.dispatch().unwrap_err();

    assert_eq!(err.as_label(), "handler_error");
    assert_eq!(err.to_string(), "boom");
    assert_eq!(recorder.count("dispatch:beforeException"), 1);
    // the fault escaped the loop, so afterDispatchLoop never fired
    assert_eq!(recorder.count("dispatch:afterDispatchLoop"), 0);
}

#[test]
fn test_listener_sees_the_fault() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeException, |ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        match ev.fault() {
            Some(DispatchError::ActionNotFound { action, .. }) if action == "missing" => {
                Ok(Signal::Stop)
            }
            _ => Ok(Signal::Continue),
        }
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(bus))
        .set_action_name("missing");

    assert!(dispatcher.dispatch().unwrap().is_none());
}

#[test]
fn test_listener_error_replaces_fault() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeException, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        Err(anyhow::anyhow!("listener failed"))
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(bus))
        .set_handler_name("missing");

    let err = dispatcher.dispatch().unwrap_err();
    assert_eq!(err.to_string(), "listener failed");
}

#[test]
fn test_hook_error_in_before_dispatch_with_forward() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeDispatch, |_ev: &DispatchEvent<'_>, d: &mut Dispatcher| {
        if d.action_name() == Some("guarded") {
            d.forward(Forward::default().action("list"))?;
            anyhow::bail!("guarded action");
        }
        Ok(Signal::Continue)
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher
        .set_events_manager(Arc::new(bus))
        .set_action_name("guarded");

    dispatcher.dispatch().unwrap().expect("handler");

    assert_eq!(dispatcher.returned_value(), &json!(["a", "b"]));
}

#[test]
fn test_before_dispatch_loop_error_suppressed() {
    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.on(EventKind::BeforeDispatchLoop, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        Err(anyhow::anyhow!("not ready"))
    });
    bus.on(EventKind::BeforeException, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
        Ok(Signal::Stop)
    });
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher.set_events_manager(Arc::new(bus));

    assert!(dispatcher.dispatch().unwrap().is_none());
    assert_eq!(counters.invoked(), 0);
}
