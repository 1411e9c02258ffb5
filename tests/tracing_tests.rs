mod common;

use common::{posts_container, posts_dispatcher, Counters};
use dispatchloop::{EventBus, TracingListener};
use std::sync::Arc;
use tracing_util::TestTracing;

#[test]
fn test_dispatch_logs_milestones_in_span() {
    let tracing = TestTracing::init();

    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher.dispatch().unwrap();

    let dispatch_id = dispatcher.dispatch_id().unwrap().to_string();
    assert!(tracing.contains("Handler resolved"));
    assert!(tracing.contains("Action invoked"));
    assert!(tracing.contains("Action completed"));
    assert!(tracing.contains(&dispatch_id));
}

#[test]
fn test_tracing_listener_logs_events() {
    let tracing = TestTracing::init();

    let counters = Counters::default();
    let container = posts_container(&counters);
    let mut bus = EventBus::new();
    bus.attach(TracingListener::new());
    let mut dispatcher = posts_dispatcher(&container);
    dispatcher.set_events_manager(Arc::new(bus));
    dispatcher.set_action_name("missing");

    dispatcher.dispatch().unwrap_err();

    assert!(tracing.contains("dispatch:beforeNotFoundAction"));
    assert!(tracing.contains("Dispatch fault under recovery"));
    assert!(tracing.contains("action_not_found"));
}
