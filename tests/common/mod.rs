#![allow(dead_code)]

use dispatchloop::{
    Container, DispatchEvent, Dispatcher, EventBus, HandlerId, Listener, Signal, TaskHandler,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared between a test and the handlers it registers.
#[derive(Default, Clone)]
pub struct Counters {
    pub constructed: Arc<AtomicUsize>,
    pub initialized: Arc<AtomicUsize>,
    pub invoked: Arc<AtomicUsize>,
}

impl Counters {
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn invoked(&self) -> usize {
        self.invoked.load(Ordering::SeqCst)
    }
}

/// `PostsTask` with `index` returning "ok" and `list` returning `["a", "b"]`.
pub fn posts_task(counters: &Counters) -> TaskHandler {
    let initialized = Arc::clone(&counters.initialized);
    let invoked_index = Arc::clone(&counters.invoked);
    let invoked_list = Arc::clone(&counters.invoked);
    TaskHandler::new("posts")
        .on_initialize(move |_d| {
            initialized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .action("index", move |_d, _args| {
            invoked_index.fetch_add(1, Ordering::SeqCst);
            Ok(json!("ok"))
        })
        .action("list", move |_d, _args| {
            invoked_list.fetch_add(1, Ordering::SeqCst);
            Ok(json!(["a", "b"]))
        })
}

/// Container with `PostsTask` registered, counting constructions.
pub fn posts_container(counters: &Counters) -> Arc<Container> {
    let container = Arc::new(Container::new());
    let counters = counters.clone();
    container.set_handler("PostsTask", move || {
        counters.constructed.fetch_add(1, Ordering::SeqCst);
        posts_task(&counters)
    });
    container
}

/// Dispatcher targeting `posts/index` through `container`.
pub fn posts_dispatcher(container: &Arc<Container>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .set_resolver(Arc::clone(container) as Arc<dyn dispatchloop::HandlerResolver>)
        .set_handler_name("posts")
        .set_action_name("index");
    dispatcher
}

/// Listener that records event names and the active handler at each event.
#[derive(Default, Clone)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<String>>>,
    pub handlers: Arc<Mutex<Vec<Option<HandlerId>>>>,
}

impl Recorder {
    pub fn names(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|n| n.as_str() == name).count()
    }
}

impl Listener for Recorder {
    fn on_event(
        &self,
        event: &DispatchEvent<'_>,
        dispatcher: &mut Dispatcher,
    ) -> anyhow::Result<Signal> {
        self.events.lock().push(event.name().to_string());
        self.handlers
            .lock()
            .push(dispatcher.active_handler().map(|h| h.id()));
        Ok(Signal::Continue)
    }
}

/// Event bus with a [`Recorder`] attached first.
pub fn recording_bus() -> (EventBus, Recorder) {
    let recorder = Recorder::default();
    let mut bus = EventBus::new();
    bus.attach(recorder.clone());
    (bus, recorder)
}

/// Action that stores its arguments for inspection.
pub fn capturing_task(captured: Arc<Mutex<Vec<Value>>>) -> TaskHandler {
    TaskHandler::new("capture").action("main", move |_d, args| {
        captured.lock().extend(args.iter().cloned());
        Ok(Value::Null)
    })
}
