//! # dispatchloop
//!
//! **dispatchloop** is the dispatch-loop core of a task/controller framework: it
//! takes a routing target (namespace, handler, action, params), resolves the
//! handler through a resolver, runs its lifecycle hooks and action, and keeps
//! looping while handlers or listeners forward to another target.
//!
//! ## Overview
//!
//! A dispatch is synchronous and runs to completion. Forwarding is a loop
//! restart, never recursion, so the number of iterations per top-level call
//! is bounded by [`MAX_DISPATCHES`].
//!
//! ## Architecture
//!
//! - **[`dispatcher`]** - The [`Dispatcher`] and its loop engine
//! - **[`state`]** - Routing state and the forward transition
//! - **[`container`]** - The [`HandlerResolver`] seam and the in-process [`Container`]
//! - **[`handler`]** - The [`Handler`] capability trait and the closure-based [`TaskHandler`]
//! - **[`events`]** - Lifecycle events, the [`EventBus`] and exception recovery
//! - **[`binder`]** - Optional parameter binding
//! - **[`config`]** - Defaults and suffixes, from code, env vars or a file
//! - **[`naming`]** - Camel-casing and namespace helpers
//! - **[`error`]** - [`DispatchError`]
//!
//! ### Loop Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant D as Dispatcher
//!     participant R as HandlerResolver
//!     participant E as EventBus
//!     participant H as Handler
//!
//!     Caller->>D: dispatch()
//!     D->>E: beforeDispatchLoop
//!     loop until finished (max 256)
//!         D->>E: beforeDispatch
//!         D->>R: has / get_shared(class)
//!         R-->>D: SharedHandler
//!         D->>E: beforeExecuteRoute
//!         D->>H: initialize (first time only)
//!         D->>E: afterInitialize / afterBinding
//!         D->>H: call_action(method, args)
//!         H-->>D: returned value (maybe forward)
//!         D->>E: afterExecuteRoute / afterDispatch
//!     end
//!     D->>E: afterDispatchLoop
//!     D-->>Caller: Option<SharedHandler>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use dispatchloop::{Container, Dispatcher, TaskHandler};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.set_handler("MainTask", || {
//!     TaskHandler::new("main").action("main", |_d, args| Ok(json!(args.len())))
//! });
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .set_resolver(Arc::new(container))
//!     .set_params(json!(["a", "b"]));
//!
//! assert!(dispatcher.dispatch().unwrap().is_some());
//! assert_eq!(dispatcher.returned_value(), &json!(2));
//! ```
//!
//! ## Error Handling
//!
//! Handler, hook, listener and binder code returns [`anyhow::Result`]. The
//! loop offers every fault to `dispatch:beforeException`; unsuppressed faults
//! reach the caller as [`DispatchError`].
//!
//! ## Logging
//!
//! The loop logs through `tracing` inside a `dispatch` span carrying a
//! [`DispatchId`]. Attach a [`TracingListener`] to also log every lifecycle
//! event.

pub mod binder;
pub mod config;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handler;
pub mod ids;
pub mod naming;
pub mod state;

pub use binder::ParamBinder;
pub use config::DispatcherConfig;
pub use container::{Container, HandlerResolver, Service};
pub use dispatcher::{Dispatcher, MAX_DISPATCHES};
pub use error::{DispatchError, Result};
pub use events::{
    DispatchEvent, EventBus, EventKind, EventNotifier, Listener, Signal, TracingListener,
};
pub use handler::{ArgVec, Handler, SharedHandler, TaskHandler};
pub use ids::{DispatchId, HandlerId};
pub use state::{DispatchState, Forward, ParamKey};
