//! # Dispatcher Module
//!
//! The dispatcher turns a resolved route (namespace, task/controller,
//! action, params) into a handler method call, and keeps looping while
//! handlers or listeners forward to another target.
//!
//! ## Overview
//!
//! One call to [`Dispatcher::dispatch`]:
//!
//! 1. Fires `beforeDispatchLoop`
//! 2. Loops until no forward is pending, at most [`MAX_DISPATCHES`] times:
//!    fills defaults, resolves the handler class through the
//!    [`HandlerResolver`](crate::container::HandlerResolver), runs the
//!    lifecycle hooks, binds params and invokes the action method
//! 3. Fires `afterDispatchLoop`
//! 4. Returns the handler that ran, `None` when a fault was suppressed
//!    without a forward, or the fault itself when nobody recovered it
//!
//! ## Forwarding
//!
//! Any handler method, hook or listener can call
//! [`Dispatcher::forward`]. The current iteration is abandoned and the loop
//! starts over against the new target:
//!
//! ```rust
//! use dispatchloop::{Container, Dispatcher, Forward, TaskHandler};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.set_handler("PostsTask", || {
//!     TaskHandler::new("posts")
//!         .action("index", |d, _args| {
//!             d.forward(Forward::default().action("list"))?;
//!             Ok(json!(null))
//!         })
//!         .action("list", |_d, _args| Ok(json!(["a", "b"])))
//! });
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.set_resolver(Arc::new(container));
//! dispatcher.set_handler_name("posts").set_action_name("index");
//!
//! let handler = dispatcher.dispatch().unwrap();
//! assert!(handler.is_some());
//! assert!(dispatcher.was_forwarded());
//! assert_eq!(dispatcher.returned_value(), &json!(["a", "b"]));
//! ```
//!
//! ## Error Handling
//!
//! Faults from resolution, hooks, binding and actions go to the
//! `dispatch:beforeException` event. A listener answering
//! [`Signal::Stop`](crate::events::Signal::Stop) suppresses the fault; if it
//! also forwarded, the loop continues with the new target.

mod core;
mod engine;

pub use core::{Dispatcher, MAX_DISPATCHES};
