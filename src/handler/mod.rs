//! # Handler Module
//!
//! Handlers are the objects (CLI tasks, MVC controllers) whose action
//! methods the dispatcher invokes.
//!
//! ## Capabilities
//!
//! [`Handler`] exposes two required capabilities, "do you have method X"
//! and "call method X", plus optional lifecycle hooks with no-op defaults:
//!
//! - `initialize` - runs once per handler instance, the first time the loop
//!   resolves it
//! - `before_execute_route` - may stop the iteration; the instance is then
//!   evicted from the resolver so the next attempt gets a fresh one
//! - `after_binding` - runs after parameter binding
//! - `after_execute_route` - receives the action's returned value
//!
//! ## Identity
//!
//! [`SharedHandler`] derives its [`HandlerId`](crate::ids::HandlerId) from
//! the address of the shared allocation. The dispatcher tracks initialization
//! by that id, so two instances of the same class are initialized
//! independently while every wrapper around one instance shares the record.
//!
//! ## Closure Handlers
//!
//! [`TaskHandler`] builds a handler out of closures:
//!
//! ```rust
//! use dispatchloop::handler::TaskHandler;
//! use serde_json::json;
//!
//! let task = TaskHandler::new("posts")
//!     .action("index", |_d, _args| Ok(json!("ok")))
//!     .action("show", |_d, args| Ok(args.first().cloned().unwrap_or_default()));
//! ```

mod core;
mod task;

pub use core::{ArgVec, Handler, SharedHandler, MAX_INLINE_ARGS};
pub use task::TaskHandler;
