//! # Container Module
//!
//! Resolution of handler class names into live handler instances.
//!
//! The dispatcher only depends on the [`HandlerResolver`] trait:
//!
//! - `has(class)` - a named service exists for `class`
//! - `class_exists(class)` - `class` can be constructed directly
//! - `get_shared(class)` - construct once, then reuse
//! - `remove(class)` - drop the cached instance so the next lookup builds a
//!   fresh one
//!
//! [`Container`] is the in-process implementation: named service factories
//! first, directly constructible classes second, shared instances cached in
//! between.
//!
//! ## Example
//!
//! ```rust
//! use dispatchloop::container::Container;
//! use dispatchloop::handler::TaskHandler;
//! use serde_json::json;
//!
//! let container = Container::new();
//! container.set_handler("PostsTask", || {
//!     TaskHandler::new("posts").action("index", |_d, _a| Ok(json!("ok")))
//! });
//! ```

mod core;

pub use core::{Container, HandlerResolver, Service};
