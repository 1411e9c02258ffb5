//! # Events Module
//!
//! Lifecycle notifications fired by the [`Dispatcher`](crate::Dispatcher)
//! while it runs the dispatch loop, and the listener plumbing that receives
//! them.
//!
//! ## Overview
//!
//! Every hook point of the loop fires a [`DispatchEvent`] through the
//! installed [`EventNotifier`]. A notifier answers with a [`Signal`]:
//!
//! - [`Signal::Continue`] - carry on (also what "no listener" means)
//! - [`Signal::Stop`] - short-circuit the current iteration
//!
//! or with an error, which the loop hands to exception recovery
//! (`dispatch:beforeException`).
//!
//! Listeners receive `&mut Dispatcher`, so they can
//! [`forward`](crate::Dispatcher::forward) to redirect execution.
//!
//! ## Event Order
//!
//! ```text
//! beforeDispatchLoop
//!   ┌─► beforeDispatch
//!   │   [beforeNotFoundAction]
//!   │   beforeExecuteRoute
//!   │   [afterInitialize]        (first time a handler instance is seen)
//!   │   afterBinding
//!   │   afterExecuteRoute
//!   │   afterDispatch
//!   └── repeat while forwarded
//! afterDispatchLoop
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dispatchloop::events::{DispatchEvent, EventBus, EventKind, Signal};
//! use dispatchloop::Dispatcher;
//!
//! let mut bus = EventBus::new();
//! bus.on(EventKind::BeforeException, |_ev: &DispatchEvent<'_>, _d: &mut Dispatcher| {
//!     // swallow every fault
//!     Ok(Signal::Stop)
//! });
//! ```

mod bus;
mod core;
mod log;

pub use bus::{EventBus, Listener};
pub use core::{DispatchEvent, EventKind, EventNotifier, Signal};
pub use log::TracingListener;
