//! # State Module
//!
//! The mutable routing state driven by the [`Dispatcher`](crate::Dispatcher):
//! which namespace, handler and action are targeted, the parameters handed to
//! the action, and the bookkeeping the dispatch loop needs between
//! iterations (finished/forwarded flags, the "previous" snapshot, the
//! handler initialization tracker).
//!
//! ## Transitions
//!
//! Only two transitions change the routing target:
//!
//! - [`DispatchState::forward`] - snapshot the current target, overwrite the
//!   fields present in a [`Forward`] and request another loop iteration
//! - [`DispatchState::resolve_defaults`] - fill unset fields from the
//!   configured defaults at the top of every iteration
//!
//! Everything else is plain data read and written by the loop.

mod core;
#[cfg(test)]
mod tests;

pub use core::{DispatchState, Forward, ParamKey};
