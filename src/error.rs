//! Error types raised by the dispatch loop.
//!
//! [`DispatchError`] covers every fault the loop can surface: configuration
//! errors, routing faults produced while resolving a handler, the cyclic
//! routing guard, misuse of [`forward`](crate::Dispatcher::forward), and
//! arbitrary failures coming out of handler, hook, listener or binder code.
//!
//! User code returns [`anyhow::Result`]; the loop converts those errors with
//! [`DispatchError::from_handler`], which keeps the original kind when a
//! `DispatchError` was propagated through `?`.

use thiserror::Error;

/// Convenience alias for results produced by the dispatcher.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Faults produced while dispatching.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler resolver has been configured on the dispatcher.
    #[error("a handler resolver is required to dispatch {service}")]
    NoContainerConfigured {
        /// What the resolver was needed for.
        service: &'static str,
    },

    /// The loop reached the dispatch cap, almost always a forward cycle.
    #[error("dispatcher has detected a cyclic routing causing stability problems")]
    CyclicRouting,

    /// Neither a named service nor a buildable class exists for the handler.
    #[error("{class} handler class cannot be loaded")]
    HandlerNotFound {
        /// Fully-qualified handler class that was looked up.
        class: String,
    },

    /// The resolver returned something that is not a handler.
    #[error("invalid handler returned from the services container for {class}")]
    InvalidHandler {
        /// Fully-qualified handler class that was looked up.
        class: String,
    },

    /// Action parameters were neither positional nor keyed.
    #[error("action parameters must be an array or a map")]
    InvalidParams,

    /// The handler has no method for the requested action.
    #[error("action '{action}' was not found on handler '{handler}'")]
    ActionNotFound {
        /// Logical action name.
        action: String,
        /// Logical handler name.
        handler: String,
    },

    /// `forward` was called from inside a handler's `initialize` hook.
    #[error("forwarding inside a handler's initialize() method is forbidden")]
    ForwardDuringInitialization,

    /// Any other failure from handler, hook, listener or binder code.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// Converts an error returned by user code into a dispatch fault.
    ///
    /// A `DispatchError` wrapped by `anyhow` keeps its original variant.
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(fault) => fault,
            Err(other) => DispatchError::Handler(other),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use dispatchloop::DispatchError;
    ///
    /// assert_eq!(DispatchError::CyclicRouting.as_label(), "cyclic_routing");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NoContainerConfigured { .. } => "no_container",
            DispatchError::CyclicRouting => "cyclic_routing",
            DispatchError::HandlerNotFound { .. } => "handler_not_found",
            DispatchError::InvalidHandler { .. } => "invalid_handler",
            DispatchError::InvalidParams => "invalid_params",
            DispatchError::ActionNotFound { .. } => "action_not_found",
            DispatchError::ForwardDuringInitialization => "forward_during_initialization",
            DispatchError::Handler(_) => "handler_error",
        }
    }

    /// Numeric code of the fault, stable across releases.
    pub fn code(&self) -> u16 {
        match self {
            DispatchError::NoContainerConfigured { .. } => 0,
            DispatchError::CyclicRouting => 1,
            DispatchError::HandlerNotFound { .. } => 2,
            DispatchError::InvalidHandler { .. } => 3,
            DispatchError::InvalidParams => 4,
            DispatchError::ActionNotFound { .. } => 5,
            DispatchError::ForwardDuringInitialization | DispatchError::Handler(_) => 0,
        }
    }

    /// Faults that are never offered to exception recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DispatchError::NoContainerConfigured { .. } | DispatchError::ForwardDuringInitialization
        )
    }
}
