//! Parameter binding.
//!
//! When a [`ParamBinder`] is installed with
//! [`Dispatcher::set_model_binder`](crate::Dispatcher::set_model_binder), the
//! loop hands it the collected params right before the action runs and
//! invokes the action with whatever it returns, for example ids replaced by
//! the records they identify.
//!
//! Closures with the `bind_to_handler` signature are binders.

use serde_json::{Map, Value};

use crate::handler::SharedHandler;

pub trait ParamBinder: Send + Sync {
    /// Transforms `params` for `method` on `handler`.
    ///
    /// `cache_key` is stable per handler class and method, suitable for
    /// caching reflection-like lookups.
    fn bind_to_handler(
        &self,
        handler: &SharedHandler,
        params: Value,
        cache_key: &str,
        method: &str,
    ) -> anyhow::Result<Value>;

    /// Models bound during the last call, keyed by param name.
    fn bound_models(&self) -> Map<String, Value> {
        Map::new()
    }
}

impl<F> ParamBinder for F
where
    F: Fn(&SharedHandler, Value, &str, &str) -> anyhow::Result<Value> + Send + Sync,
{
    fn bind_to_handler(
        &self,
        handler: &SharedHandler,
        params: Value,
        cache_key: &str,
        method: &str,
    ) -> anyhow::Result<Value> {
        self(handler, params, cache_key, method)
    }
}
