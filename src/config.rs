//! # Dispatcher Configuration Module
//!
//! Defaults and naming conventions used by the [`Dispatcher`](crate::Dispatcher)
//! when turning a partial route into a concrete handler class and method.
//!
//! ## Sources
//!
//! Configuration can be built three ways:
//!
//! - [`DispatcherConfig::default()`] - CLI conventions (`main` task, `main`
//!   action, `Task` and `Action` suffixes)
//! - [`DispatcherConfig::from_env()`] - environment variables, falling back to
//!   the defaults for anything unset
//! - [`DispatcherConfig::load()`] - a TOML, YAML or JSON file, picked by
//!   extension
//!
//! ## Environment Variables
//!
//! | Variable                     | Field               |
//! |------------------------------|---------------------|
//! | `DISPATCH_DEFAULT_NAMESPACE` | `default_namespace` |
//! | `DISPATCH_DEFAULT_HANDLER`   | `default_handler`   |
//! | `DISPATCH_DEFAULT_ACTION`    | `default_action`    |
//! | `DISPATCH_HANDLER_SUFFIX`    | `handler_suffix`    |
//! | `DISPATCH_ACTION_SUFFIX`     | `action_suffix`     |
//!
//! ## Example
//!
//! ```toml
//! default_namespace = "App::Tasks"
//! default_handler = "main"
//! default_action = "main"
//! handler_suffix = "Task"
//! action_suffix = "Action"
//! ```

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Default handler used when a route names none.
pub const DEFAULT_HANDLER: &str = "main";
/// Default action used when a route names none.
pub const DEFAULT_ACTION: &str = "main";
/// Suffix appended to camel-cased handler names.
pub const DEFAULT_HANDLER_SUFFIX: &str = "Task";
/// Suffix appended to action method names.
pub const DEFAULT_ACTION_SUFFIX: &str = "Action";

/// Naming defaults for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Namespace used when the route does not carry one
    pub default_namespace: Option<String>,
    /// Handler (task/controller) used when the route does not carry one
    pub default_handler: String,
    /// Action used when the route does not carry one
    pub default_action: String,
    /// Appended to the camel-cased handler name to form the class name
    pub handler_suffix: String,
    /// Appended to the action method name
    pub action_suffix: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_namespace: None,
            default_handler: DEFAULT_HANDLER.to_string(),
            default_action: DEFAULT_ACTION.to_string(),
            handler_suffix: DEFAULT_HANDLER_SUFFIX.to_string(),
            action_suffix: DEFAULT_ACTION_SUFFIX.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_namespace: env::var("DISPATCH_DEFAULT_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .or(defaults.default_namespace),
            default_handler: env_or("DISPATCH_DEFAULT_HANDLER", defaults.default_handler),
            default_action: env_or("DISPATCH_DEFAULT_ACTION", defaults.default_action),
            handler_suffix: env_or("DISPATCH_HANDLER_SUFFIX", defaults.handler_suffix),
            action_suffix: env_or("DISPATCH_ACTION_SUFFIX", defaults.action_suffix),
        }
    }

    /// Load configuration from a `.toml`, `.yaml`/`.yml` or `.json` file.
    ///
    /// Missing fields take their default value.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dispatcher config {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let config: Self = match ext.as_str() {
            "toml" => toml::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => bail!("unsupported dispatcher config format '{other}'"),
        };
        Ok(config)
    }
}

fn env_or(key: &str, fallback: String) -> String {
    match env::var(key) {
        Ok(val) if !val.is_empty() => val,
        _ => fallback,
    }
}
