//! Dispatcher configuration.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// How incoming method names map onto registered services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One service owns the endpoint and method names arrive bare.
    /// Interceptors do not run in this mode.
    Direct,
    /// One service behind the endpoint, with interceptors active.
    #[default]
    Delegated,
    /// Method names carry a `service.method` prefix that selects the
    /// target service at dispatch time.
    Layered,
}

impl DispatchMode {
    pub fn name(&self) -> &'static str {
        match self {
            DispatchMode::Direct => "direct",
            DispatchMode::Delegated => "delegated",
            DispatchMode::Layered => "layered",
        }
    }
}

/// Configuration errors surfaced before the dispatcher starts taking
/// requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dispatch mode '{mode}' requires a default service")]
    MissingDefaultService {
        /// Mode that needs `default_service` set.
        mode: &'static str,
    },
}

/// Dispatcher settings, deserializable from host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub mode: DispatchMode,
    /// Service receiving bare method names when the host does not pick
    /// one per request. Required in direct mode; optional in delegated
    /// mode, where hosts usually route per endpoint; unused in layered
    /// mode.
    pub default_service: Option<String>,
}

impl DispatcherConfig {
    pub fn direct(service: impl Into<String>) -> Self {
        Self {
            mode: DispatchMode::Direct,
            default_service: Some(service.into()),
        }
    }

    pub fn delegated(service: impl Into<String>) -> Self {
        Self {
            mode: DispatchMode::Delegated,
            default_service: Some(service.into()),
        }
    }

    pub fn layered() -> Self {
        Self {
            mode: DispatchMode::Layered,
            default_service: None,
        }
    }

    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if direct mode has no default service to send
    /// bare method names to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == DispatchMode::Direct && self.default_service.is_none() {
            return Err(ConfigError::MissingDefaultService {
                mode: self.mode.name(),
            });
        }
        Ok(())
    }
}
