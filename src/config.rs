//! Agent configuration.
//!
//! [`AgentConfig`] collects the few knobs of the engine. It can be built in code, or
//! read from the script parameter mapping with [`AgentConfig::from_parameters`]:
//!
//! ```rust,no_run
//! use hookscope::{AgentConfig, LogLevel};
//!
//! // Customize in code
//! let config = AgentConfig::default()
//!     .with_log_level(LogLevel::Debug)
//!     .with_loader_enumeration_min_version(24);
//!
//! // Or read it from the parameters handed to the scripts
//! let parameters = serde_json::json!({"log_level": "debug", "target": "com.example"});
//! let config = AgentConfig::from_parameters(parameters.as_object().unwrap())?;
//! # Ok::<(), hookscope::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::{log::LogLevel, script::Parameters, Error, Result};

/// Runtime version from which loading contexts are enumerated by default.
pub const DEFAULT_LOADER_ENUMERATION_MIN_VERSION: u32 = 7;

/// Configuration of an [`Agent`](crate::Agent).
///
/// # Default Configuration
///
/// | Field | Default |
/// |-------|---------|
/// | `log_level` | `info` |
/// | `loader_enumeration_min_version` | `7` |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Threshold of the agent's log.
    pub log_level: LogLevel,
    /// Lowest runtime version on which unpinned class lookups search every loading
    /// context. Older runtimes resolve directly in the active context.
    pub loader_enumeration_min_version: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            log_level: LogLevel::Info,
            loader_enumeration_min_version: DEFAULT_LOADER_ENUMERATION_MIN_VERSION,
        }
    }
}

impl AgentConfig {
    /// Reads the configuration from script parameters.
    ///
    /// Recognized keys override the defaults; every other key is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a recognized key holds an unusable value.
    pub fn from_parameters(parameters: &Parameters) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(parameters.clone()))
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Sets the log threshold.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the version threshold for loading-context enumeration.
    #[must_use]
    pub fn with_loader_enumeration_min_version(mut self, version: u32) -> Self {
        self.loader_enumeration_min_version = version;
        self
    }
}
