//! Configuration file parsing for `tether.toml`.
//!
//! ```toml
//! [loader]
//! max_concurrent_steps = 4
//! key_mode = "typed"
//!
//! [debug]
//! log_fetches = true
//! slow_fetch_threshold = 250
//!
//! [environments.test.debug]
//! log_fetches = false
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::relations::KeyMode;
use crate::schema::{SchemaError, SchemaResult};

/// Main configuration structure for `tether.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Relation loader settings.
    #[serde(default)]
    pub loader: LoaderSection,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl TetherConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(loader) = overrides.loader {
                if let Some(max) = loader.max_concurrent_steps {
                    self.loader.max_concurrent_steps = max;
                }
                if let Some(mode) = loader.key_mode {
                    self.loader.key_mode = mode;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_fetches) = debug.log_fetches {
                    self.debug.log_fetches = log_fetches;
                }
                if let Some(threshold) = debug.slow_fetch_threshold {
                    self.debug.slow_fetch_threshold = threshold;
                }
            }
        }
        self
    }

    /// The settings a [`RelationLoader`](crate::RelationLoader) runs with.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            max_concurrent_steps: self.loader.max_concurrent_steps,
            key_mode: self.loader.key_mode,
            log_fetches: self.debug.log_fetches,
            slow_fetch_threshold: Duration::from_millis(self.debug.slow_fetch_threshold),
        }
    }
}

/// The `[loader]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderSection {
    /// Sibling fetches allowed in flight per include call; 0 is unbounded.
    #[serde(default)]
    pub max_concurrent_steps: usize,

    /// Which owning-key values are left out of fetch predicates.
    #[serde(default)]
    pub key_mode: KeyMode,
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every fetch with its filter.
    #[serde(default)]
    pub log_fetches: bool,

    /// Slow fetch threshold in milliseconds.
    #[serde(default = "default_slow_fetch_threshold")]
    pub slow_fetch_threshold: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_fetches: false,
            slow_fetch_threshold: default_slow_fetch_threshold(),
        }
    }
}

fn default_slow_fetch_threshold() -> u64 {
    1000
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Loader overrides.
    pub loader: Option<LoaderOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Loader configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderOverride {
    /// Override max_concurrent_steps.
    pub max_concurrent_steps: Option<usize>,

    /// Override key_mode.
    pub key_mode: Option<KeyMode>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_fetches.
    pub log_fetches: Option<bool>,

    /// Override slow_fetch_threshold.
    pub slow_fetch_threshold: Option<u64>,
}

/// Runtime settings of a relation loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Sibling fetches allowed in flight per include call; 0 is unbounded.
    pub max_concurrent_steps: usize,
    /// Which owning-key values are left out of fetch predicates.
    pub key_mode: KeyMode,
    /// Log every fetch with its filter.
    pub log_fetches: bool,
    /// Fetches slower than this are logged as warnings.
    pub slow_fetch_threshold: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        TetherConfig::default().loader_config()
    }
}

impl LoaderConfig {
    /// Bound the number of sibling fetches in flight.
    pub fn max_concurrent_steps(mut self, max: usize) -> Self {
        self.max_concurrent_steps = max;
        self
    }

    /// Set the key mode.
    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    /// Enable or disable fetch logging.
    pub fn log_fetches(mut self, enabled: bool) -> Self {
        self.log_fetches = enabled;
        self
    }
}

static ENV_VAR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").ok());

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let Some(re) = ENV_VAR.as_ref() else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
