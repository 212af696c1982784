// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! ```toml
//! store_timeout = "10s"
//! max_concurrent = 4
//! reporting_instance = "tekton-observer"
//! cluster_name = "prod-east"
//!
//! [log]
//! filter = "info,tko_engine=debug"
//! file = "/var/log/tekton-observer/engine.log"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_CONCURRENT: usize = 4;
const DEFAULT_REPORTING_INSTANCE: &str = "tekton-observer";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Deadline applied to every store call
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,
    /// Notifications processed in parallel
    pub max_concurrent: usize,
    /// Reporting instance stamped on audit events
    pub reporting_instance: String,
    /// Attached to every log line for multi-cluster deployments
    pub cluster_name: String,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            reporting_instance: DEFAULT_REPORTING_INSTANCE.to_string(),
            cluster_name: String::new(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` (then `info`) when unset
    pub filter: Option<String>,
    /// Log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl EngineConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent must be greater than zero".to_string(),
            ));
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "store_timeout must be greater than zero".to_string(),
            ));
        }
        if self.reporting_instance.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "reporting_instance must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
