// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry configuration
//!
//! Parsed from TOML:
//!
//! ```toml
//! fault_policy = "propagate"
//! max_listeners = 16
//! pattern_size_limit = 1048576
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a registry configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What dispatch does when a listener returns an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Log and report the fault, then keep dispatching
    #[default]
    Isolate,
    /// Stop at the first fault and return it to the dispatcher
    Propagate,
}

/// Construction-time options for a `Registry`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub fault_policy: FaultPolicy,
    /// Warn once when a single key holds more listeners than this
    pub max_listeners: Option<usize>,
    /// Compiled regex size limit for wildcard keys, in bytes
    pub pattern_size_limit: Option<usize>,
}

impl RegistryConfig {
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn with_max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = Some(max);
        self
    }

    pub fn with_pattern_size_limit(mut self, limit: usize) -> Self {
        self.pattern_size_limit = Some(limit);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
