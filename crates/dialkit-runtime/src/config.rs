#![forbid(unsafe_code)]

//! Store behavior configuration.
//!
//! [`StoreConfig`] gathers the few knobs a [`DialStore`](crate::DialStore)
//! has. With the `config` feature it can be loaded from TOML or JSON.
//!
//! ```toml
//! # dialkit.toml
//! unknown_paths = "warn"
//! trace_propagation = true
//! slow_propagation_us = 16000
//! ```
//!
//! ```rust,ignore
//! let config = StoreConfig::from_toml_file("dialkit.toml")?.validated()?;
//! let store = DialStore::with_config(config);
//! ```
//!
//! # Defaults
//!
//! `StoreConfig::default()` stores unknown paths silently, traces every
//! propagation pass, and flags passes slower than one 60 Hz frame.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// What `update_value` does with a path the panel schema has no leaf for.
///
/// The value is stored either way; it just never appears in a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum UnknownPathPolicy {
    #[default]
    Store,
    Warn,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct StoreConfig {
    /// Handling of writes to paths outside the schema.
    pub unknown_paths: UnknownPathPolicy,

    /// Open a `dialkit.propagate` span around every notification pass.
    pub trace_propagation: bool,

    /// Propagation passes slower than this (microseconds) log a warning.
    pub slow_propagation_us: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            unknown_paths: UnknownPathPolicy::Store,
            trace_propagation: true,
            slow_propagation_us: 16_000,
        }
    }
}

impl StoreConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.slow_propagation_us == 0 {
            errors.push("slow_propagation_us must be > 0".into());
        }
        errors
    }

    /// `self` if [`validate`](Self::validate) finds nothing, otherwise the
    /// collected problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Failure to load or validate a [`StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
