#![forbid(unsafe_code)]

//! Error types for the high-level panel API.
//!
//! Store operations never fail: unknown panels read as empty and writes to
//! them are dropped. Errors only arise where a caller asks for something the
//! schema can rule out, and when loading configuration.

use thiserror::Error;

use crate::config::ConfigError;
use crate::panel_id::PanelId;

/// Errors surfaced by [`DialPanel`](crate::DialPanel) and config loading.
#[derive(Debug, Error)]
pub enum DialError {
    /// The path does not name a leaf of the panel schema.
    #[error("panel {panel}: no schema leaf at path {path:?}")]
    UnknownPath { panel: PanelId, path: String },

    /// The path names a leaf that is not an action.
    #[error("panel {panel}: {path:?} is not an action")]
    NotAnAction { panel: PanelId, path: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for DialKit runtime operations.
pub type Result<T> = std::result::Result<T, DialError>;
