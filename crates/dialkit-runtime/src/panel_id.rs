#![forbid(unsafe_code)]

//! Panel identifiers.
//!
//! A panel id is the human-readable panel name plus an instance suffix, so
//! the same logical panel can be mounted more than once without the mounts
//! sharing state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Unique key of a registered panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(String);

impl PanelId {
    /// Mint a fresh id for a new mount of `name`: `"{name}-{n}"` where `n`
    /// is unique for the lifetime of the process.
    #[must_use]
    pub fn mint(name: &str) -> Self {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{name}-{instance}"))
    }

    /// Use `id` verbatim.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(id: &str) -> Self {
        Self::from_raw(id)
    }
}

impl From<String> for PanelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
