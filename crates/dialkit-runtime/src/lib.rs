#![forbid(unsafe_code)]

//! DialKit Runtime
//!
//! The reactive side of DialKit: a registry of tweak panels, change and
//! action subscriptions, batching, and the bindings a renderer reads from.
//!
//! # Key Components
//!
//! - [`DialStore`] - per-panel schemas, flat values and listeners
//! - [`Subscription`] - RAII guard returned by every subscribe call
//! - [`BatchScope`] - coalesces notifications until the scope exits
//! - [`PanelBinding`] / [`PathBinding`] - reference-stable reads
//! - [`DialPanel`] - mount-scoped handle with `params()` / `set_params()`
//! - [`StoreConfig`] - store behavior knobs, loadable from TOML/JSON with the
//!   `config` feature
//!
//! # Threading
//! Everything here is `!Send`: the store models a single UI thread.
//! [`DialStore::global`] hands out a per-thread shared instance.

pub mod batch;
pub mod binding;
pub mod config;
pub mod error;
pub mod panel;
pub mod panel_id;
pub mod store;
pub mod subscription;

pub use batch::{BatchScope, is_batching};
pub use binding::{PanelBinding, PathBinding};
pub use config::{ConfigError, StoreConfig, UnknownPathPolicy};
pub use error::{DialError, Result};
pub use panel::DialPanel;
pub use panel_id::PanelId;
pub use store::DialStore;
pub use subscription::{SubId, Subscription};
