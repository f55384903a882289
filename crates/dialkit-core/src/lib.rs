#![forbid(unsafe_code)]

//! DialKit Core
//!
//! Data model and pure algorithms behind DialKit tweak panels.
//!
//! # Key Components
//!
//! - [`DialConfig`] / [`ConfigNode`] - the hierarchical schema callers declare
//! - [`DialValue`] / [`FlatValues`] - leaf values and the dot-path value map
//! - [`Resolver`] - rebuilds schema-shaped snapshots from flat values while
//!   keeping `Rc` identity for everything that did not change
//! - [`shallow_equal`] - the per-key identity comparison the resolver uses
//! - [`flatten_config`] - control metadata ([`ConfigMeta`]) for renderers
//!
//! # Role in DialKit
//! `dialkit-core` has no notion of panels, subscribers or time. The store in
//! `dialkit-runtime` owns the mutable state and calls into this crate to turn
//! it into snapshots.

pub mod compare;
pub mod error;
#[cfg(feature = "serde")]
pub mod json;
pub mod meta;
pub mod path;
pub mod resolve;
pub mod schema;
pub mod value;

pub use compare::{same_snapshot, shallow_equal};
pub use error::SchemaError;
pub use meta::{ConfigMeta, ControlKind, flatten_config, format_label};
pub use resolve::{Resolved, ResolvedGroup, Resolver, ValueSource, resolve};
pub use schema::{
    ColorConfig, ConfigNode, DialConfig, MonitorConfig, RangeTuple, SelectConfig, SelectOption,
    TextConfig,
};
pub use value::{ActionConfig, DialValue, FlatValues, SpringConfig};
