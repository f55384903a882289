#![forbid(unsafe_code)]

//! Read-side bindings for rendering layers.
//!
//! A renderer wants two things from the store: a way to be told that
//! something changed, and a way to read the current state that returns the
//! *same* object until it actually changes. [`PanelBinding`] provides that
//! for a whole panel as a resolved snapshot; [`PathBinding`] for one leaf.
//!
//! Notification carries no payload. Consumers call `snapshot()` / `get()`
//! both to prime their initial state and after each notification.
//!
//! # Usage
//!
//! ```ignore
//! let binding = PanelBinding::new(&store, id.clone());
//! let _sub = binding.subscribe(move || request_redraw());
//!
//! let a = binding.snapshot();
//! let b = binding.snapshot();
//! assert!(Rc::ptr_eq(&a, &b)); // nothing changed in between
//! ```
//!
//! # Invariants
//!
//! 1. `PanelBinding::snapshot` returns the identical `Rc` until the panel's
//!    version changes.
//! 2. After a change, groups whose leaves did not change keep their `Rc`,
//!    and the root is reused when it compares shallow-equal.
//! 3. A binding to an unregistered panel yields an empty snapshot and never
//!    panics; it starts resolving once the panel registers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dialkit_core::{ConfigNode, DialValue, ResolvedGroup, Resolver};

use crate::panel_id::PanelId;
use crate::store::DialStore;
use crate::subscription::Subscription;

#[derive(Default)]
struct SnapshotCache {
    resolver: Resolver,
    /// Version the cached snapshot was resolved at.
    cached: Option<(u64, Rc<ResolvedGroup>)>,
}

/// Whole-panel binding producing reference-stable resolved snapshots.
pub struct PanelBinding {
    store: DialStore,
    panel: PanelId,
    cache: RefCell<SnapshotCache>,
}

impl PanelBinding {
    #[must_use]
    pub fn new(store: &DialStore, panel: PanelId) -> Self {
        Self {
            store: store.clone(),
            panel,
            cache: RefCell::new(SnapshotCache::default()),
        }
    }

    #[must_use]
    pub fn panel_id(&self) -> &PanelId {
        &self.panel
    }

    /// Notify `on_change` after every write to the panel.
    pub fn subscribe(&self, on_change: impl Fn() + 'static) -> Subscription {
        self.store.subscribe(&self.panel, on_change)
    }

    /// The current resolved snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Rc<ResolvedGroup> {
        let version = self.store.version(&self.panel);
        let mut cache = self.cache.borrow_mut();
        if let Some((at, snapshot)) = &cache.cached
            && *at == version
        {
            return Rc::clone(snapshot);
        }

        let snapshot = match self.store.panel_schema(&self.panel) {
            Some(schema) => {
                let values = self.store.get_values(&self.panel);
                cache.resolver.resolve(&schema, &*values)
            }
            None => {
                cache.resolver.clear();
                Rc::new(ResolvedGroup::default())
            }
        };
        cache.cached = Some((version, Rc::clone(&snapshot)));
        snapshot
    }
}

impl fmt::Debug for PanelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelBinding")
            .field("panel", &self.panel)
            .finish_non_exhaustive()
    }
}

/// Single-leaf binding: one control's view of the store.
#[derive(Clone)]
pub struct PathBinding {
    store: DialStore,
    panel: PanelId,
    path: String,
}

impl PathBinding {
    #[must_use]
    pub fn new(store: &DialStore, panel: PanelId, path: impl Into<String>) -> Self {
        Self {
            store: store.clone(),
            panel,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn panel_id(&self) -> &PanelId {
        &self.panel
    }

    /// Written value, else the schema default of the leaf, else `None`.
    #[must_use]
    pub fn get(&self) -> Option<DialValue> {
        self.store
            .get_value_snapshot(&self.panel, &self.path)
            .or_else(|| {
                self.store
                    .panel_schema(&self.panel)
                    .and_then(|schema| schema.leaf(&self.path).and_then(ConfigNode::default_value))
            })
    }

    /// Write through to the store.
    pub fn set(&self, value: impl Into<DialValue>) {
        self.store.update_value(&self.panel, &self.path, value.into());
    }

    /// Notify `on_change` after writes to this path only.
    pub fn subscribe(&self, on_change: impl Fn() + 'static) -> Subscription {
        self.store.subscribe_path(&self.panel, &self.path, on_change)
    }
}

impl fmt::Debug for PathBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathBinding")
            .field("panel", &self.panel)
            .field("path", &self.path)
            .finish()
    }
}
