#![forbid(unsafe_code)]

//! [`DialPanel`]: the mount-scoped handle most callers use.
//!
//! Mounting registers the schema under a freshly minted [`PanelId`];
//! dropping the handle unregisters it. In between, `params()` reads a
//! reference-stable snapshot and `set_params()` writes through to the store
//! after checking the path against the schema.

use std::fmt;
use std::rc::Rc;

use dialkit_core::{ConfigMeta, ConfigNode, DialConfig, DialValue, ResolvedGroup, flatten_config};

use crate::binding::{PanelBinding, PathBinding};
use crate::error::{DialError, Result};
use crate::panel_id::PanelId;
use crate::store::DialStore;
use crate::subscription::Subscription;

/// A mounted panel.
///
/// # Example
///
/// ```
/// use dialkit_core::DialConfig;
/// use dialkit_runtime::{DialPanel, DialStore};
///
/// let store = DialStore::new();
/// let panel = DialPanel::mount(&store, "Motion", DialConfig::new().range("speed", 1.0, 0.0, 10.0));
/// assert_eq!(panel.params().number("speed"), Some(1.0));
///
/// panel.set_params("speed", 7).unwrap();
/// assert_eq!(panel.params().number("speed"), Some(7.0));
/// assert!(panel.set_params("speed.max", 3).is_err());
/// ```
pub struct DialPanel {
    store: DialStore,
    id: PanelId,
    name: String,
    schema: Rc<DialConfig>,
    binding: PanelBinding,
}

impl DialPanel {
    /// Register `schema` on `store` under a new id derived from `name`.
    pub fn mount(store: &DialStore, name: impl Into<String>, schema: impl Into<Rc<DialConfig>>) -> Self {
        let name = name.into();
        let schema = schema.into();
        let id = PanelId::mint(&name);
        store.register_panel(id.clone(), name.clone(), Rc::clone(&schema));
        Self {
            store: store.clone(),
            binding: PanelBinding::new(store, id.clone()),
            id,
            name,
            schema,
        }
    }

    /// Mount on this thread's shared store.
    pub fn mount_global(name: impl Into<String>, schema: impl Into<Rc<DialConfig>>) -> Self {
        Self::mount(&DialStore::global(), name, schema)
    }

    #[must_use]
    pub fn id(&self) -> &PanelId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &DialConfig {
        &self.schema
    }

    #[must_use]
    pub fn store(&self) -> &DialStore {
        &self.store
    }

    /// Control descriptions for a renderer.
    #[must_use]
    pub fn controls(&self) -> Vec<ConfigMeta> {
        flatten_config(&self.schema)
    }

    /// Current resolved values. Same `Rc` until something changes.
    #[must_use]
    pub fn params(&self) -> Rc<ResolvedGroup> {
        self.binding.snapshot()
    }

    /// Write `value` at `path`. Fails if `path` is not a schema leaf.
    pub fn set_params(&self, path: &str, value: impl Into<DialValue>) -> Result<()> {
        self.require_leaf(path)?;
        self.store.update_value(&self.id, path, value.into());
        Ok(())
    }

    /// Drop the override at `path`, restoring its schema default.
    pub fn reset(&self, path: &str) -> Result<()> {
        self.require_leaf(path)?;
        self.store.reset_value(&self.id, path);
        Ok(())
    }

    /// Binding for one leaf of this panel.
    pub fn path(&self, path: &str) -> Result<PathBinding> {
        self.require_leaf(path)?;
        Ok(PathBinding::new(&self.store, self.id.clone(), path))
    }

    /// Notify `on_change` after every write to this panel.
    pub fn subscribe(&self, on_change: impl Fn() + 'static) -> Subscription {
        self.binding.subscribe(on_change)
    }

    /// Call `on_action` with the action path whenever one of this panel's
    /// actions is triggered.
    pub fn on_action(&self, on_action: impl Fn(&str) + 'static) -> Subscription {
        self.store.subscribe_actions(&self.id, on_action)
    }

    /// Fire the action leaf at `path`.
    pub fn trigger(&self, path: &str) -> Result<()> {
        match self.require_leaf(path)? {
            ConfigNode::Action(_) => {
                self.store.emit_action(&self.id, path);
                Ok(())
            }
            _ => Err(DialError::NotAnAction {
                panel: self.id.clone(),
                path: path.to_owned(),
            }),
        }
    }

    fn require_leaf(&self, path: &str) -> Result<&ConfigNode> {
        self.schema.leaf(path).ok_or_else(|| DialError::UnknownPath {
            panel: self.id.clone(),
            path: path.to_owned(),
        })
    }
}

impl Drop for DialPanel {
    fn drop(&mut self) {
        self.store.unregister_panel(&self.id);
    }
}

impl fmt::Debug for DialPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialPanel")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialkit_core::{ActionConfig, ColorConfig, ControlKind};
    use std::cell::RefCell;

    fn schema() -> DialConfig {
        DialConfig::new()
            .range("speed", 1.0, 0.0, 10.0)
            .group(
                "a",
                DialConfig::new()
                    .number("b", 5.0)
                    .color("c", ColorConfig::with_default("#fff")),
            )
            .action("shuffle", ActionConfig::labeled("Shuffle"))
    }

    #[test]
    fn mount_registers_and_drop_unregisters() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "Motion", schema());
        let id = panel.id().clone();
        assert!(id.as_str().starts_with("Motion-"));
        assert!(store.is_registered(&id));
        drop(panel);
        assert!(!store.is_registered(&id));
    }

    #[test]
    fn two_mounts_do_not_share_values() {
        let store = DialStore::new();
        let a = DialPanel::mount(&store, "Motion", schema());
        let b = DialPanel::mount(&store, "Motion", schema());
        a.set_params("speed", 9).expect("leaf");
        assert_eq!(a.params().number("speed"), Some(9.0));
        assert_eq!(b.params().number("speed"), Some(1.0));
    }

    #[test]
    fn set_params_rejects_non_leaf_paths() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "P", schema());
        for bad in ["a", "a.c.default", "speed.min", "missing"] {
            let err = panel.set_params(bad, 1).unwrap_err();
            assert!(matches!(err, DialError::UnknownPath { ref path, .. } if path == bad));
        }
        assert!(store.get_values(panel.id()).is_empty());
    }

    #[test]
    fn params_identity_tracks_changes() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "P", schema());
        let first = panel.params();
        assert!(Rc::ptr_eq(&first, &panel.params()));
        panel.set_params("a.b", 6).expect("leaf");
        let second = panel.params();
        assert!(!Rc::ptr_eq(&first, &second));
        panel.reset("a.b").expect("leaf");
        assert_eq!(panel.params().number("a.b"), Some(5.0));
    }

    #[test]
    fn trigger_reaches_action_listeners() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "P", schema());
        let fired = Rc::new(RefCell::new(Vec::new()));
        let f = Rc::clone(&fired);
        let _sub = panel.on_action(move |action| f.borrow_mut().push(action.to_owned()));

        panel.trigger("shuffle").expect("action");
        assert_eq!(*fired.borrow(), vec!["shuffle".to_owned()]);

        assert!(matches!(
            panel.trigger("speed"),
            Err(DialError::NotAnAction { .. })
        ));
        assert!(matches!(
            panel.trigger("nope"),
            Err(DialError::UnknownPath { .. })
        ));
        assert!(store.get_values(panel.id()).is_empty(), "actions store nothing");
    }

    #[test]
    fn controls_follow_schema_order() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "P", schema());
        let controls = panel.controls();
        let paths: Vec<&str> = controls.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["speed", "a", "shuffle"]);
        assert!(matches!(controls[1].kind, ControlKind::Folder { .. }));
    }

    #[test]
    fn path_binding_requires_leaf() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "P", schema());
        assert!(panel.path("a").is_err());
        let color = panel.path("a.c").expect("leaf");
        assert_eq!(color.get(), Some(DialValue::from("#fff")));
    }
}
