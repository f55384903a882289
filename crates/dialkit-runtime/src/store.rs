#![forbid(unsafe_code)]

//! The panel registry.
//!
//! [`DialStore`] owns every registered panel: its schema, its flat value map,
//! and the listeners interested in it. It is a cheap `Clone` handle over
//! shared single-threaded state.
//!
//! # Design
//!
//! All state lives in one `RefCell<StoreInner>`. Every operation borrows it
//! for the mutation only, collects the listeners to call, releases the
//! borrow, and then notifies. Listeners may therefore call back into the
//! store (read, write, subscribe, cancel) without hitting a borrow panic; a
//! write made from inside a listener runs its own complete notification pass
//! before the outer pass continues.
//!
//! Listeners subscribed to a panel id that is not registered yet are parked
//! and adopted when that id registers, so mount order never loses a
//! subscription.
//!
//! # Invariants
//!
//! 1. A listener never fires after its panel is unregistered or replaced,
//!    or after its [`Subscription`] is cancelled or dropped.
//! 2. `update_value` notifies path listeners of exactly that path, then
//!    panel listeners, and only after the value is visible to readers.
//! 3. Unknown panels read as empty and ignore writes and emits.
//! 4. `version` is store-wide monotonic: every registration and every write
//!    gives the panel a version it never had before.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use dialkit_core::{DialConfig, DialValue, FlatValues};
use tracing::{debug, info_span, warn};
use web_time::Instant;

use crate::batch::{self, BatchScope};
use crate::config::{StoreConfig, UnknownPathPolicy};
use crate::panel_id::PanelId;
use crate::subscription::{Listener, ListenerSet, SubId, Subscription};

type ChangeFn = dyn Fn();
type ActionFn = dyn Fn(&str);

thread_local! {
    static GLOBAL: DialStore = DialStore::new();
}

/// Which listener set a subscription lives in.
#[derive(Debug, Clone)]
enum Scope {
    Panel,
    Path(String),
    Action,
}

#[derive(Default)]
struct PanelListeners {
    panel: ListenerSet<ChangeFn>,
    paths: AHashMap<String, ListenerSet<ChangeFn>>,
    actions: ListenerSet<ActionFn>,
}

impl PanelListeners {
    fn remove(&mut self, scope: &Scope, id: SubId) {
        match scope {
            Scope::Panel => {
                self.panel.remove(id);
            }
            Scope::Path(path) => {
                if let Some(set) = self.paths.get_mut(path) {
                    set.remove(id);
                    if set.is_empty() {
                        self.paths.remove(path);
                    }
                }
            }
            Scope::Action => {
                self.actions.remove(id);
            }
        }
    }

    fn deactivate_all(mut self) {
        self.panel.deactivate_all();
        self.actions.deactivate_all();
        for (_, mut set) in self.paths.drain() {
            set.deactivate_all();
        }
    }

    fn count(&self) -> usize {
        let paths: usize = self.paths.values().map(ListenerSet::len).sum();
        self.panel.len() + self.actions.len() + paths
    }
}

struct PanelState {
    name: String,
    schema: Rc<DialConfig>,
    values: Rc<FlatValues>,
    version: u64,
    listeners: PanelListeners,
}

struct StoreInner {
    config: StoreConfig,
    panels: AHashMap<PanelId, PanelState>,
    /// Listeners for ids that are not registered yet.
    parked: AHashMap<PanelId, PanelListeners>,
    empty: Rc<FlatValues>,
    next_sub: SubId,
    next_version: u64,
}

impl StoreInner {
    fn take_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    fn listeners_mut(&mut self, panel: &PanelId) -> &mut PanelListeners {
        match self.panels.get_mut(panel) {
            Some(state) => &mut state.listeners,
            None => self.parked.entry(panel.clone()).or_default(),
        }
    }

    fn detach(&mut self, panel: &PanelId, scope: &Scope, id: SubId) {
        if let Some(state) = self.panels.get_mut(panel) {
            state.listeners.remove(scope, id);
        } else if let Some(parked) = self.parked.get_mut(panel) {
            parked.remove(scope, id);
            if parked.count() == 0 {
                self.parked.remove(panel);
            }
        }
    }
}

/// Registry of tweak panels and their live values.
///
/// # Example
///
/// ```
/// use dialkit_core::DialConfig;
/// use dialkit_runtime::{DialStore, PanelId};
///
/// let store = DialStore::new();
/// let id = PanelId::from_raw("motion");
/// store.register_panel(id.clone(), "Motion", DialConfig::new().range("speed", 1.0, 0.0, 10.0));
/// store.update_value(&id, "speed", 7.0.into());
/// assert_eq!(store.get_value_snapshot(&id, "speed").and_then(|v| v.as_f64()), Some(7.0));
/// ```
#[derive(Clone)]
pub struct DialStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for DialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                config,
                panels: AHashMap::new(),
                parked: AHashMap::new(),
                empty: Rc::new(FlatValues::new()),
                next_sub: 1,
                next_version: 1,
            })),
        }
    }

    /// Handle to this thread's shared store, created on first use.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.with(Clone::clone)
    }

    /// Run `f` against this thread's shared store.
    pub fn with_global<R>(f: impl FnOnce(&DialStore) -> R) -> R {
        GLOBAL.with(f)
    }

    #[must_use]
    pub fn config(&self) -> StoreConfig {
        self.inner.borrow().config.clone()
    }

    // --- lifecycle ----------------------------------------------------

    /// Register `schema` under `id` with an empty value map.
    ///
    /// Registering an id that is already present replaces the old entry:
    /// its values are discarded and its listeners are detached. Listeners
    /// parked for `id` before registration are adopted.
    pub fn register_panel(
        &self,
        id: PanelId,
        name: impl Into<String>,
        schema: impl Into<Rc<DialConfig>>,
    ) {
        let name = name.into();
        let schema = schema.into();
        let replaced = {
            let mut inner = self.inner.borrow_mut();
            let version = inner.take_version();
            let listeners = inner.parked.remove(&id).unwrap_or_default();
            inner.panels.insert(
                id.clone(),
                PanelState {
                    name: name.clone(),
                    schema,
                    values: Rc::new(FlatValues::new()),
                    version,
                    listeners,
                },
            )
        };
        match replaced {
            Some(old) => {
                debug!(panel = %id, name = %name, "panel re-registered, previous listeners detached");
                old.listeners.deactivate_all();
            }
            None => debug!(panel = %id, name = %name, "panel registered"),
        }
    }

    /// Remove `id` and make all of its subscriptions inert. Unknown ids are
    /// ignored.
    pub fn unregister_panel(&self, id: &PanelId) {
        let (removed, parked) = {
            let mut inner = self.inner.borrow_mut();
            (inner.panels.remove(id), inner.parked.remove(id))
        };
        if let Some(parked) = parked {
            parked.deactivate_all();
        }
        match removed {
            Some(state) => {
                debug!(panel = %id, name = %state.name, "panel unregistered");
                state.listeners.deactivate_all();
            }
            None => debug!(panel = %id, "unregister of unknown panel ignored"),
        }
    }

    // --- reads --------------------------------------------------------

    /// Current flat value map. Unknown panels share one empty map.
    #[must_use]
    pub fn get_values(&self, id: &PanelId) -> Rc<FlatValues> {
        let inner = self.inner.borrow();
        match inner.panels.get(id) {
            Some(state) => Rc::clone(&state.values),
            None => Rc::clone(&inner.empty),
        }
    }

    /// The value written at `path`, if any. Schema defaults are not
    /// consulted; see [`PathBinding`](crate::PathBinding) for that.
    #[must_use]
    pub fn get_value_snapshot(&self, id: &PanelId, path: &str) -> Option<DialValue> {
        self.inner
            .borrow()
            .panels
            .get(id)
            .and_then(|state| state.values.get(path).cloned())
    }

    /// Change counter for `id`; `0` for unknown panels.
    #[must_use]
    pub fn version(&self, id: &PanelId) -> u64 {
        self.inner.borrow().panels.get(id).map_or(0, |state| state.version)
    }

    #[must_use]
    pub fn is_registered(&self, id: &PanelId) -> bool {
        self.inner.borrow().panels.contains_key(id)
    }

    /// Registered ids in sorted order.
    #[must_use]
    pub fn panel_ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self.inner.borrow().panels.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn panel_name(&self, id: &PanelId) -> Option<String> {
        self.inner.borrow().panels.get(id).map(|state| state.name.clone())
    }

    #[must_use]
    pub fn panel_schema(&self, id: &PanelId) -> Option<Rc<DialConfig>> {
        self.inner
            .borrow()
            .panels
            .get(id)
            .map(|state| Rc::clone(&state.schema))
    }

    /// Live listeners attached to `id`, parked ones included.
    #[must_use]
    pub fn listener_count(&self, id: &PanelId) -> usize {
        let inner = self.inner.borrow();
        inner
            .panels
            .get(id)
            .map(|state| &state.listeners)
            .or_else(|| inner.parked.get(id))
            .map_or(0, PanelListeners::count)
    }

    // --- writes -------------------------------------------------------

    /// Set `path` to `value` and notify the listeners of that path, then
    /// the panel listeners. Writes to unknown panels are dropped.
    pub fn update_value(&self, id: &PanelId, path: &str, value: DialValue) {
        let listeners = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let Some(state) = inner.panels.get_mut(id) else {
                debug!(panel = %id, path, "write to unregistered panel dropped");
                return;
            };
            if inner.config.unknown_paths == UnknownPathPolicy::Warn
                && state.schema.leaf(path).is_none()
            {
                warn!(panel = %id, path, "write to path outside the panel schema");
            }
            Rc::make_mut(&mut state.values).insert(path, value);
            state.version = inner.next_version;
            inner.next_version += 1;
            collect_change_listeners(&mut state.listeners, path)
        };
        batch::record_write();
        self.notify(id, listeners);
    }

    /// Remove the override at `path` so the schema default applies again.
    /// Returns whether an override was present; listeners are notified only
    /// in that case.
    pub fn reset_value(&self, id: &PanelId, path: &str) -> bool {
        let listeners = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let Some(state) = inner.panels.get_mut(id) else {
                return false;
            };
            if !state.values.contains(path) {
                return false;
            }
            Rc::make_mut(&mut state.values).remove(path);
            state.version = inner.next_version;
            inner.next_version += 1;
            collect_change_listeners(&mut state.listeners, path)
        };
        batch::record_write();
        self.notify(id, listeners);
        true
    }

    /// Apply several writes inside one batch: every listener fires at most
    /// once, after all values are in place.
    pub fn update_many<I, P, V>(&self, id: &PanelId, values: I)
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<DialValue>,
    {
        let _batch = BatchScope::new();
        for (path, value) in values {
            self.update_value(id, path.as_ref(), value.into());
        }
    }

    // --- subscriptions ------------------------------------------------

    /// Call `on_change` after every write to `id`.
    pub fn subscribe(&self, id: &PanelId, on_change: impl Fn() + 'static) -> Subscription {
        let callback: Rc<ChangeFn> = Rc::new(on_change);
        self.attach(id, Scope::Panel, |listeners, sub| {
            let (listener, active) = Listener::new(sub, callback);
            listeners.panel.push(listener);
            active
        })
    }

    /// Call `on_change` after every write to exactly `path` of `id`.
    pub fn subscribe_path(
        &self,
        id: &PanelId,
        path: &str,
        on_change: impl Fn() + 'static,
    ) -> Subscription {
        let callback: Rc<ChangeFn> = Rc::new(on_change);
        self.attach(id, Scope::Path(path.to_owned()), |listeners, sub| {
            let (listener, active) = Listener::new(sub, callback);
            listeners
                .paths
                .entry(path.to_owned())
                .or_default()
                .push(listener);
            active
        })
    }

    /// Call `on_action` with the action name for every emit on `id`.
    pub fn subscribe_actions(
        &self,
        id: &PanelId,
        on_action: impl Fn(&str) + 'static,
    ) -> Subscription {
        let callback: Rc<ActionFn> = Rc::new(on_action);
        self.attach(id, Scope::Action, |listeners, sub| {
            let (listener, active) = Listener::new(sub, callback);
            listeners.actions.push(listener);
            active
        })
    }

    /// Fire `action` to the action listeners of `id`. Nothing is stored and
    /// batches do not defer actions.
    pub fn emit_action(&self, id: &PanelId, action: &str) {
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            match inner.panels.get_mut(id) {
                Some(state) => state.listeners.actions.snapshot(),
                None => {
                    debug!(panel = %id, action, "action for unregistered panel dropped");
                    return;
                }
            }
        };
        debug!(panel = %id, action, listeners = listeners.len(), "action emitted");
        for listener in &listeners {
            listener.fire_with(action);
        }
    }

    fn attach(
        &self,
        id: &PanelId,
        scope: Scope,
        insert: impl FnOnce(&mut PanelListeners, SubId) -> Rc<Cell<bool>>,
    ) -> Subscription {
        let (sub, active) = {
            let mut inner = self.inner.borrow_mut();
            let sub = inner.next_sub;
            inner.next_sub += 1;
            let active = insert(inner.listeners_mut(id), sub);
            (sub, active)
        };
        let store: Weak<RefCell<StoreInner>> = Rc::downgrade(&self.inner);
        let panel = id.clone();
        Subscription::new(sub, active, move || {
            if let Some(shared) = store.upgrade()
                && let Ok(mut inner) = shared.try_borrow_mut()
            {
                inner.detach(&panel, &scope, sub);
            }
        })
    }

    fn notify(&self, id: &PanelId, listeners: Vec<Listener<ChangeFn>>) {
        if listeners.is_empty() {
            return;
        }
        if batch::is_batching() {
            for listener in listeners {
                batch::defer_or_run_keyed(listener.id, move || listener.fire());
            }
            return;
        }

        let (trace, slow_us) = {
            let inner = self.inner.borrow();
            (inner.config.trace_propagation, inner.config.slow_propagation_us)
        };
        let span = if trace {
            info_span!(
                "dialkit.propagate",
                panel = %id,
                listeners_notified = listeners.len() as u64,
                duration_us = tracing::field::Empty
            )
        } else {
            tracing::Span::none()
        };
        let _entered = span.enter();
        let start = Instant::now();

        for listener in &listeners {
            listener.fire();
        }

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("duration_us", duration_us);
        if duration_us > slow_us {
            warn!(panel = %id, duration_us, slow_us, "slow propagation pass");
        }
    }
}

/// Path listeners of `path` followed by panel listeners.
fn collect_change_listeners(
    listeners: &mut PanelListeners,
    path: &str,
) -> Vec<Listener<ChangeFn>> {
    let mut out = listeners
        .paths
        .get_mut(path)
        .map(ListenerSet::snapshot)
        .unwrap_or_default();
    out.extend(listeners.panel.snapshot());
    out
}

impl fmt::Debug for DialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("DialStore")
                .field("panels", &inner.panels.len())
                .field("parked", &inner.parked.len())
                .finish(),
            Err(_) => f.debug_struct("DialStore").finish_non_exhaustive(),
        }
    }
}
