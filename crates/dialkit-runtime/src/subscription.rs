#![forbid(unsafe_code)]

//! Subscriber bookkeeping and the [`Subscription`] guard.
//!
//! # Design
//!
//! Every registered callback is a [`Listener`]: the callback `Rc`, its id,
//! and a shared `active` flag. The store keeps listeners in per-panel
//! [`ListenerSet`]s; the caller keeps a [`Subscription`] holding the same
//! flag.
//!
//! Notification snapshots the set first (copy-before-iterate) and then
//! checks each listener's flag right before invoking it. A listener
//! cancelled by an earlier callback in the same pass is therefore skipped,
//! and cancelling never touches the vector being iterated.
//!
//! # Invariants
//!
//! 1. A listener whose flag is cleared is never invoked again.
//! 2. Flags are cleared by [`Subscription::cancel`], by dropping the guard,
//!    and by the store when the owning panel is unregistered or replaced.
//! 3. Inactive entries are pruned on the next snapshot at the latest.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Identifier of one subscription, unique within a store.
pub type SubId = u64;

/// A registered callback plus its cancellation flag.
pub(crate) struct Listener<F: ?Sized> {
    pub(crate) id: SubId,
    active: Rc<Cell<bool>>,
    callback: Rc<F>,
}

impl<F: ?Sized> Clone for Listener<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Rc::clone(&self.active),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<F: ?Sized> Listener<F> {
    /// New active listener. The returned flag is shared with the guard.
    pub(crate) fn new(id: SubId, callback: Rc<F>) -> (Self, Rc<Cell<bool>>) {
        let active = Rc::new(Cell::new(true));
        let listener = Self {
            id,
            active: Rc::clone(&active),
            callback,
        };
        (listener, active)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn deactivate(&self) {
        self.active.set(false);
    }
}

impl Listener<dyn Fn()> {
    pub(crate) fn fire(&self) {
        if self.is_active() {
            (self.callback)();
        }
    }
}

impl Listener<dyn Fn(&str)> {
    pub(crate) fn fire_with(&self, arg: &str) {
        if self.is_active() {
            (self.callback)(arg);
        }
    }
}

/// Ordered collection of listeners. Notification follows registration
/// order.
pub(crate) struct ListenerSet<F: ?Sized> {
    entries: Vec<Listener<F>>,
}

impl<F: ?Sized> Default for ListenerSet<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> ListenerSet<F> {
    pub(crate) fn push(&mut self, listener: Listener<F>) {
        self.entries.push(listener);
    }

    /// Remove the listener with `id`. Returns whether it was present.
    pub(crate) fn remove(&mut self, id: SubId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        self.entries.len() != before
    }

    /// Prune inactive entries and clone the live ones for iteration.
    pub(crate) fn snapshot(&mut self) -> Vec<Listener<F>> {
        self.entries.retain(Listener::is_active);
        self.entries.clone()
    }

    /// Deactivate and drop every listener.
    pub(crate) fn deactivate_all(&mut self) {
        for listener in self.entries.drain(..) {
            listener.deactivate();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Guard for a store subscription.
///
/// Dropping the guard (or calling [`cancel`](Self::cancel)) deregisters the
/// callback; it will not be called afterwards, even if a notification pass
/// is in progress.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubId,
    active: Rc<Cell<bool>>,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(id: SubId, active: Rc<Cell<bool>>, detach: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            active,
            detach: Some(Box::new(detach)),
        }
    }

    #[must_use]
    pub fn id(&self) -> SubId {
        self.id
    }

    /// False once cancelled, dropped, or orphaned by panel teardown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Deregister now. Equivalent to dropping the guard.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.active.set(false);
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}
