#![forbid(unsafe_code)]

//! Batch coalescing for store notifications.
//!
//! Several writes in a row (a preset applied to a panel, a drag that touches
//! two linked dials) would otherwise notify every listener once per write.
//! Inside a [`BatchScope`] values are still applied immediately, but
//! notifications are queued keyed by subscription id and fired when the
//! outermost scope exits, each listener at most once.
//!
//! # Usage
//!
//! ```ignore
//! use dialkit_runtime::BatchScope;
//!
//! {
//!     let _batch = BatchScope::new();
//!     store.update_value(&id, "x", 1.0.into()); // deferred
//!     store.update_value(&id, "y", 2.0.into()); // deferred
//!     store.update_value(&id, "x", 3.0.into()); // coalesced
//! } // panel listeners fire once here and see x = 3, y = 2
//! ```
//!
//! # Invariants
//!
//! 1. Nested batches are supported: only the outermost scope flushes.
//! 2. Reads inside a batch see the latest values; only notification waits.
//! 3. Flush calls deferred callbacks in the order they were first enqueued.
//! 4. A listener cancelled before the flush reaches it is skipped.
//!
//! # Failure Modes
//!
//! - **Callback panics during flush**: remaining callbacks still run and the
//!   first panic is re-raised afterwards.

use std::cell::RefCell;

use tracing::{debug, info_span};
use web_time::Instant;

use crate::subscription::SubId;

type DeferredNotify = Box<dyn FnOnce()>;

struct DeferredEntry {
    key: SubId,
    notify: DeferredNotify,
}

struct BatchContext {
    /// Nesting depth. Only flush when this reaches 0.
    depth: u32,
    deferred: Vec<DeferredEntry>,
    /// Number of value writes applied while the batch was open.
    writes: u64,
}

thread_local! {
    static BATCH_CTX: RefCell<Option<BatchContext>> = const { RefCell::new(None) };
}

/// Returns true if a batch is currently active on this thread.
pub fn is_batching() -> bool {
    BATCH_CTX.with(|ctx| ctx.borrow().is_some())
}

/// Queue `f` under `key` if a batch is active, otherwise run it now.
///
/// A second enqueue under the same key replaces the queued callback but
/// keeps its original position. Returns `true` if the call was deferred.
pub(crate) fn defer_or_run_keyed(key: SubId, f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            if let Some(entry) = batch.deferred.iter_mut().find(|entry| entry.key == key) {
                entry.notify = Box::new(f);
            } else {
                batch.deferred.push(DeferredEntry {
                    key,
                    notify: Box::new(f),
                });
            }
            true
        } else {
            drop(guard);
            f();
            false
        }
    })
}

/// Count a value write against the open batch, if any.
pub(crate) fn record_write() {
    BATCH_CTX.with(|ctx| {
        if let Some(ref mut batch) = *ctx.borrow_mut() {
            batch.writes = batch.writes.saturating_add(1);
        }
    });
}

/// Fire everything a closed batch queued.
fn flush(batch: BatchContext) {
    let writes = batch.writes;
    let deferred: Vec<DeferredNotify> = batch
        .deferred
        .into_iter()
        .map(|entry| entry.notify)
        .collect();

    if deferred.is_empty() {
        return;
    }

    let listeners_notified = deferred.len() as u64;
    let start = Instant::now();
    let _span = info_span!(
        "dialkit.batch_flush",
        writes,
        listeners_notified,
        duration_us = tracing::field::Empty
    )
    .entered();

    let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
    for notify in deferred {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(notify));
        if let Err(payload) = result
            && first_panic.is_none()
        {
            first_panic = Some(payload);
        }
    }

    let duration_us = start.elapsed().as_micros() as u64;
    tracing::Span::current().record("duration_us", duration_us);
    debug!(writes, listeners_notified, duration_us, "batch flushed");

    if let Some(payload) = first_panic {
        std::panic::resume_unwind(payload);
    }
}

/// RAII guard that opens a batch.
///
/// While a `BatchScope` is alive on this thread, store change notifications
/// are deferred. When the outermost scope drops, they fire.
pub struct BatchScope {
    is_root: bool,
}

impl BatchScope {
    #[must_use]
    pub fn new() -> Self {
        let is_root = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) => {
                    batch.depth += 1;
                    false
                }
                None => {
                    *guard = Some(BatchContext {
                        depth: 1,
                        deferred: Vec::new(),
                        writes: 0,
                    });
                    true
                }
            }
        });
        Self { is_root }
    }

    /// Number of listener notifications queued in the current batch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        BATCH_CTX.with(|ctx| ctx.borrow().as_ref().map_or(0, |b| b.deferred.len()))
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let should_flush = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            if let Some(ref mut batch) = *guard {
                batch.depth -= 1;
                batch.depth == 0
            } else {
                false
            }
        });

        if should_flush {
            // Close the batch before firing so listeners that write again are
            // notified synchronously.
            if let Some(batch) = BATCH_CTX.with(|ctx| ctx.borrow_mut().take()) {
                flush(batch);
            }
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("is_root", &self.is_root)
            .field("pending", &self.pending_count())
            .finish()
    }
}
