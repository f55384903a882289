#![forbid(unsafe_code)]

//! E2E test suite for the panel store.
//!
//! Organized into modules:
//! 1. `store_isolation` – path vs panel subscribers, cross-panel isolation
//! 2. `store_lifecycle` – unregister, replace, orphaned subscriptions
//! 3. `store_unknown` – reads and writes against ids never registered
//! 4. `store_actions` – action channel scoping
//! 5. `store_reentrancy` – writes and cancels from inside listeners
//! 6. `store_batch` – coalescing through `BatchScope` and `update_many`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dialkit_core::{ActionConfig, ColorConfig, DialConfig, DialValue, SelectConfig};
use dialkit_runtime::{BatchScope, DialPanel, DialStore, PanelBinding, PanelId, Subscription};

fn schema() -> DialConfig {
    DialConfig::new()
        .range("speed", 1.0, 0.0, 10.0)
        .select("mode", SelectConfig::new(["x", "y"]))
        .group(
            "a",
            DialConfig::new()
                .number("b", 5.0)
                .color("c", ColorConfig::with_default("#fff")),
        )
        .action("fire", ActionConfig::new())
}

fn registered(raw: &str) -> (DialStore, PanelId) {
    let store = DialStore::new();
    let id = PanelId::from_raw(raw);
    store.register_panel(id.clone(), raw, schema());
    (store, id)
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    (hits, move || h.set(h.get() + 1))
}

// =========================================================================
// 1. Subscription isolation
// =========================================================================

mod store_isolation {
    use super::*;

    #[test]
    fn path_subscriber_sees_only_its_path() {
        let (store, id) = registered("iso");
        let (path_hits, on_path) = counter();
        let (panel_hits, on_panel) = counter();
        let _p = store.subscribe_path(&id, "a.b", on_path);
        let _w = store.subscribe(&id, on_panel);

        store.update_value(&id, "a.b", DialValue::from(1));
        assert_eq!(path_hits.get(), 1);
        assert_eq!(panel_hits.get(), 1);

        store.update_value(&id, "a.c", DialValue::from("#000"));
        assert_eq!(path_hits.get(), 1, "a.b listener must not see a.c");
        assert_eq!(panel_hits.get(), 2);
    }

    #[test]
    fn path_listeners_run_before_panel_listeners() {
        let (store, id) = registered("order");
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (Rc::clone(&order), Rc::clone(&order));
        let _w = store.subscribe(&id, move || o1.borrow_mut().push("panel"));
        let _p = store.subscribe_path(&id, "speed", move || o2.borrow_mut().push("path"));

        store.update_value(&id, "speed", DialValue::from(2));
        assert_eq!(*order.borrow(), vec!["path", "panel"]);
    }

    #[test]
    fn panels_do_not_see_each_other() {
        let store = DialStore::new();
        let a = PanelId::from_raw("a");
        let b = PanelId::from_raw("b");
        store.register_panel(a.clone(), "A", schema());
        store.register_panel(b.clone(), "B", schema());
        let (b_hits, on_b) = counter();
        let _sub = store.subscribe(&b, on_b);

        store.update_value(&a, "speed", DialValue::from(9));
        assert_eq!(b_hits.get(), 0);
        assert_eq!(store.get_value_snapshot(&b, "speed"), None);
    }

    #[test]
    fn every_update_notifies_even_when_value_is_equal() {
        let (store, id) = registered("eq");
        let (hits, cb) = counter();
        let _sub = store.subscribe(&id, cb);
        store.update_value(&id, "speed", DialValue::from(3));
        store.update_value(&id, "speed", DialValue::from(3));
        assert_eq!(hits.get(), 2);
    }
}

// =========================================================================
// 2. Lifecycle safety
// =========================================================================

mod store_lifecycle {
    use super::*;

    #[test]
    fn unregister_silences_every_listener() {
        let (store, id) = registered("gone");
        let (change_hits, on_change) = counter();
        let (path_hits, on_path) = counter();
        let actions = Rc::new(Cell::new(0));
        let a = Rc::clone(&actions);
        let s1 = store.subscribe(&id, on_change);
        let s2 = store.subscribe_path(&id, "speed", on_path);
        let s3 = store.subscribe_actions(&id, move |_| a.set(a.get() + 1));

        store.unregister_panel(&id);
        assert!(!s1.is_active() && !s2.is_active() && !s3.is_active());

        store.update_value(&id, "speed", DialValue::from(4));
        store.emit_action(&id, "fire");
        assert_eq!(change_hits.get(), 0);
        assert_eq!(path_hits.get(), 0);
        assert_eq!(actions.get(), 0);
        assert!(store.get_values(&id).is_empty());
    }

    #[test]
    fn re_registering_the_same_id_does_not_revive_old_listeners() {
        let (store, id) = registered("again");
        let (hits, cb) = counter();
        let _old = store.subscribe(&id, cb);
        store.unregister_panel(&id);
        store.register_panel(id.clone(), "again", schema());

        store.update_value(&id, "speed", DialValue::from(1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn dropping_a_mounted_panel_orphans_its_bindings() {
        let store = DialStore::new();
        let panel = DialPanel::mount(&store, "Motion", schema());
        let id = panel.id().clone();
        let (hits, cb) = counter();
        let sub = panel.subscribe(cb);
        let binding = PanelBinding::new(&store, id.clone());
        assert_eq!(binding.snapshot().number("speed"), Some(1.0));

        drop(panel);
        assert!(!sub.is_active());
        assert!(binding.snapshot().is_empty());
        store.update_value(&id, "speed", DialValue::from(5));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn dropping_the_store_handle_keeps_guards_safe() {
        let (store, id) = registered("drop");
        let (_hits, cb) = counter();
        let sub = store.subscribe(&id, cb);
        drop(store);
        drop(sub);
    }
}

// =========================================================================
// 3. Unknown-panel tolerance
// =========================================================================

mod store_unknown {
    use super::*;

    #[test]
    fn reads_return_defined_empties() {
        let store = DialStore::new();
        let id = PanelId::from_raw("never");
        assert!(store.get_values(&id).is_empty());
        assert_eq!(store.get_value_snapshot(&id, "speed"), None);
        assert!(!store.is_registered(&id));
        assert_eq!(store.panel_name(&id), None);
    }

    #[test]
    fn writes_and_emits_are_dropped() {
        let store = DialStore::new();
        let id = PanelId::from_raw("never");
        store.update_value(&id, "speed", DialValue::from(2));
        store.emit_action(&id, "fire");
        assert!(!store.reset_value(&id, "speed"));
        store.unregister_panel(&id);
        assert!(store.get_values(&id).is_empty());
    }

    #[test]
    fn subscription_before_mount_survives_registration() {
        let store = DialStore::new();
        let id = PanelId::from_raw("early");
        let (hits, cb) = counter();
        let _sub = store.subscribe_path(&id, "speed", cb);

        store.register_panel(id.clone(), "early", schema());
        store.update_value(&id, "speed", DialValue::from(3));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unregister_before_mount_drops_parked_listeners() {
        let store = DialStore::new();
        let id = PanelId::from_raw("early");
        let (hits, cb) = counter();
        let sub = store.subscribe(&id, cb);
        store.unregister_panel(&id);
        assert!(!sub.is_active());

        store.register_panel(id.clone(), "early", schema());
        store.update_value(&id, "speed", DialValue::from(3));
        assert_eq!(hits.get(), 0);
    }
}

// =========================================================================
// 4. Action isolation
// =========================================================================

mod store_actions {
    use super::*;

    #[test]
    fn emit_reaches_only_the_target_panel() {
        let store = DialStore::new();
        let a = PanelId::from_raw("a");
        let b = PanelId::from_raw("b");
        store.register_panel(a.clone(), "A", schema());
        store.register_panel(b.clone(), "B", schema());
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));
        let (sa, sb) = (Rc::clone(&seen_a), Rc::clone(&seen_b));
        let _a = store.subscribe_actions(&a, move |name| sa.borrow_mut().push(name.to_owned()));
        let _b = store.subscribe_actions(&b, move |name| sb.borrow_mut().push(name.to_owned()));

        store.emit_action(&a, "fire");
        assert_eq!(*seen_a.borrow(), vec!["fire".to_owned()]);
        assert!(seen_b.borrow().is_empty());
    }

    #[test]
    fn actions_do_not_touch_values_or_change_listeners() {
        let (store, id) = registered("act");
        let (hits, cb) = counter();
        let _sub = store.subscribe(&id, cb);
        let before = store.version(&id);
        store.emit_action(&id, "fire");
        assert_eq!(hits.get(), 0);
        assert_eq!(store.version(&id), before);
        assert!(store.get_values(&id).is_empty());
    }

    #[test]
    fn actions_are_not_deferred_by_batches() {
        let (store, id) = registered("act");
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let _sub = store.subscribe_actions(&id, move |_| f.set(true));
        let _batch = BatchScope::new();
        store.emit_action(&id, "fire");
        assert!(fired.get());
    }
}

// =========================================================================
// 5. Re-entrancy
// =========================================================================

mod store_reentrancy {
    use super::*;

    #[test]
    fn write_from_listener_completes_before_outer_pass_continues() {
        let (store, id) = registered("re");
        let log = Rc::new(RefCell::new(Vec::new()));

        let (st, rid, l1) = (store.clone(), id.clone(), Rc::clone(&log));
        let _first = store.subscribe_path(&id, "speed", move || {
            l1.borrow_mut().push("speed");
            st.update_value(&rid, "a.b", DialValue::from(2));
        });
        let l2 = Rc::clone(&log);
        let _nested = store.subscribe_path(&id, "a.b", move || l2.borrow_mut().push("a.b"));
        let l3 = Rc::clone(&log);
        let _panel = store.subscribe(&id, move || l3.borrow_mut().push("panel"));

        store.update_value(&id, "speed", DialValue::from(5));
        assert_eq!(*log.borrow(), vec!["speed", "a.b", "panel", "panel"]);
        assert_eq!(store.get_value_snapshot(&id, "a.b"), Some(DialValue::from(2)));
    }

    #[test]
    fn cancelling_a_later_listener_mid_pass_skips_it() {
        let (store, id) = registered("cancel");
        let (late_hits, on_late) = counter();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let v = Rc::clone(&victim);
        let _killer = store.subscribe(&id, move || {
            drop(v.borrow_mut().take());
        });
        *victim.borrow_mut() = Some(store.subscribe(&id, on_late));

        store.update_value(&id, "speed", DialValue::from(1));
        assert_eq!(late_hits.get(), 0);
        assert_eq!(store.listener_count(&id), 1);
    }

    #[test]
    fn listener_may_subscribe_during_notification() {
        let (store, id) = registered("sub");
        let added = Rc::new(RefCell::new(Vec::new()));
        let (st, rid, a) = (store.clone(), id.clone(), Rc::clone(&added));
        let _sub = store.subscribe(&id, move || {
            a.borrow_mut().push(st.subscribe(&rid, || {}));
        });
        store.update_value(&id, "speed", DialValue::from(1));
        assert_eq!(added.borrow().len(), 1);
        assert_eq!(store.listener_count(&id), 2);
    }

    #[test]
    fn unregister_from_listener_stops_remaining_listeners() {
        let (store, id) = registered("self-destruct");
        let (st, rid) = (store.clone(), id.clone());
        let _first = store.subscribe(&id, move || st.unregister_panel(&rid));
        let (hits, cb) = counter();
        let _second = store.subscribe(&id, cb);

        store.update_value(&id, "speed", DialValue::from(1));
        assert_eq!(hits.get(), 0);
        assert!(!store.is_registered(&id));
    }
}

// =========================================================================
// 6. Batching
// =========================================================================

mod store_batch {
    use super::*;

    #[test]
    fn batch_fires_each_listener_once_after_all_writes() {
        let (store, id) = registered("batch");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (st, rid, s) = (store.clone(), id.clone(), Rc::clone(&seen));
        let _sub = store.subscribe(&id, move || {
            let values = st.get_values(&rid);
            s.borrow_mut().push((values.get("speed").cloned(), values.get("a.b").cloned()));
        });

        {
            let _batch = BatchScope::new();
            store.update_value(&id, "speed", DialValue::from(2));
            store.update_value(&id, "a.b", DialValue::from(3));
            store.update_value(&id, "speed", DialValue::from(4));
            assert!(seen.borrow().is_empty());
            assert_eq!(store.get_value_snapshot(&id, "speed"), Some(DialValue::from(4)));
        }
        assert_eq!(
            *seen.borrow(),
            vec![(Some(DialValue::from(4)), Some(DialValue::from(3)))]
        );
    }

    #[test]
    fn update_many_is_batched() {
        let (store, id) = registered("many");
        let (panel_hits, on_panel) = counter();
        let (path_hits, on_path) = counter();
        let _w = store.subscribe(&id, on_panel);
        let _p = store.subscribe_path(&id, "speed", on_path);

        store.update_many(&id, [("speed", 1.5), ("a.b", 2.0), ("speed", 3.0)]);
        assert_eq!(panel_hits.get(), 1);
        assert_eq!(path_hits.get(), 1);
        assert_eq!(store.get_value_snapshot(&id, "speed"), Some(DialValue::from(3.0)));
    }

    #[test]
    fn listener_cancelled_inside_batch_is_skipped_on_flush() {
        let (store, id) = registered("skip");
        let (hits, cb) = counter();
        let sub = store.subscribe(&id, cb);
        {
            let _batch = BatchScope::new();
            store.update_value(&id, "speed", DialValue::from(2));
            sub.cancel();
        }
        assert_eq!(hits.get(), 0);
    }
}
