#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use dialkit_core::{DialConfig, DialValue, resolve};
use dialkit_runtime::{BatchScope, DialStore, PanelBinding, PanelId};
use libfuzzer_sys::fuzz_target;

const PATHS: [&str; 4] = ["speed", "mode", "style.size", "style.on"];

#[derive(Debug, Arbitrary)]
enum Op {
    Write { path: u8, value: i16 },
    Toggle { path: u8, on: bool },
    Reset { path: u8 },
    Batch { writes: Vec<(u8, i16)> },
    Reregister,
    Unregister,
    Snapshot,
}

fn schema() -> DialConfig {
    DialConfig::new()
        .range("speed", 1.0, 0.0, 10.0)
        .string("mode", "x")
        .group(
            "style",
            DialConfig::new().number("size", 4.0).toggle("on", false),
        )
}

fn path(index: u8) -> &'static str {
    PATHS[usize::from(index) % PATHS.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let store = DialStore::new();
    let id = PanelId::from_raw("fuzz");
    store.register_panel(id.clone(), "Fuzz", schema());
    let binding = PanelBinding::new(&store, id.clone());

    let calls = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&calls);
    let mut sub = Some(store.subscribe(&id, move || counter.set(counter.get() + 1)));

    let mut last_version = store.version(&id);
    for op in ops {
        match op {
            Op::Write { path: p, value } => {
                store.update_value(&id, path(p), DialValue::from(f64::from(value)));
            }
            Op::Toggle { path: p, on } => store.update_value(&id, path(p), DialValue::from(on)),
            Op::Reset { path: p } => {
                store.reset_value(&id, path(p));
            }
            Op::Batch { writes } => {
                let _batch = BatchScope::new();
                for (p, value) in writes.into_iter().take(16) {
                    store.update_value(&id, path(p), DialValue::from(f64::from(value)));
                }
            }
            Op::Reregister => {
                store.register_panel(id.clone(), "Fuzz", schema());
                sub = None;
            }
            Op::Unregister => {
                store.unregister_panel(&id);
                sub = None;
            }
            Op::Snapshot => {}
        }

        let version = store.version(&id);
        if store.is_registered(&id) {
            assert!(version >= last_version || last_version == 0);
            let expected = resolve(&schema(), &*store.get_values(&id));
            assert_eq!(*binding.snapshot(), *expected);
        } else {
            assert_eq!(version, 0);
            assert!(store.get_values(&id).is_empty());
            assert!(binding.snapshot().is_empty());
        }
        last_version = version;
    }

    // Cancelled or detached subscriptions stop counting.
    let seen = calls.get();
    drop(sub);
    store.update_value(&id, "speed", DialValue::from(9.0));
    assert_eq!(calls.get(), seen);
});
