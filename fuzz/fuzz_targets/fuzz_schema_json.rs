#![no_main]

use std::rc::Rc;

use dialkit_core::{ConfigNode, DialConfig, FlatValues, Resolver, flatten_config, resolve};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 8192 {
        return;
    }
    let Ok(schema) = DialConfig::from_json_str(text) else {
        return;
    };

    let snapshot = resolve(&schema, &FlatValues::new());

    // Keys containing the separator cannot be addressed by path.
    if !has_dotted_key(&schema) {
        for path in schema.leaf_paths() {
            if schema.leaf(&path).and_then(ConfigNode::default_value).is_none() {
                continue;
            }
            assert!(
                snapshot.lookup(&path).is_some(),
                "leaf {path} missing from snapshot"
            );
        }
    }

    // Memoized resolution over unchanged values must reuse the root.
    let mut resolver = Resolver::new();
    let first = resolver.resolve(&schema, &FlatValues::new());
    let second = resolver.resolve(&schema, &FlatValues::new());
    assert!(Rc::ptr_eq(&first, &second), "unchanged root was rebuilt");
    assert_eq!(*first, *snapshot);

    // One control per top-level field.
    let controls = flatten_config(&schema);
    assert_eq!(controls.len(), schema.len());
});

fn has_dotted_key(schema: &DialConfig) -> bool {
    schema.fields().any(|(key, node)| {
        key.contains('.')
            || matches!(node, ConfigNode::Group(group) if has_dotted_key(group))
    })
}
