#![forbid(unsafe_code)]

//! Shallow snapshot comparison.
//!
//! Two groups are shallow-equal when they hold the same key set and every
//! key maps to an identical entry: leaf values compare with
//! [`DialValue::same_value`], nested groups compare by `Rc` pointer only.
//! Nested groups are never walked, so a changed subtree is only noticed
//! when its `Rc` changed. The [`Resolver`](crate::resolve::Resolver)
//! guarantees that by interning unchanged groups.

use std::rc::Rc;

use crate::resolve::{Resolved, ResolvedGroup};

/// Per-key identity comparison of two resolved groups.
#[must_use]
pub fn shallow_equal(a: &ResolvedGroup, b: &ResolvedGroup) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(key, left)| match (left, b.get(key)) {
        (Resolved::Value(x), Some(Resolved::Value(y))) => x.same_value(y),
        (Resolved::Group(x), Some(Resolved::Group(y))) => Rc::ptr_eq(x, y),
        _ => false,
    })
}

/// [`shallow_equal`] on shared snapshots, short-circuiting on pointer
/// equality.
#[must_use]
pub fn same_snapshot(a: &Rc<ResolvedGroup>, b: &Rc<ResolvedGroup>) -> bool {
    Rc::ptr_eq(a, b) || shallow_equal(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::schema::DialConfig;
    use crate::value::{DialValue, FlatValues};

    fn schema() -> DialConfig {
        DialConfig::new()
            .number("x", 1.0)
            .group("inner", DialConfig::new().number("y", 2.0))
    }

    #[test]
    fn equal_leaves_but_distinct_groups_are_not_shallow_equal() {
        let values = FlatValues::new();
        let a = resolve(&schema(), &values);
        let b = resolve(&schema(), &values);
        // Deep-equal, yet the nested groups are separate allocations.
        assert_eq!(a, b);
        assert!(!shallow_equal(&a, &b));
    }

    #[test]
    fn leaf_only_groups_compare_by_value() {
        let leaves = DialConfig::new().number("x", 1.0).string("s", "a");
        let values = FlatValues::new();
        let a = resolve(&leaves, &values);
        let b = resolve(&leaves, &values);
        assert!(shallow_equal(&a, &b));

        let changed: FlatValues = [("x", DialValue::from(3))].into_iter().collect();
        let c = resolve(&leaves, &changed);
        assert!(!shallow_equal(&a, &c));
    }

    #[test]
    fn key_sets_must_match() {
        let values = FlatValues::new();
        let a = resolve(&DialConfig::new().number("x", 1.0), &values);
        let b = resolve(&DialConfig::new().number("y", 1.0), &values);
        let c = resolve(
            &DialConfig::new().number("x", 1.0).number("y", 1.0),
            &values,
        );
        assert!(!shallow_equal(&a, &b));
        assert!(!shallow_equal(&a, &c));
        assert!(!shallow_equal(&c, &a));
    }

    #[test]
    fn same_snapshot_accepts_identical_rc() {
        let snap = resolve(&schema(), &FlatValues::new());
        assert!(same_snapshot(&snap, &Rc::clone(&snap)));
    }
}
