#![forbid(unsafe_code)]

//! Rehydration of flat path values into schema-shaped snapshots.
//!
//! # Design
//!
//! [`resolve`] walks a [`DialConfig`] and a [`ValueSource`] together. Every
//! leaf becomes the value written at its path, or the leaf's schema default
//! when nothing was written. Groups become nested [`ResolvedGroup`]s.
//!
//! [`Resolver`] adds a memo table keyed by group path prefix. After building
//! a group it compares the result against the previous group at the same
//! prefix with [`shallow_equal`]; when equal, the previous `Rc` is returned
//! instead. Because children are resolved first, an unchanged subtree keeps
//! its `Rc` all the way up, and an unchanged snapshot keeps its root `Rc`.
//!
//! # Invariants
//!
//! 1. Resolving the same values against the same schema twice through one
//!    `Resolver` yields the same root `Rc`.
//! 2. A write below prefix `p` only replaces the `Rc`s of `p` and its
//!    ancestors; sibling groups keep their identity.
//! 3. Written values always win over schema defaults, including for monitor
//!    leaves.
//! 4. Values written at paths the schema does not name never appear in a
//!    snapshot.

use std::rc::Rc;

use ahash::AHashMap;

use crate::compare::shallow_equal;
use crate::path;
use crate::schema::{ConfigNode, DialConfig};
use crate::value::{DialValue, FlatValues};

/// Anything that can answer "what was written at this path".
pub trait ValueSource {
    fn value_at(&self, path: &str) -> Option<&DialValue>;
}

impl ValueSource for FlatValues {
    fn value_at(&self, path: &str) -> Option<&DialValue> {
        self.get(path)
    }
}

impl<S: ValueSource + ?Sized> ValueSource for &S {
    fn value_at(&self, path: &str) -> Option<&DialValue> {
        (**self).value_at(path)
    }
}

/// A resolved field: a leaf value or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(DialValue),
    Group(Rc<ResolvedGroup>),
}

impl Resolved {
    #[must_use]
    pub fn as_value(&self) -> Option<&DialValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Rc<ResolvedGroup>> {
        match self {
            Self::Group(g) => Some(g),
            Self::Value(_) => None,
        }
    }
}

/// Schema-shaped snapshot of effective values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedGroup {
    fields: Vec<(String, Resolved)>,
}

impl ResolvedGroup {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Resolved> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
        self.fields.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Nested group at `key`.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&Rc<ResolvedGroup>> {
        self.get(key).and_then(Resolved::as_group)
    }

    /// Leaf value at a dot path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&DialValue> {
        let mut segments = path.split(path::SEPARATOR).peekable();
        let mut group = self;
        while let Some(segment) = segments.next() {
            let field = group.get(segment)?;
            if segments.peek().is_none() {
                return field.as_value();
            }
            group = field.as_group()?;
        }
        None
    }

    #[must_use]
    pub fn number(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(DialValue::as_f64)
    }

    #[must_use]
    pub fn boolean(&self, path: &str) -> Option<bool> {
        self.lookup(path).and_then(DialValue::as_bool)
    }

    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(DialValue::as_str)
    }
}

/// Resolve without memoization. Every call allocates a fresh tree.
#[must_use]
pub fn resolve(schema: &DialConfig, values: &impl ValueSource) -> Rc<ResolvedGroup> {
    Rc::new(build_group(schema, values, "", &mut |_, child| Rc::new(child)))
}

/// Memoizing resolver. Keep one per panel consumer.
#[derive(Debug, Default)]
pub struct Resolver {
    root: Option<Rc<ResolvedGroup>>,
    memo: AHashMap<String, Rc<ResolvedGroup>>,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `schema` against `values`, reusing every group `Rc` whose
    /// contents did not change since the previous call.
    pub fn resolve(&mut self, schema: &DialConfig, values: &impl ValueSource) -> Rc<ResolvedGroup> {
        let memo = &mut self.memo;
        let next = build_group(schema, values, "", &mut |prefix, child| {
            let prev = memo.get(prefix).cloned();
            intern(prev, child, |fresh| {
                memo.insert(prefix.to_owned(), fresh);
            })
        });
        let prev = self.root.clone();
        intern(prev, next, |fresh| self.root = Some(fresh))
    }

    /// Drop every memoized group.
    pub fn clear(&mut self) {
        self.root = None;
        self.memo.clear();
    }

    /// Number of memoized group prefixes, root included.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len() + usize::from(self.root.is_some())
    }
}

/// Reuse `prev` when `next` is shallow-equal to it, otherwise hand the new
/// `Rc` to `store` and return it.
fn intern(
    prev: Option<Rc<ResolvedGroup>>,
    next: ResolvedGroup,
    store: impl FnOnce(Rc<ResolvedGroup>),
) -> Rc<ResolvedGroup> {
    if let Some(prev) = prev
        && shallow_equal(&prev, &next)
    {
        return prev;
    }
    let fresh = Rc::new(next);
    store(Rc::clone(&fresh));
    fresh
}

/// Build one group level. `finish_child` turns a finished child group into
/// the `Rc` stored in its parent.
fn build_group<S, F>(
    schema: &DialConfig,
    values: &S,
    prefix: &str,
    finish_child: &mut F,
) -> ResolvedGroup
where
    S: ValueSource + ?Sized,
    F: FnMut(&str, ResolvedGroup) -> Rc<ResolvedGroup>,
{
    let mut fields = Vec::with_capacity(schema.len());
    for (key, node) in schema.fields() {
        let path = path::join(prefix, key);
        let resolved = match node {
            ConfigNode::Group(child) => {
                let group = build_group(child, values, &path, finish_child);
                Resolved::Group(finish_child(&path, group))
            }
            leaf => match values.value_at(&path) {
                Some(written) => Resolved::Value(written.clone()),
                None => match leaf.default_value() {
                    Some(default) => Resolved::Value(default),
                    None => continue,
                },
            },
        };
        fields.push((key.to_owned(), resolved));
    }
    ResolvedGroup { fields }
}
