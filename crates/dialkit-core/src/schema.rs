#![forbid(unsafe_code)]

//! The configuration schema tree.
//!
//! A [`DialConfig`] maps field names to [`ConfigNode`]s. A node is either a
//! leaf (primitive, range tuple or typed descriptor) or a nested
//! [`DialConfig`]. The variant decides where path flattening stops: typed
//! descriptors are always leaves, so their internal fields (such as select
//! `options`) never become path segments.
//!
//! # Example
//!
//! ```
//! use dialkit_core::schema::{ColorConfig, DialConfig, SelectConfig};
//!
//! let schema = DialConfig::new()
//!     .range("speed", 1.0, 0.0, 10.0)
//!     .select("mode", SelectConfig::new(["fast", "slow"]))
//!     .group(
//!         "style",
//!         DialConfig::new().color("fill", ColorConfig::with_default("#fff")),
//!     );
//!
//! assert_eq!(schema.leaf_paths(), vec!["speed", "mode", "style.fill"]);
//! ```

use tracing::warn;

use crate::path;
use crate::value::{ActionConfig, DialValue, SpringConfig};

/// Fallback for a color leaf without a default.
pub const DEFAULT_COLOR: &str = "#000000";

/// `(default, min, max)` numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeTuple {
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeTuple {
    #[must_use]
    pub fn new(default: f64, min: f64, max: f64) -> Self {
        Self { default, min, max }
    }
}

/// One entry of a select leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOption {
    /// The string is both value and label.
    Plain(String),
    Labeled { value: String, label: String },
}

impl SelectOption {
    #[must_use]
    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Labeled {
            value: value.into(),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) | Self::Labeled { value: v, .. } => v,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Plain(v) | Self::Labeled { label: v, .. } => v,
        }
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_owned())
    }
}

impl From<String> for SelectOption {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

/// Select leaf: one value out of a fixed option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectConfig {
    pub options: Vec<SelectOption>,
    pub default: Option<String>,
}

impl SelectConfig {
    pub fn new<I, O>(options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SelectOption>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// `default`, else the first option's value, else the empty string.
    #[must_use]
    pub fn default_value(&self) -> String {
        if let Some(default) = &self.default {
            return default.clone();
        }
        self.options
            .first()
            .map(|first| first.value().to_owned())
            .unwrap_or_default()
    }

    /// Log once, at schema construction, when the leaf can only resolve to
    /// the empty string.
    pub(crate) fn warn_if_empty(&self, path: &str) {
        if self.default.is_none() && self.options.is_empty() {
            warn!(path, "select leaf has no options and no default; using empty string");
        }
    }
}

/// Color leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorConfig {
    pub default: Option<String>,
}

impl ColorConfig {
    #[must_use]
    pub fn with_default(default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
        }
    }

    #[must_use]
    pub fn default_value(&self) -> String {
        self.default
            .clone()
            .unwrap_or_else(|| DEFAULT_COLOR.to_owned())
    }
}

/// Free-text input leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextConfig {
    pub default: Option<String>,
    pub placeholder: Option<String>,
}

impl TextConfig {
    #[must_use]
    pub fn with_default(default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            placeholder: None,
        }
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn default_value(&self) -> String {
        self.default.clone().unwrap_or_default()
    }
}

/// Read-only monitor leaf. The host pushes values through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub default_value: DialValue,
}

impl MonitorConfig {
    #[must_use]
    pub fn new(default_value: impl Into<DialValue>) -> Self {
        Self {
            default_value: default_value.into(),
        }
    }
}

/// A schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Number(f64),
    Bool(bool),
    Text(String),
    Range(RangeTuple),
    Spring(SpringConfig),
    Action(ActionConfig),
    Select(SelectConfig),
    Color(ColorConfig),
    TextInput(TextConfig),
    Monitor(MonitorConfig),
    Group(DialConfig),
}

impl ConfigNode {
    /// True for everything except [`ConfigNode::Group`].
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Group(_))
    }

    /// The value a leaf resolves to when nothing was written at its path.
    /// `None` for groups.
    #[must_use]
    pub fn default_value(&self) -> Option<DialValue> {
        let value = match self {
            Self::Number(n) => DialValue::Number(*n),
            Self::Bool(b) => DialValue::Bool(*b),
            Self::Text(s) => DialValue::Text(s.clone()),
            Self::Range(range) => DialValue::Number(range.default),
            Self::Spring(spring) => DialValue::Spring(spring.clone()),
            Self::Action(action) => DialValue::Action(action.clone()),
            Self::Select(select) => DialValue::Text(select.default_value()),
            Self::Color(color) => DialValue::Text(color.default_value()),
            Self::TextInput(text) => DialValue::Text(text.default_value()),
            Self::Monitor(monitor) => monitor.default_value.clone(),
            Self::Group(_) => return None,
        };
        Some(value)
    }

    /// Descriptor tag, matching the `type` field of the JSON form.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "string",
            Self::Range(_) => "range",
            Self::Spring(_) => "spring",
            Self::Action(_) => "action",
            Self::Select(_) => "select",
            Self::Color(_) => "color",
            Self::TextInput(_) => "text",
            Self::Monitor(_) => "monitor",
            Self::Group(_) => "group",
        }
    }
}

/// A schema tree node: ordered field name to [`ConfigNode`] mapping.
///
/// Field order carries no meaning for resolution but is kept so controls
/// render in declaration order. Keys are unique; inserting an existing key
/// replaces its node in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialConfig {
    fields: Vec<(String, ConfigNode)>,
}

impl DialConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, node: ConfigNode) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = node,
            None => self.fields.push((key, node)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: ConfigNode) -> Self {
        self.insert(key, node);
        self
    }

    #[must_use]
    pub fn number(self, key: impl Into<String>, value: f64) -> Self {
        self.with(key, ConfigNode::Number(value))
    }

    #[must_use]
    pub fn toggle(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, ConfigNode::Bool(value))
    }

    #[must_use]
    pub fn string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(key, ConfigNode::Text(value.into()))
    }

    #[must_use]
    pub fn range(self, key: impl Into<String>, default: f64, min: f64, max: f64) -> Self {
        self.with(key, ConfigNode::Range(RangeTuple::new(default, min, max)))
    }

    #[must_use]
    pub fn spring(self, key: impl Into<String>, spring: SpringConfig) -> Self {
        self.with(key, ConfigNode::Spring(spring))
    }

    #[must_use]
    pub fn action(self, key: impl Into<String>, action: ActionConfig) -> Self {
        self.with(key, ConfigNode::Action(action))
    }

    #[must_use]
    pub fn select(self, key: impl Into<String>, select: SelectConfig) -> Self {
        let key = key.into();
        select.warn_if_empty(&key);
        self.with(key, ConfigNode::Select(select))
    }

    #[must_use]
    pub fn color(self, key: impl Into<String>, color: ColorConfig) -> Self {
        self.with(key, ConfigNode::Color(color))
    }

    #[must_use]
    pub fn text(self, key: impl Into<String>, text: TextConfig) -> Self {
        self.with(key, ConfigNode::TextInput(text))
    }

    #[must_use]
    pub fn monitor(self, key: impl Into<String>, monitor: MonitorConfig) -> Self {
        self.with(key, ConfigNode::Monitor(monitor))
    }

    #[must_use]
    pub fn group(self, key: impl Into<String>, group: DialConfig) -> Self {
        self.with(key, ConfigNode::Group(group))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.fields.iter().map(|(k, n)| (k.as_str(), n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The node at a dot path, group or leaf.
    #[must_use]
    pub fn node(&self, path: &str) -> Option<&ConfigNode> {
        let mut segments = path.split(path::SEPARATOR);
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            match node {
                ConfigNode::Group(group) => node = group.get(segment)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// The leaf at a dot path. Groups and paths that continue past a leaf
    /// yield `None`.
    #[must_use]
    pub fn leaf(&self, path: &str) -> Option<&ConfigNode> {
        self.node(path).filter(|node| node.is_leaf())
    }

    /// Every leaf path, depth-first in declaration order.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_paths("", &mut out);
        out
    }

    fn collect_leaf_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (key, node) in self.fields() {
            let path = path::join(prefix, key);
            match node {
                ConfigNode::Group(group) => group.collect_leaf_paths(&path, out),
                _ => out.push(path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> DialConfig {
        DialConfig::new().group(
            "a",
            DialConfig::new()
                .number("b", 5.0)
                .color("c", ColorConfig::with_default("#fff")),
        )
    }

    #[test]
    fn typed_leaves_stop_path_recursion() {
        assert_eq!(nested().leaf_paths(), vec!["a.b", "a.c"]);
        assert!(nested().leaf("a.c.default").is_none());
    }

    #[test]
    fn leaf_lookup_rejects_groups_and_unknown_keys() {
        let schema = nested();
        assert!(schema.leaf("a").is_none());
        assert!(schema.node("a").is_some());
        assert!(schema.leaf("a.b").is_some());
        assert!(schema.leaf("a.x").is_none());
        assert!(schema.leaf("").is_none());
        assert!(schema.leaf("a..b").is_none());
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let schema = DialConfig::new()
            .number("x", 1.0)
            .toggle("y", true)
            .number("x", 2.0);
        let keys: Vec<&str> = schema.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(schema.get("x"), Some(&ConfigNode::Number(2.0)));
    }

    #[test]
    fn defaults_follow_precedence_table() {
        let cases = [
            (ConfigNode::Range(RangeTuple::new(1.0, 0.0, 10.0)), DialValue::from(1.0)),
            (ConfigNode::Bool(true), DialValue::from(true)),
            (
                ConfigNode::Select(SelectConfig::new(["x", "y"])),
                DialValue::from("x"),
            ),
            (
                ConfigNode::Select(SelectConfig::new(["x", "y"]).with_default("y")),
                DialValue::from("y"),
            ),
            (
                ConfigNode::Select(SelectConfig::new([SelectOption::labeled("v1", "First")])),
                DialValue::from("v1"),
            ),
            (ConfigNode::Color(ColorConfig::default()), DialValue::from("#000000")),
            (ConfigNode::TextInput(TextConfig::default()), DialValue::from("")),
            (
                ConfigNode::Monitor(MonitorConfig::new(0.5)),
                DialValue::from(0.5),
            ),
            (
                ConfigNode::Action(ActionConfig::labeled("Reset")),
                DialValue::from(ActionConfig::labeled("Reset")),
            ),
        ];
        for (node, expected) in cases {
            assert_eq!(node.default_value(), Some(expected), "{}", node.tag());
        }
        assert_eq!(ConfigNode::Group(DialConfig::new()).default_value(), None);
    }

    #[test]
    #[tracing_test::traced_test]
    fn empty_select_falls_back_to_empty_string_quietly() {
        let select = SelectConfig::new(Vec::<String>::new());
        assert_eq!(select.default_value(), "");
        assert!(!logs_contain("select leaf has no options"));

        let schema = DialConfig::new().select("mode", select);
        assert!(logs_contain("select leaf has no options"));
        assert_eq!(
            schema.leaf("mode").and_then(ConfigNode::default_value),
            Some(DialValue::from(""))
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn select_with_default_needs_no_options() {
        let _ = DialConfig::new().select(
            "mode",
            SelectConfig::new(Vec::<String>::new()).with_default("x"),
        );
        assert!(!logs_contain("select leaf has no options"));
    }

    #[test]
    fn option_label_falls_back_to_value() {
        let plain = SelectOption::from("fast");
        assert_eq!(plain.label(), "fast");
        let labeled = SelectOption::labeled("f", "Fast");
        assert_eq!(labeled.value(), "f");
        assert_eq!(labeled.label(), "Fast");
    }
}
