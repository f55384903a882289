#![forbid(unsafe_code)]

//! Control metadata for the rendering layer.
//!
//! [`flatten_config`] turns a schema into a tree of [`ConfigMeta`] entries,
//! one per field, that a panel renderer walks to lay out controls. Each entry
//! names the store path the control reads and writes, a display label, and
//! the control kind with whatever the control needs to draw itself.
//!
//! Bare numbers get an inferred slider range so that every number is
//! adjustable without the caller spelling out a range tuple.

use crate::path;
use crate::schema::{ConfigNode, DialConfig, RangeTuple, SelectOption};
use crate::value::DialValue;

/// What kind of control renders a field.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Slider { min: f64, max: f64, step: f64 },
    Toggle,
    /// Primitive string field, edited as free text.
    Text,
    Spring,
    Action,
    Select { options: Vec<SelectOption> },
    Color,
    TextInput { placeholder: Option<String> },
    Monitor,
    Folder { children: Vec<ConfigMeta> },
}

impl ControlKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slider { .. } => "slider",
            Self::Toggle => "toggle",
            Self::Text => "text",
            Self::Spring => "spring",
            Self::Action => "action",
            Self::Select { .. } => "select",
            Self::Color => "color",
            Self::TextInput { .. } => "text-input",
            Self::Monitor => "monitor",
            Self::Folder { .. } => "folder",
        }
    }
}

/// Description of one control.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigMeta {
    /// Store path. For folders this is the group prefix.
    pub path: String,
    pub label: String,
    pub kind: ControlKind,
    /// Schema default. `None` for folders.
    pub default: Option<DialValue>,
}

impl ConfigMeta {
    #[must_use]
    pub fn children(&self) -> &[ConfigMeta] {
        match &self.kind {
            ControlKind::Folder { children } => children,
            _ => &[],
        }
    }

    /// Depth-first iteration over this entry and every descendant.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &ConfigMeta> + '_> {
        Box::new(std::iter::once(self).chain(self.children().iter().flat_map(ConfigMeta::walk)))
    }
}

/// Build control metadata for every field of `schema`.
#[must_use]
pub fn flatten_config(schema: &DialConfig) -> Vec<ConfigMeta> {
    flatten_group(schema, "")
}

fn flatten_group(schema: &DialConfig, prefix: &str) -> Vec<ConfigMeta> {
    schema
        .fields()
        .map(|(key, node)| {
            let path = path::join(prefix, key);
            let kind = match node {
                ConfigNode::Group(group) => ControlKind::Folder {
                    children: flatten_group(group, &path),
                },
                ConfigNode::Number(n) => infer_slider(*n),
                ConfigNode::Range(range) => slider_for_range(range),
                ConfigNode::Bool(_) => ControlKind::Toggle,
                ConfigNode::Text(_) => ControlKind::Text,
                ConfigNode::Spring(_) => ControlKind::Spring,
                ConfigNode::Action(_) => ControlKind::Action,
                ConfigNode::Select(select) => ControlKind::Select {
                    options: select.options.clone(),
                },
                ConfigNode::Color(_) => ControlKind::Color,
                ConfigNode::TextInput(text) => ControlKind::TextInput {
                    placeholder: text.placeholder.clone(),
                },
                ConfigNode::Monitor(_) => ControlKind::Monitor,
            };
            let label = match node {
                ConfigNode::Action(action) => action
                    .label
                    .clone()
                    .unwrap_or_else(|| format_label(key)),
                _ => format_label(key),
            };
            ConfigMeta {
                path,
                label,
                kind,
                default: node.default_value(),
            }
        })
        .collect()
}

fn slider_for_range(range: &RangeTuple) -> ControlKind {
    ControlKind::Slider {
        min: range.min,
        max: range.max,
        step: infer_step(range.max - range.min),
    }
}

/// Slider bounds for a bare number: `0..=2|v|`, mirrored below zero for
/// negative values, `0..=1` for zero.
fn infer_slider(value: f64) -> ControlKind {
    let (min, max) = if value == 0.0 || !value.is_finite() {
        (0.0, 1.0)
    } else if value > 0.0 {
        (0.0, value * 2.0)
    } else {
        (value * 2.0, -value * 2.0)
    };
    ControlKind::Slider {
        min,
        max,
        step: infer_step(max - min),
    }
}

/// One hundredth of the span, rounded down to a power of ten, never below
/// `0.001`.
fn infer_step(span: f64) -> f64 {
    if !span.is_finite() || span <= 0.0 {
        return 0.01;
    }
    let exponent = (span / 100.0).log10().floor() as i32;
    10f64.powi(exponent).max(0.001)
}

/// Turn a field key into a display label.
///
/// `camelCase`, `snake_case` and `kebab-case` all become space separated
/// words with the first letter capitalized.
///
/// ```
/// use dialkit_core::meta::format_label;
///
/// assert_eq!(format_label("blurRadius"), "Blur Radius");
/// assert_eq!(format_label("line_height"), "Line Height");
/// ```
#[must_use]
pub fn format_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            prev = Some(' ');
            continue;
        }
        let boundary =
            ch.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
        if boundary {
            out.push(' ');
        }
        if out.is_empty() || out.ends_with(' ') {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out.trim_end().to_owned()
}
