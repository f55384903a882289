#![forbid(unsafe_code)]

//! JSON ingestion and serialization.
//!
//! Schemas written as plain JSON objects are classified by shape, the same
//! way the schema builder's variants are chosen:
//!
//! | JSON shape                                   | Node            |
//! |----------------------------------------------|-----------------|
//! | `[n, min, max]` (first element a number)     | `Range`         |
//! | number / boolean / string                    | primitive       |
//! | object with `"type"` in the six leaf tags    | typed leaf      |
//! | any other object                             | `Group`         |
//!
//! `"type": "select"` only counts when `options` is an array; otherwise the
//! object is a group. Shapes that fit nowhere (null, other arrays) are
//! dropped with a warning.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, SchemaError};
use crate::path;
use crate::resolve::{Resolved, ResolvedGroup};
use crate::schema::{
    ColorConfig, ConfigNode, DialConfig, MonitorConfig, RangeTuple, SelectConfig, SelectOption,
    TextConfig,
};
use crate::value::{ActionConfig, DialValue, FlatValues, SpringConfig};

impl DialConfig {
    /// Parse a schema from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(&value)
    }

    /// Build a schema from an already parsed JSON value. The root must be
    /// an object.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(parse_group(map, "")),
            other => Err(SchemaError::NotAnObject {
                found: json_kind(other),
            }),
        }
    }
}

impl DialValue {
    /// Interpret a JSON value as a leaf value. Objects are accepted only
    /// when tagged `spring` or `action`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Object(map) => match map.get("type").and_then(Value::as_str) {
                Some("spring") => Some(Self::Spring(parse_spring(map))),
                Some("action") => Some(Self::Action(parse_action(map))),
                _ => None,
            },
            Value::Null | Value::Array(_) => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(*b),
            Self::Text(s) => Value::String(s.clone()),
            Self::Spring(spring) => {
                let mut map = Map::new();
                map.insert("type".into(), Value::from("spring"));
                let fields = [
                    ("visualDuration", spring.visual_duration),
                    ("bounce", spring.bounce),
                    ("stiffness", spring.stiffness),
                    ("damping", spring.damping),
                    ("mass", spring.mass),
                ];
                for (key, field) in fields {
                    if let Some(v) = field.and_then(serde_json::Number::from_f64) {
                        map.insert(key.into(), Value::Number(v));
                    }
                }
                Value::Object(map)
            }
            Self::Action(action) => {
                let mut map = Map::new();
                map.insert("type".into(), Value::from("action"));
                if let Some(label) = &action.label {
                    map.insert("label".into(), Value::from(label.as_str()));
                }
                Value::Object(map)
            }
        }
    }
}

fn parse_group(map: &Map<String, Value>, prefix: &str) -> DialConfig {
    let mut config = DialConfig::new();
    for (key, value) in map {
        let field_path = path::join(prefix, key);
        if key.contains(path::SEPARATOR) {
            warn!(
                path = %field_path,
                "schema key contains the path separator; its path may alias a nested field"
            );
        }
        match parse_node(value, &field_path) {
            Some(node) => config.insert(key.clone(), node),
            None => warn!(
                path = %field_path,
                kind = json_kind(value),
                "dropping unrecognized schema field"
            ),
        }
    }
    config
}

fn parse_node(value: &Value, field_path: &str) -> Option<ConfigNode> {
    match value {
        Value::Number(n) => n.as_f64().map(ConfigNode::Number),
        Value::Bool(b) => Some(ConfigNode::Bool(*b)),
        Value::String(s) => Some(ConfigNode::Text(s.clone())),
        Value::Array(items) => parse_range(items, field_path).map(ConfigNode::Range),
        Value::Object(map) => Some(parse_object(map, field_path)),
        Value::Null => None,
    }
}

/// Only the first element must be a number; a non-numeric bound collapses
/// to the default.
fn parse_range(items: &[Value], field_path: &str) -> Option<RangeTuple> {
    let [default, min, max] = items else {
        return None;
    };
    let default = default.as_f64()?;
    let (min, max) = match (min.as_f64(), max.as_f64()) {
        (Some(min), Some(max)) => (min, max),
        (min, max) => {
            warn!(path = %field_path, "range bound is not a number, using the default");
            (min.unwrap_or(default), max.unwrap_or(default))
        }
    };
    Some(RangeTuple::new(default, min, max))
}

fn parse_object(map: &Map<String, Value>, field_path: &str) -> ConfigNode {
    let options = map.get("options").and_then(Value::as_array);
    match (map.get("type").and_then(Value::as_str), options) {
        (Some("spring"), _) => ConfigNode::Spring(parse_spring(map)),
        (Some("action"), _) => ConfigNode::Action(parse_action(map)),
        (Some("select"), Some(options)) => {
            let select = SelectConfig {
                options: options
                    .iter()
                    .filter_map(|option| parse_option(option, field_path))
                    .collect(),
                default: string_field(map, "default"),
            };
            select.warn_if_empty(field_path);
            ConfigNode::Select(select)
        }
        (Some("color"), _) => ConfigNode::Color(ColorConfig {
            default: string_field(map, "default"),
        }),
        (Some("text"), _) => ConfigNode::TextInput(TextConfig {
            default: string_field(map, "default"),
            placeholder: string_field(map, "placeholder"),
        }),
        (Some("monitor"), _) => {
            let default_value = map
                .get("defaultValue")
                .and_then(DialValue::from_json)
                .unwrap_or_else(|| {
                    warn!(path = %field_path, "monitor leaf without usable defaultValue");
                    DialValue::Text(String::new())
                });
            ConfigNode::Monitor(MonitorConfig { default_value })
        }
        _ => ConfigNode::Group(parse_group(map, field_path)),
    }
}

fn parse_option(option: &Value, field_path: &str) -> Option<SelectOption> {
    match option {
        Value::String(s) => Some(SelectOption::Plain(s.clone())),
        Value::Object(map) => {
            let value = match map.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    warn!(path = %field_path, "select option without a value");
                    return None;
                }
            };
            let label = string_field(map, "label").unwrap_or_else(|| value.clone());
            Some(SelectOption::Labeled { value, label })
        }
        other => {
            warn!(path = %field_path, kind = json_kind(other), "skipping select option");
            None
        }
    }
}

fn parse_spring(map: &Map<String, Value>) -> SpringConfig {
    let number = |key: &str| map.get(key).and_then(Value::as_f64);
    SpringConfig {
        visual_duration: number("visualDuration"),
        bounce: number("bounce"),
        stiffness: number("stiffness"),
        damping: number("damping"),
        mass: number("mass"),
    }
}

fn parse_action(map: &Map<String, Value>) -> ActionConfig {
    ActionConfig {
        label: string_field(map, "label"),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for DialValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Spring(_) | Self::Action(_) => self.to_json().serialize(serializer),
        }
    }
}

impl Serialize for Resolved {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Group(group) => group.serialize(serializer),
        }
    }
}

impl Serialize for ResolvedGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, field) in self.iter() {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}

impl Serialize for FlatValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for path in self.sorted_paths() {
            if let Some(value) = self.get(path) {
                map.serialize_entry(path, value)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use serde_json::json;

    #[test]
    fn shapes_classify_into_nodes() {
        let schema = DialConfig::from_json_value(&json!({
            "speed": [1, 0, 10],
            "size": 4,
            "visible": true,
            "title": "hello",
            "mode": { "type": "select", "options": ["x", { "value": "y", "label": "Why" }] },
            "fill": { "type": "color" },
            "note": { "type": "text", "placeholder": "..." },
            "fps": { "type": "monitor", "defaultValue": 0 },
            "spring": { "type": "spring", "visualDuration": 0.3, "bounce": 0.2 },
            "reset": { "type": "action" },
        }))
        .expect("object root");

        let tags: Vec<&str> = schema.fields().map(|(_, n)| n.tag()).collect();
        assert_eq!(
            tags,
            vec![
                "range", "number", "boolean", "string", "select", "color", "text", "monitor",
                "spring", "action"
            ]
        );
    }

    #[test]
    fn typed_leaf_fields_are_not_paths() {
        let schema = DialConfig::from_json_value(&json!({
            "a": { "b": 5, "c": { "type": "color", "default": "#fff" } }
        }))
        .expect("object root");
        assert_eq!(schema.leaf_paths(), vec!["a.b", "a.c"]);
    }

    #[test]
    fn select_without_options_is_a_group() {
        let schema = DialConfig::from_json_value(&json!({
            "odd": { "type": "select", "default": "x" }
        }))
        .expect("object root");
        assert_eq!(schema.leaf_paths(), vec!["odd.type", "odd.default"]);
    }

    #[test]
    fn unknown_type_tag_is_a_group() {
        let schema = DialConfig::from_json_value(&json!({
            "g": { "type": "gizmo", "size": 2 }
        }))
        .expect("object root");
        assert!(matches!(schema.get("g"), Some(ConfigNode::Group(_))));
    }

    #[test]
    #[tracing_test::traced_test]
    fn unrecognized_shapes_are_dropped_with_warning() {
        let schema = DialConfig::from_json_value(&json!({
            "keep": 1,
            "nothing": null,
            "pair": [1, 2],
            "words": ["a", "b", "c"],
        }))
        .expect("object root");
        assert_eq!(schema.leaf_paths(), vec!["keep"]);
        assert!(logs_contain("dropping unrecognized schema field"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn dotted_keys_are_flagged() {
        let schema = DialConfig::from_json_value(&json!({
            "a.b": 1,
            "a": { "b": 2 }
        }))
        .expect("object root");
        assert!(logs_contain("schema key contains the path separator"));
        assert_eq!(schema.leaf_paths(), vec!["a.b", "a.b"]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn plain_keys_are_not_flagged() {
        let _ = DialConfig::from_json_value(&json!({ "a": { "b": 2 } })).expect("object root");
        assert!(!logs_contain("path separator"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn range_needs_only_a_numeric_default() {
        let schema = DialConfig::from_json_value(&json!({
            "speed": [3, "low", 10]
        }))
        .expect("object root");
        match schema.get("speed") {
            Some(ConfigNode::Range(range)) => {
                assert_eq!((range.default, range.min, range.max), (3.0, 3.0, 10.0));
            }
            other => panic!("expected range, got {other:?}"),
        }
        assert!(logs_contain("range bound is not a number"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn empty_options_resolve_to_empty_string() {
        let schema = DialConfig::from_json_value(&json!({
            "mode": { "type": "select", "options": [] }
        }))
        .expect("object root");
        assert!(logs_contain("select leaf has no options"));
        let snap = resolve(&schema, &FlatValues::new());
        assert_eq!(snap.text("mode"), Some(""));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let err = DialConfig::from_json_str("[1, 0, 10]").expect_err("array root");
        assert!(matches!(err, SchemaError::NotAnObject { found: "array" }));
        assert!(matches!(
            DialConfig::from_json_str("{"),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn resolved_snapshot_serializes_in_schema_order() {
        let schema = DialConfig::from_json_value(&json!({
            "speed": [1, 0, 10],
            "look": { "fill": { "type": "color" }, "on": false },
            "go": { "type": "action", "label": "Go" },
        }))
        .expect("object root");
        let values: FlatValues = [("look.on", true)].into_iter().collect();
        let text = serde_json::to_string(&*resolve(&schema, &values)).expect("serialize");
        assert_eq!(
            text,
            r##"{"speed":1.0,"look":{"fill":"#000000","on":true},"go":{"type":"action","label":"Go"}}"##
        );
    }

    #[test]
    fn leaf_values_from_json() {
        assert_eq!(DialValue::from_json(&json!(2)), Some(DialValue::Number(2.0)));
        assert_eq!(DialValue::from_json(&json!("x")), Some(DialValue::from("x")));
        assert_eq!(DialValue::from_json(&json!(null)), None);
        assert_eq!(DialValue::from_json(&json!({"k": 1})), None);
        let spring = DialValue::from_json(&json!({"type": "spring", "stiffness": 300}))
            .expect("spring");
        assert_eq!(spring.as_spring().and_then(|s| s.stiffness), Some(300.0));
        assert_eq!(DialValue::from_json(&spring.to_json()), Some(spring));
    }
}
