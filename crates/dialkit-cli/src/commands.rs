use std::cell::RefCell;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Args;
use dialkit_core::{ConfigMeta, ControlKind, DialConfig, DialValue};
use dialkit_runtime::{BatchScope, DialPanel, DialStore, StoreConfig};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// JSON schema file.
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ControlsArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Emit JSON instead of an indented listing.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Override a leaf before resolving. Values parse as JSON, falling back
    /// to a plain string.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub sets: Vec<String>,

    /// Store configuration (TOML, or JSON when the extension is `.json`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Panel name used to mint the panel id.
    #[arg(long, default_value = "Panel")]
    pub name: String,

    /// Single-line JSON output.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TriggerArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Dot path of the action leaf.
    #[arg(long, value_name = "PATH")]
    pub action: String,

    #[arg(long, default_value = "Panel")]
    pub name: String,
}

pub fn load_schema(path: &Path) -> Result<DialConfig> {
    if !path.exists() {
        return Err(CliError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    DialConfig::from_json_str(&text).map_err(|source| CliError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    let Some(path) = path else {
        return Ok(StoreConfig::default());
    };
    if !path.exists() {
        return Err(CliError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => StoreConfig::from_json_file(path)?,
        _ => StoreConfig::from_toml_file(path)?,
    };
    Ok(config.validated()?)
}

/// Split `PATH=VALUE`. The value is read as JSON when it parses as a leaf
/// value, otherwise kept as the literal string.
pub fn parse_assignment(raw: &str) -> Result<(String, DialValue)> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::invalid(format!("expected PATH=VALUE, got {raw:?}")))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(CliError::invalid(format!("empty path in {raw:?}")));
    }
    let value = serde_json::from_str::<Value>(value)
        .ok()
        .and_then(|json| DialValue::from_json(&json))
        .unwrap_or_else(|| DialValue::Text(value.to_owned()));
    Ok((path.to_owned(), value))
}

pub fn run_paths(args: &SchemaArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    for path in schema.leaf_paths() {
        writeln!(out, "{path}")?;
    }
    Ok(())
}

pub fn run_controls(args: &ControlsArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.schema.schema)?;
    let controls = dialkit_core::flatten_config(&schema);
    if args.json {
        let value = Value::Array(controls.iter().map(control_json).collect());
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        let mut listing = String::new();
        for control in &controls {
            describe_control(control, 0, &mut listing);
        }
        out.write_all(listing.as_bytes())?;
    }
    Ok(())
}

pub fn run_resolve(args: &ResolveArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.schema.schema)?;
    let config = load_config(args.config.as_deref())?;
    let assignments = args
        .sets
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;

    let store = DialStore::with_config(config);
    let panel = DialPanel::mount(&store, args.name.as_str(), schema);
    debug!(panel = %panel.id(), overrides = assignments.len(), "resolving");
    {
        let _batch = BatchScope::new();
        for (path, value) in assignments {
            panel.set_params(&path, value)?;
        }
    }

    let snapshot = panel.params();
    let text = if args.compact {
        serde_json::to_string(&*snapshot)?
    } else {
        serde_json::to_string_pretty(&*snapshot)?
    };
    writeln!(out, "{text}")?;
    Ok(())
}

pub fn run_trigger(args: &TriggerArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.schema.schema)?;
    let store = DialStore::new();
    let panel = DialPanel::mount(&store, args.name.as_str(), schema);

    let fired = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&fired);
    let _sub = panel.on_action(move |action| sink.borrow_mut().push(action.to_owned()));
    panel.trigger(&args.action)?;

    for action in fired.borrow().iter() {
        writeln!(out, "fired {action} on {}", panel.id())?;
    }
    Ok(())
}

fn describe_control(control: &ConfigMeta, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}{}  {} ({})", control.path, control.label, control.kind.name());
    match &control.kind {
        ControlKind::Slider { min, max, step } => {
            let _ = write!(out, " {min}..{max} step {step}");
        }
        ControlKind::Select { options } => {
            let values: Vec<&str> = options.iter().map(|o| o.value()).collect();
            let _ = write!(out, " [{}]", values.join(", "));
        }
        ControlKind::TextInput {
            placeholder: Some(placeholder),
        } => {
            let _ = write!(out, " placeholder {placeholder:?}");
        }
        _ => {}
    }
    if let Some(default) = &control.default {
        let _ = write!(out, " = {default}");
    }
    out.push('\n');
    for child in control.children() {
        describe_control(child, depth + 1, out);
    }
}

fn control_json(control: &ConfigMeta) -> Value {
    let mut map = Map::new();
    map.insert("path".into(), Value::from(control.path.as_str()));
    map.insert("label".into(), Value::from(control.label.as_str()));
    map.insert("kind".into(), Value::from(control.kind.name()));
    match &control.kind {
        ControlKind::Slider { min, max, step } => {
            map.insert("min".into(), json!(min));
            map.insert("max".into(), json!(max));
            map.insert("step".into(), json!(step));
        }
        ControlKind::Select { options } => {
            let options = options
                .iter()
                .map(|o| json!({ "value": o.value(), "label": o.label() }))
                .collect();
            map.insert("options".into(), Value::Array(options));
        }
        ControlKind::TextInput {
            placeholder: Some(placeholder),
        } => {
            map.insert("placeholder".into(), Value::from(placeholder.as_str()));
        }
        ControlKind::Folder { children } => {
            map.insert(
                "children".into(),
                Value::Array(children.iter().map(control_json).collect()),
            );
        }
        _ => {}
    }
    if let Some(default) = &control.default {
        map.insert("default".into(), default.to_json());
    }
    Value::Object(map)
}
