#![forbid(unsafe_code)]

//! Leaf values and the flat path-addressed value map.
//!
//! A [`DialValue`] is what a control writes and what every resolved leaf
//! holds. Spring and action leaves are not scalars: their descriptor is the
//! value, because the control layer interprets it directly.
//!
//! [`FlatValues`] maps dot-joined paths (`"group.speed"`) to the last value
//! written for that leaf. A missing entry means "use the schema default".

use std::fmt;

use ahash::AHashMap;

/// Spring animation parameters.
///
/// Either time-based (`visual_duration` + `bounce`) or physics-based
/// (`stiffness` + `damping` + `mass`). Every field is optional; the
/// animation layer fills in its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpringConfig {
    pub visual_duration: Option<f64>,
    pub bounce: Option<f64>,
    pub stiffness: Option<f64>,
    pub damping: Option<f64>,
    pub mass: Option<f64>,
}

impl SpringConfig {
    /// Time-based spring.
    #[must_use]
    pub fn time(visual_duration: f64, bounce: f64) -> Self {
        Self {
            visual_duration: Some(visual_duration),
            bounce: Some(bounce),
            ..Self::default()
        }
    }

    /// Physics-based spring.
    #[must_use]
    pub fn physics(stiffness: f64, damping: f64, mass: f64) -> Self {
        Self {
            stiffness: Some(stiffness),
            damping: Some(damping),
            mass: Some(mass),
            ..Self::default()
        }
    }

    /// True when any physics parameter is set. Physics parameters win over
    /// time-based ones when both are present.
    #[must_use]
    pub fn is_physics(&self) -> bool {
        self.stiffness.is_some() || self.damping.is_some() || self.mass.is_some()
    }
}

/// Button-style trigger descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionConfig {
    /// Button caption. Controls fall back to the field label.
    pub label: Option<String>,
}

impl ActionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

/// The effective value of a single leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum DialValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Spring(SpringConfig),
    Action(ActionConfig),
}

impl DialValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_spring(&self) -> Option<&SpringConfig> {
        match self {
            Self::Spring(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs and CLI output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Spring(_) => "spring",
            Self::Action(_) => "action",
        }
    }

    /// Identity-style equality used by snapshot comparison.
    ///
    /// Same as `==` except that `NaN` equals `NaN`, so a leaf holding `NaN`
    /// does not look changed on every resolution.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl fmt::Display for DialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Spring(s) if s.is_physics() => write!(
                f,
                "spring(stiffness={:?}, damping={:?}, mass={:?})",
                s.stiffness, s.damping, s.mass
            ),
            Self::Spring(s) => write!(
                f,
                "spring(duration={:?}, bounce={:?})",
                s.visual_duration, s.bounce
            ),
            Self::Action(a) => match &a.label {
                Some(label) => write!(f, "action({label})"),
                None => f.write_str("action"),
            },
        }
    }
}

impl From<f64> for DialValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for DialValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for DialValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for DialValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for DialValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DialValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<SpringConfig> for DialValue {
    fn from(value: SpringConfig) -> Self {
        Self::Spring(value)
    }
}

impl From<ActionConfig> for DialValue {
    fn from(value: ActionConfig) -> Self {
        Self::Action(value)
    }
}

/// Mapping from dot-joined leaf path to the last value written there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatValues {
    entries: AHashMap<String, DialValue>,
}

impl FlatValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&DialValue> {
        self.entries.get(path)
    }

    /// Store `value` at `path`, returning the previous value.
    pub fn insert(&mut self, path: impl Into<String>, value: DialValue) -> Option<DialValue> {
        self.entries.insert(path.into(), value)
    }

    pub fn remove(&mut self, path: &str) -> Option<DialValue> {
        self.entries.remove(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DialValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Paths in lexicographic order, for stable output.
    #[must_use]
    pub fn sorted_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl<K: Into<String>, V: Into<DialValue>> FromIterator<(K, V)> for FlatValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
