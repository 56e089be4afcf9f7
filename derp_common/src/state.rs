//! Shared vehicle state.
//!
//! This module defines:
//! - `Value` - Tagged value held by a state field (`Null` = no opinion yet)
//! - `State` - Ordered field name -> value store shared by every component
//! - `Field` - Fields tracked by input components
//! - `SparseUpdate` - Per-drain partial update merged into `State`
//!
//! The store is single-owner: the driver lends it to one component step at a
//! time through `&mut State`, so no locking is involved.

use std::fmt;

/// Value of a single state field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Field declared, but nobody has set it yet.
    #[default]
    Null,
    /// Boolean flag
    Bool(bool),
    /// Numeric value (integers are widened)
    Number(f64),
    /// Text value (paths, names)
    Text(String),
}

impl Value {
    /// Returns `true` for the `Null` marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Fields written by input components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Recording enabled
    Record,
    /// Current record folder, `false` when not recording
    Folder,
    /// Throttle command
    Speed,
    /// Steering command
    Steer,
    /// Autonomous throttle enabled
    AutoSpeed,
    /// Autonomous steering enabled
    AutoSteer,
    /// Throttle offset preset
    SpeedOffset,
    /// Steering trim
    SteerOffset,
    /// Shutdown requested
    Exit,
}

impl Field {
    /// Number of tracked fields.
    pub const COUNT: usize = 9;

    /// Every tracked field, in slot order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Record,
        Field::Folder,
        Field::Speed,
        Field::Steer,
        Field::AutoSpeed,
        Field::AutoSteer,
        Field::SpeedOffset,
        Field::SteerOffset,
        Field::Exit,
    ];

    /// State key of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Record => "record",
            Field::Folder => "folder",
            Field::Speed => "speed",
            Field::Steer => "steer",
            Field::AutoSpeed => "auto_speed",
            Field::AutoSteer => "auto_steer",
            Field::SpeedOffset => "speed_offset",
            Field::SteerOffset => "steer_offset",
            Field::Exit => "exit",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl AsRef<str> for Field {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered field name -> value mapping.
///
/// Insertion order is kept so that declared defaults, logs and recordings
/// list fields in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    fields: Vec<(String, Value)>,
}

/// Defaults declared in configuration share the store's shape.
pub type StateDefaults = State;

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the shared state from the resolved root defaults.
    pub fn from_defaults(defaults: &StateDefaults) -> Self {
        defaults.clone()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == key)
    }

    /// Get a field's value.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&Value> {
        let key = key.as_ref();
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the field has been declared.
    pub fn contains<K: AsRef<str>>(&self, key: K) -> bool {
        self.position(key.as_ref()).is_some()
    }

    /// Numeric value of a field, `None` if absent, null or not a number.
    pub fn number<K: AsRef<str>>(&self, key: K) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Boolean value of a field, `None` if absent, null or not a boolean.
    pub fn flag<K: AsRef<str>>(&self, key: K) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Text value of a field, `None` if absent, null or not text.
    pub fn text<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Overwrite a field, appending it if it is new.
    pub fn set<K: AsRef<str>>(&mut self, key: K, value: impl Into<Value>) {
        let key = key.as_ref();
        let value = value.into();
        match self.position(key) {
            Some(idx) => self.fields[idx].1 = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    /// Set a field only if it is absent or `Null`.
    ///
    /// Returns `true` if the value was written. Earlier explicit values are
    /// never clobbered, which makes the outcome depend on seeding order.
    pub fn seed<K: AsRef<str>>(&mut self, key: K, value: impl Into<Value>) -> bool {
        let key = key.as_ref();
        match self.position(key) {
            Some(idx) if !self.fields[idx].1.is_null() => false,
            Some(idx) => {
                self.fields[idx].1 = value.into();
                true
            }
            None => {
                self.fields.push((key.to_string(), value.into()));
                true
            }
        }
    }

    /// Overwrite every field touched by `update`; untouched fields are kept.
    pub fn merge(&mut self, update: SparseUpdate) {
        for (field, value) in update.into_touched() {
            self.set(field, value);
        }
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Partial update produced by one sense step.
///
/// Every slot starts absent; only the fields touched during the drain carry a
/// value when merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseUpdate {
    slots: [Option<Value>; Field::COUNT],
}

impl SparseUpdate {
    /// Create an update with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value from the same drain.
    pub fn set(&mut self, field: Field, value: impl Into<Value>) {
        self.slots[field.slot()] = Some(value.into());
    }

    /// Pending value of a field.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.slots[field.slot()].as_ref()
    }

    /// Returns `true` if no field was touched.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Touched fields with their values, in slot order.
    pub fn into_touched(self) -> impl Iterator<Item = (Field, Value)> {
        Field::ALL
            .into_iter()
            .zip(self.slots)
            .filter_map(|(field, slot)| slot.map(|value| (field, value)))
    }
}
