//! Configuration value types
//!
//! A settings tree is a [`Value`]: scalars (string, int, float, bool, null),
//! sequences, or mappings. Mappings are [`Table`]s, which carry the lock
//! markers set by [`crate::lock`] and refuse mutations those markers forbid.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::lock::LockState;

/// Separator between segments of a dotted key
pub const KEY_DELIMITER: char = '.';

/// A node of the settings tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[derive(Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(Table),
}

/// A mapping node: string keys to values, plus its lock state
///
/// Equality compares entries only; two tables with the same content are
/// equal whether or not they are locked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    entries: IndexMap<String, Value>,
    #[serde(skip)]
    lock: LockState,
}

impl Table {
    /// Create an empty, unlocked table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.entries.values()
    }

    /// Current lock markers
    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_closed(&self) -> bool {
        self.lock.is_closed()
    }

    pub fn is_frozen(&self) -> bool {
        self.lock.is_frozen()
    }

    /// Insert or replace a value
    ///
    /// Adding a key fails on a closed table; replacing one fails on a frozen
    /// table. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            if self.lock.is_frozen() {
                return Err(Error::value_locked(key));
            }
        } else if self.lock.is_closed() {
            return Err(Error::shape_locked(key));
        }
        Ok(self.entries.insert(key, value))
    }

    /// Remove a key, failing on a frozen table
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        if self.lock.is_frozen() {
            return Err(Error::value_locked(key));
        }
        Ok(self.entries.shift_remove(key))
    }

    /// Mutable access to a value, failing on a frozen table
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut Value>> {
        if self.lock.is_frozen() {
            return Err(Error::value_locked(key));
        }
        Ok(self.entries.get_mut(key))
    }

    pub(crate) fn lock_state_mut(&mut self) -> &mut LockState {
        &mut self.lock
    }

    // Bypasses the frozen check; only for descending without reassigning.
    pub(crate) fn children_mut(&mut self) -> indexmap::map::ValuesMut<'_, String, Value> {
        self.entries.values_mut()
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl From<IndexMap<String, Value>> for Table {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Self {
            entries,
            lock: LockState::default(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<IndexMap<String, Value>>()
            .into()
    }
}

impl IntoIterator for Table {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check if this value is an integer
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    /// Check if this value is a float
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Check if this value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this value is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Check if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Get as boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float or Integer
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a Sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Get as table if this is a Mapping
    pub fn as_mapping(&self) -> Option<&Table> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Get a value by dotted key (e.g., "database.host")
    ///
    /// Every segment must name a key of the mapping reached so far. On
    /// failure the error names the key up to and including the first segment
    /// that did not resolve: `does.not.exist` fails with `does`.
    pub fn get_path(&self, key: &str) -> Result<&Value> {
        let segments = parse_key(key)?;
        let mut current = self;

        for (depth, segment) in segments.iter().enumerate() {
            current = current
                .as_mapping()
                .and_then(|table| table.get(segment))
                .ok_or_else(|| Error::key_not_found(segments[..=depth].join(".")))?;
        }

        Ok(current)
    }

    /// Set a value at a dotted key, creating intermediate mappings as needed
    ///
    /// Locks are honoured at the mapping that receives the change: a new key
    /// needs an open table (including any intermediate mapping that would
    /// have to be created), and a replaced key needs an unfrozen one.
    pub fn set_path(&mut self, key: &str, value: Value) -> Result<()> {
        let segments = parse_key(key)?;
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(Error::invalid_argument("empty key")),
        };
        let mut current = self;

        for (depth, segment) in parents.iter().enumerate() {
            let table = match current {
                Value::Mapping(table) => table,
                _ => return Err(Error::key_not_found(segments[..depth].join("."))),
            };
            if !table.contains_key(segment) {
                table
                    .insert(*segment, Value::Mapping(Table::new()))
                    .map_err(|e| e.with_path(segments[..=depth].join(".")))?;
            }
            current = match table.child_mut(segment) {
                Some(child) => child,
                None => return Err(Error::key_not_found(segments[..=depth].join("."))),
            };
        }

        match current {
            Value::Mapping(table) => {
                table
                    .insert(*last, value)
                    .map_err(|e| e.with_path(key))?;
                Ok(())
            }
            _ => Err(Error::key_not_found(key)),
        }
    }

    /// Dotted keys of every leaf below this value
    ///
    /// Leaves are scalars, sequences, and empty mappings.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_leaf_paths("", &mut paths);
        paths
    }

    fn collect_leaf_paths(&self, prefix: &str, out: &mut Vec<String>) {
        match self {
            Value::Mapping(table) if !table.is_empty() => {
                for (key, child) in table {
                    child.collect_leaf_paths(&join_key(prefix, key), out);
                }
            }
            _ if !prefix.is_empty() => out.push(prefix.to_string()),
            _ => {}
        }
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Mapping(t)
    }
}

/// Split a dotted key into its segments
///
/// Keys must have at least one segment and no empty segments.
pub fn parse_key(key: &str) -> Result<Vec<&str>> {
    if key.is_empty() {
        return Err(Error::invalid_argument("configuration key must not be empty"));
    }
    let segments: Vec<&str> = key.split(KEY_DELIMITER).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::invalid_argument(format!(
            "configuration key '{}' has an empty segment",
            key
        )));
    }
    Ok(segments)
}

/// Append a segment to a dotted prefix
pub(crate) fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_DELIMITER, segment)
    }
}
