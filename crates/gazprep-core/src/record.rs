//! Record access for the processing stage
//!
//! The stage never sees the host's record representation directly. It reads and
//! writes fields through [`RecordAccessor`], a narrow get/set/remove capability
//! keyed by field name. [`JsonRecord`] adapts a JSON object, which is what the
//! CLI host feeds through the stage.
//!
//! Reads never fail: an absent field and a `null` field both read as `None`.
//! A multi-valued field (JSON array) reads as its first non-null value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-level access to one mutable record
pub trait RecordAccessor {
    /// First value of a field rendered as text, `None` when absent or null
    fn get(&self, field: &str) -> Option<String>;

    /// All non-null values of a field rendered as text
    fn get_all(&self, field: &str) -> Vec<String>;

    /// Replace a field with a single value
    fn set(&mut self, field: &str, value: String);

    /// Replace a field with a list of values
    fn set_all(&mut self, field: &str, values: Vec<String>);

    /// Remove a field, returning whether it was present
    fn remove(&mut self, field: &str) -> bool;

    /// Whether the field holds at least one non-null value
    fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}

/// Render a scalar JSON value the way a text field would be read
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(scalar_text),
        Value::Object(_) => Some(value.to_string()),
    }
}

impl RecordAccessor for Map<String, Value> {
    fn get(&self, field: &str) -> Option<String> {
        Map::get(self, field).and_then(scalar_text)
    }

    fn get_all(&self, field: &str) -> Vec<String> {
        match Map::get(self, field) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(other) => scalar_text(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn set(&mut self, field: &str, value: String) {
        self.insert(field.to_string(), Value::String(value));
    }

    fn set_all(&mut self, field: &str, values: Vec<String>) {
        let values = values.into_iter().map(Value::String).collect();
        self.insert(field.to_string(), Value::Array(values));
    }

    fn remove(&mut self, field: &str) -> bool {
        Map::remove(self, field).is_some()
    }
}

/// A record backed by a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonRecord {
    fields: Map<String, Value>,
}

impl JsonRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::InvalidRecord {
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Parse a single JSON object from text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Insert a raw JSON value, bypassing text rendering
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Borrow the underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw JSON value of a field
    pub fn raw(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Number of fields on the record
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Unwrap into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for JsonRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl RecordAccessor for JsonRecord {
    fn get(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(scalar_text)
    }

    fn get_all(&self, field: &str) -> Vec<String> {
        self.fields.get_all(field)
    }

    fn set(&mut self, field: &str, value: String) {
        RecordAccessor::set(&mut self.fields, field, value)
    }

    fn set_all(&mut self, field: &str, values: Vec<String>) {
        self.fields.set_all(field, values)
    }

    fn remove(&mut self, field: &str) -> bool {
        RecordAccessor::remove(&mut self.fields, field)
    }
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
