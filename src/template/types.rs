//! Field values and the record capability used by the renderer

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// A value a record exposes for a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Optional value that is unset
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Text carrying a validity flag. The stored text renders whatever the flag says.
    TaggedText { text: String, valid: bool },
    /// Point in time carrying a validity flag
    Timestamp { at: DateTime<Utc>, valid: bool },
}

impl FieldValue {
    /// A valid timestamp value
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        FieldValue::Timestamp { at, valid: true }
    }

    /// Replacement text for a placeholder resolving to this value
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::TaggedText { text, .. } => text.clone(),
            FieldValue::Timestamp { at, valid: true } => format_timestamp(at),
            other => other.to_string(),
        }
    }
}

/// Generic string representation, used when no more specific rule applies
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(n) => write!(f, "{}", n),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::TaggedText { text, .. } => f.write_str(text),
            FieldValue::Timestamp { at, .. } => write!(f, "{}", at),
        }
    }
}

/// RFC 3339 with second precision and `Z` for UTC, e.g. `2024-12-04T15:30:00Z`.
///
/// Same format accepted for a campaign's `scheduled_at`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Text(n.to_string()),
            },
            // Arrays and objects render as their JSON representation
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// A record whose fields can be referenced from a template.
///
/// Each record type declares its own placeholder names. `None` means the record
/// has no field of that name, which leaves the placeholder untouched.
pub trait TemplateData {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl TemplateData for HashMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

/// JSON objects are records; any other JSON value has no fields.
impl TemplateData for serde_json::Value {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            serde_json::Value::Object(map) => map.get(name).map(FieldValue::from),
            _ => None,
        }
    }
}
