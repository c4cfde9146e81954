//! Canonical structured values for carrying tool results into the protocol
//!
//! Tool routes hand back arbitrary JSON; the model endpoint wants a
//! map-shaped structured value in the function response. `StructuredValue`
//! is the bridge: a closed recursive variant type with one numeric
//! representation (`f64`, matching JSON-number wire semantics) and total
//! conversions in both directions.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Map payload of a function response (string keys, structured values)
pub type StructMap = BTreeMap<String, StructuredValue>;

/// A JSON-shaped value in canonical form
///
/// Numbers of any source width or precision collapse to `f64`. The loss of
/// integer precision above 2^53 is intentional and matches what the wire
/// format itself can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<StructuredValue>),
    Struct(StructMap),
}

impl StructuredValue {
    /// Convert any JSON value to its canonical form
    ///
    /// Total: every `serde_json::Value` has an image. Null elements inside
    /// arrays are kept as `Null`, not dropped.
    pub fn from_json(value: &Value) -> StructuredValue {
        match value {
            Value::Null => StructuredValue::Null,
            Value::Bool(b) => StructuredValue::Bool(*b),
            // as_f64 is total for numbers parsed without arbitrary_precision
            Value::Number(n) => StructuredValue::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => StructuredValue::String(s.clone()),
            Value::Array(items) => {
                StructuredValue::List(items.iter().map(StructuredValue::from_json).collect())
            }
            Value::Object(entries) => StructuredValue::Struct(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), StructuredValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a JSON value into a map where the protocol mandates one
    ///
    /// A function response must be map-shaped. An object converts directly;
    /// a bare array is wrapped in a single `"data"` entry so list-shaped
    /// tool results stay usable; a bare leaf has no sensible map form and
    /// fails with a conversion error naming the offending value.
    pub fn struct_from_json(value: &Value) -> Result<StructMap> {
        match value {
            Value::Object(entries) => Ok(entries
                .iter()
                .map(|(k, v)| (k.clone(), StructuredValue::from_json(v)))
                .collect()),
            Value::Array(items) => {
                let list = StructuredValue::List(
                    items.iter().map(StructuredValue::from_json).collect(),
                );
                let mut map = StructMap::new();
                map.insert("data".to_string(), list);
                Ok(map)
            }
            other => Err(Error::conversion(format!(
                "a structured result must be an object or array, received {}",
                describe_json(other)
            ))),
        }
    }

    /// Convert back to a plain JSON value
    pub fn to_json(&self) -> Value {
        match self {
            StructuredValue::Null => Value::Null,
            StructuredValue::Bool(b) => Value::Bool(*b),
            // Value::from maps non-finite floats to null rather than panicking
            StructuredValue::Number(n) => Value::from(*n),
            StructuredValue::String(s) => Value::String(s.clone()),
            StructuredValue::List(items) => {
                Value::Array(items.iter().map(StructuredValue::to_json).collect())
            }
            StructuredValue::Struct(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Borrow the string if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructuredValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number if this is a `Number`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StructuredValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up an entry if this is a `Struct`
    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Struct(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl Serialize for StructuredValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Render a JSON value for an error message: its type and literal form
fn describe_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool: {}", b),
        Value::Number(n) => format!("number: {}", n),
        Value::String(s) => format!("string: \"{}\"", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
