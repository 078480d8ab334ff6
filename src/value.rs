//! Generic value model shared by request payloads, bind parameters, and result rows.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single cell, independent of the column's SQL type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenericValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Parsed PostgreSQL array; elements keep their textual form.
    Array(Vec<String>),
    Json(Value),
}

/// Column name to value. Key order carries no meaning.
pub type GenericRecord = BTreeMap<String, GenericValue>;

impl GenericValue {
    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }
}

impl From<Value> for GenericValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => GenericValue::Null,
            Value::Bool(b) => GenericValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GenericValue::Int(i)
                } else {
                    GenericValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => GenericValue::String(s),
            Value::Array(items) if items.iter().all(Value::is_string) => GenericValue::Array(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => GenericValue::Json(other),
        }
    }
}

impl<'de> Deserialize<'de> for GenericValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(GenericValue::from)
    }
}

impl From<i64> for GenericValue {
    fn from(n: i64) -> Self {
        GenericValue::Int(n)
    }
}

impl From<f64> for GenericValue {
    fn from(n: f64) -> Self {
        GenericValue::Float(n)
    }
}

impl From<bool> for GenericValue {
    fn from(b: bool) -> Self {
        GenericValue::Bool(b)
    }
}

impl From<&str> for GenericValue {
    fn from(s: &str) -> Self {
        GenericValue::String(s.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(s: String) -> Self {
        GenericValue::String(s)
    }
}

/// A cell as the driver handed it over, before coercion against the declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Json(Value),
    /// Driver-native value with no direct generic counterpart, already rendered as text.
    Other(String),
}
