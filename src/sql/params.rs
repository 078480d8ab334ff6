//! Render generic values as text parameters. The SQL text casts each one to its column type.

use crate::catalog::ColumnType;
use crate::value::GenericValue;
use serde_json::Value;

/// Text form of `value` for a column of type `column`; `None` binds SQL NULL.
///
/// Arrays headed for array columns become PostgreSQL array literals; every other
/// structured value is sent as JSON text.
pub fn bind_text(value: &GenericValue, column: Option<&ColumnType>) -> Option<String> {
    let array_column = column.map(ColumnType::is_array).unwrap_or(false);
    match value {
        GenericValue::Null => None,
        GenericValue::Int(n) => Some(n.to_string()),
        GenericValue::Float(n) => Some(n.to_string()),
        GenericValue::Bool(b) => Some(b.to_string()),
        GenericValue::String(s) => Some(s.clone()),
        GenericValue::Array(items) if array_column => Some(array_literal(items.iter().map(|s| Some(quote_element(s))))),
        GenericValue::Array(items) => Some(Value::from(items.clone()).to_string()),
        GenericValue::Json(Value::Array(items)) if array_column => Some(json_array_literal(items)),
        GenericValue::Json(v) => Some(v.to_string()),
    }
}

fn array_literal(elements: impl Iterator<Item = Option<String>>) -> String {
    let parts: Vec<String> = elements.map(|e| e.unwrap_or_else(|| "NULL".to_string())).collect();
    format!("{{{}}}", parts.join(","))
}

fn json_array_literal(items: &[Value]) -> String {
    array_literal(items.iter().map(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(quote_element(s)),
        Value::Array(nested) => Some(json_array_literal(nested)),
        other => Some(quote_element(&other.to_string())),
    }))
}

fn quote_element(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
