//! Converts raw driver cells into `GenericValue` using the column's declared type.
//!
//! Rows are read with every column cast to text, so most cells arrive as `RawValue::Text`
//! and the real type is re-derived here from `information_schema` type names. Malformed
//! stored data never fails a read: the original text is kept and a `CoercionWarning` is
//! handed back to the caller for logging.

use crate::error::CoercionWarning;
use crate::value::{GenericValue, RawValue};

/// Parse rule selected by the declared column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Float,
    Boolean,
    Array,
    /// uuid, json, jsonb, text, dates, enums and anything unrecognized.
    Text,
}

impl TypeFamily {
    pub fn of(declared: &str) -> Self {
        let t = declared.trim().to_ascii_lowercase();
        if t == "array" || t.ends_with("[]") {
            return TypeFamily::Array;
        }
        match t.as_str() {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "smallserial"
            | "serial" | "bigserial" | "serial2" | "serial4" | "serial8" => TypeFamily::Integer,
            "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8" => TypeFamily::Float,
            "boolean" | "bool" => TypeFamily::Boolean,
            _ => TypeFamily::Text,
        }
    }
}

/// Booleans as accepted in query strings and stored text: `1 t T TRUE true True`, `0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Splits a PostgreSQL array literal into its top-level elements.
///
/// Commas inside double quotes or nested braces do not split; quotes are dropped and
/// backslash escapes inside quotes are resolved. `{}` and the empty string give no elements.
/// Returns `None` when the text is not brace-enclosed or a quote is left open.
pub fn parse_pg_array(text: &str) -> Option<Vec<String>> {
    let text = text.trim();
    if text.is_empty() || text == "{}" {
        return Some(Vec::new());
    }
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut depth = 0usize;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => current.push(chars.next()?),
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
                if depth > 0 {
                    current.push(c);
                }
            }
            '{' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            '}' if !in_quotes && depth > 0 => {
                depth -= 1;
                current.push(c);
            }
            ',' if !in_quotes && depth == 0 => {
                elements.push(std::mem::take(&mut current));
                quoted = false;
            }
            _ => current.push(c),
        }
    }
    if in_quotes || depth > 0 {
        return None;
    }
    if !current.is_empty() || quoted {
        elements.push(current);
    }
    Some(elements)
}

/// `jsonb` text is decoded only for columns whose name does not look like an identifier.
pub fn should_promote_json(declared: &str, column: &str, text: &str) -> bool {
    if declared != "jsonb" {
        return false;
    }
    if column.to_ascii_lowercase().contains("id") {
        return false;
    }
    let t = text.trim();
    t.starts_with('{') || t.starts_with('[')
}

/// Coerces one cell. The warning, if any, is informational; the value is always usable.
pub fn coerce(raw: RawValue, declared: &str, column: &str) -> (GenericValue, Option<CoercionWarning>) {
    let family = TypeFamily::of(declared);
    match raw {
        RawValue::Null => (GenericValue::Null, None),
        RawValue::Text(text) if family == TypeFamily::Array => match parse_pg_array(&text) {
            Some(items) => (GenericValue::Array(items), None),
            None => {
                let warning = CoercionWarning::MalformedArray {
                    column: column.to_string(),
                    text: text.clone(),
                };
                (GenericValue::String(text), Some(warning))
            }
        },
        RawValue::Text(text) => coerce_text(text, family, declared, column),
        RawValue::Int16(n) => (GenericValue::Int(n.into()), None),
        RawValue::Int32(n) => (GenericValue::Int(n.into()), None),
        RawValue::Int64(n) => (GenericValue::Int(n), None),
        RawValue::Float32(n) => native_float(n.into(), column),
        RawValue::Float64(n) => native_float(n, column),
        RawValue::Bool(b) => (GenericValue::Bool(b), None),
        RawValue::Json(v) => (GenericValue::Json(v), None),
        RawValue::Other(s) => (GenericValue::String(s), None),
    }
}

/// JSON has no NaN or infinities; those keep PostgreSQL's spelling as text.
fn native_float(n: f64, column: &str) -> (GenericValue, Option<CoercionWarning>) {
    if n.is_finite() {
        return (GenericValue::Float(n), None);
    }
    let text = if n.is_nan() {
        "NaN"
    } else if n > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    };
    let warning = CoercionWarning::Unparseable {
        column: column.to_string(),
        text: text.to_string(),
        target: "float64",
    };
    (GenericValue::String(text.to_string()), Some(warning))
}

fn coerce_text(
    text: String,
    family: TypeFamily,
    declared: &str,
    column: &str,
) -> (GenericValue, Option<CoercionWarning>) {
    let unparseable = |text: String, target: &'static str| {
        let warning = CoercionWarning::Unparseable {
            column: column.to_string(),
            text: text.clone(),
            target,
        };
        (GenericValue::String(text), Some(warning))
    };
    match family {
        TypeFamily::Integer => match text.trim().parse::<i64>() {
            Ok(n) => (GenericValue::Int(n), None),
            Err(_) => unparseable(text, "int64"),
        },
        TypeFamily::Float => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => (GenericValue::Float(n), None),
            _ => unparseable(text, "float64"),
        },
        TypeFamily::Boolean => match parse_bool(text.trim()) {
            Some(b) => (GenericValue::Bool(b), None),
            None => unparseable(text, "bool"),
        },
        TypeFamily::Array | TypeFamily::Text => promote_json(text, declared, column),
    }
}

fn promote_json(text: String, declared: &str, column: &str) -> (GenericValue, Option<CoercionWarning>) {
    if !should_promote_json(declared, column, &text) {
        return (GenericValue::String(text), None);
    }
    match serde_json::from_str(text.trim()) {
        Ok(v) => (GenericValue::Json(v), None),
        Err(e) => {
            let warning = CoercionWarning::InvalidJson {
                column: column.to_string(),
                reason: e.to_string(),
            };
            (GenericValue::String(text), Some(warning))
        }
    }
}
