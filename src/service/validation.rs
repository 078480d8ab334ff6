//! Request validation: identifier allow-list, record ids, list filters, payload bounds.

use crate::error::AppError;
use crate::value::{GenericRecord, GenericValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// PostgreSQL truncates identifiers beyond this length.
pub const MAX_IDENTIFIER_LEN: usize = 63;
pub const MAX_ID_LEN: usize = 255;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 1000;
/// Upper bound for both the records of one create call and the keys of one record.
pub const MAX_PAYLOAD_ENTRIES: usize = 100;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));
static OPAQUE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id regex"));

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Right-hand side of one list filter: a single value means `=`, several mean `IN`.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    One(GenericValue),
    Many(Vec<GenericValue>),
}

/// List parameters as received, before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
    pub filters: BTreeMap<String, FilterValue>,
}

/// Normalized list parameters. Filter keys may still name unknown columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemFilter {
    pub limit: i64,
    pub offset: i64,
    pub order_by: Option<String>,
    pub sort: SortDirection,
    pub filters: BTreeMap<String, FilterValue>,
}

impl Default for ItemFilter {
    fn default() -> Self {
        ItemFilter {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: None,
            sort: SortDirection::Asc,
            filters: BTreeMap::new(),
        }
    }
}

/// Validated record identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordId {
    Int(i64),
    Opaque(String),
}

impl RecordId {
    pub fn to_value(&self) -> GenericValue {
        match self {
            RecordId::Int(n) => GenericValue::Int(*n),
            RecordId::Opaque(s) => GenericValue::String(s.clone()),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Opaque(s) => f.write_str(s),
        }
    }
}

pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER.is_match(s)
}

pub struct RequestValidator;

impl RequestValidator {
    pub fn table_name(name: &str) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidIdentifier("table name cannot be empty".into()));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::InvalidIdentifier(format!(
                "table name too long: maximum {} characters",
                MAX_IDENTIFIER_LEN
            )));
        }
        if !IDENTIFIER.is_match(name) {
            return Err(AppError::InvalidIdentifier(format!(
                "'{}': letters, digits and underscores only, not starting with a digit",
                name
            )));
        }
        Ok(())
    }

    /// Positive integers become `RecordId::Int`; anything else must be a short `[A-Za-z0-9_-]` token.
    pub fn record_id(raw: &str) -> Result<RecordId, AppError> {
        if raw.is_empty() {
            return Err(AppError::InvalidId("id cannot be empty".into()));
        }
        if let Ok(n) = raw.parse::<i64>() {
            if n <= 0 {
                return Err(AppError::InvalidId(format!("{} must be positive", raw)));
            }
            return Ok(RecordId::Int(n));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(AppError::InvalidId(format!("id longer than {} characters", MAX_ID_LEN)));
        }
        if !OPAQUE_ID.is_match(raw) {
            return Err(AppError::InvalidId(format!(
                "'{}': only alphanumeric characters, underscores and hyphens allowed",
                raw
            )));
        }
        Ok(RecordId::Opaque(raw.to_string()))
    }

    pub fn filter(params: ListParams) -> Result<ItemFilter, AppError> {
        let limit = match params.limit {
            Some(n) if n > MAX_LIMIT => MAX_LIMIT,
            Some(n) if n > 0 => n,
            _ => DEFAULT_LIMIT,
        };
        let offset = params.offset.unwrap_or(0).max(0);
        let order_by = match params.order_by.filter(|s| !s.is_empty()) {
            Some(col) if !IDENTIFIER.is_match(&col) || col.len() > MAX_IDENTIFIER_LEN => {
                return Err(AppError::InvalidInput(format!("invalid order_by column '{}'", col)));
            }
            other => other,
        };
        let sort = match params.sort.as_deref().filter(|s| !s.is_empty()) {
            None => SortDirection::Asc,
            Some(s) => match s.to_ascii_uppercase().as_str() {
                "ASC" => SortDirection::Asc,
                "DESC" => SortDirection::Desc,
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "invalid sort direction '{}': must be ASC or DESC",
                        s
                    )))
                }
            },
        };
        Ok(ItemFilter {
            limit,
            offset,
            order_by,
            sort,
            filters: params.filters,
        })
    }

    pub fn create_payload(records: &[GenericRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            return Err(AppError::InvalidInput("data cannot be empty".into()));
        }
        if records.len() > MAX_PAYLOAD_ENTRIES {
            return Err(AppError::InvalidInput(format!(
                "too many records: maximum {} allowed",
                MAX_PAYLOAD_ENTRIES
            )));
        }
        for record in records {
            check_field_count(record)?;
        }
        Ok(())
    }

    pub fn update_payload(record: &GenericRecord) -> Result<(), AppError> {
        if record.is_empty() {
            return Err(AppError::InvalidInput("data cannot be empty".into()));
        }
        check_field_count(record)
    }
}

fn check_field_count(record: &GenericRecord) -> Result<(), AppError> {
    if record.len() > MAX_PAYLOAD_ENTRIES {
        return Err(AppError::InvalidInput(format!(
            "too many fields: maximum {} allowed",
            MAX_PAYLOAD_ENTRIES
        )));
    }
    Ok(())
}
