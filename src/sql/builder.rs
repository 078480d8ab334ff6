//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table descriptor.
//!
//! Identifiers come from the catalog (or passed the allow-list) and are always quoted.
//! Values only ever travel as positional parameters.

use crate::catalog::TableDescriptor;
use crate::error::AppError;
use crate::service::{FilterValue, ItemFilter};
use crate::sql::params::bind_text;
use crate::value::{GenericRecord, GenericValue};

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Binds `value` for `column` and returns its placeholder, cast to the column type when known.
    fn push_value(&mut self, entity: &TableDescriptor, column: &str, value: &GenericValue) -> String {
        let ty = entity.column_type(column);
        self.params.push(bind_text(value, ty));
        let n = self.params.len();
        match ty {
            Some(t) => format!("${}::{}", n, t.cast_target()),
            None => format!("${}", n),
        }
    }

    fn push_int(&mut self, n: i64) -> String {
        self.params.push(Some(n.to_string()));
        format!("${}::int8", self.params.len())
    }
}

/// Page query plus the matching COUNT over the same WHERE clause and arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ListQueries {
    pub select: QueryBuf,
    pub count: QueryBuf,
}

/// SELECT list: every column cast to text under its own name.
fn select_column_list(entity: &TableDescriptor) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(c);
            format!("{}::text AS {}", q, q)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Payload columns that exist in the table, in schema order, primary key excluded.
fn writable_columns<'a>(entity: &'a TableDescriptor, body: &'a GenericRecord) -> Vec<(&'a str, &'a GenericValue)> {
    entity
        .columns
        .iter()
        .filter(|c| **c != entity.primary_key)
        .filter_map(|c| body.get(c).map(|v| (c.as_str(), v)))
        .collect()
}

/// INSERT for one record, or `None` when the record names no insertable column.
pub fn insert(entity: &TableDescriptor, body: &GenericRecord) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, val) in writable_columns(entity, body) {
        placeholders.push(q.push_value(entity, name, val));
        cols.push(quoted(name));
    }
    if cols.is_empty() {
        return None;
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        entity.qualified_name(),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity)
    );
    Some(q)
}

/// One INSERT per record; records without insertable columns are skipped with a warning.
pub fn insert_rows(entity: &TableDescriptor, rows: &[GenericRecord]) -> Vec<QueryBuf> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let q = insert(entity, row);
            if q.is_none() {
                tracing::warn!(table = %entity.table, index = i, "no insertable columns in record, skipping");
            }
            q
        })
        .collect()
}

/// SELECT by primary key, every column cast to text.
pub fn select_by_id(entity: &TableDescriptor, id: &GenericValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &entity.primary_key;
    let ph = q.push_value(entity, pk, id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(entity),
        entity.qualified_name(),
        quoted(pk),
        ph
    );
    q
}

/// Filtered page plus total count. Filter keys that are not columns are dropped.
pub fn select_list(entity: &TableDescriptor, filter: &ItemFilter) -> ListQueries {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in &filter.filters {
        if !entity.has_column(col) {
            continue;
        }
        match val {
            FilterValue::One(v) => {
                let ph = q.push_value(entity, col, v);
                where_parts.push(format!("{} = {}", quoted(col), ph));
            }
            FilterValue::Many(vs) if vs.is_empty() => where_parts.push("1 = 0".to_string()),
            FilterValue::Many(vs) => {
                let phs: Vec<String> = vs.iter().map(|v| q.push_value(entity, col, v)).collect();
                where_parts.push(format!("{} IN ({})", quoted(col), phs.join(", ")));
            }
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let table = entity.qualified_name();

    let count = QueryBuf {
        sql: format!("SELECT COUNT(*) FROM {}{}", table, where_clause),
        params: q.params.clone(),
    };

    let order_clause = match filter.order_by.as_deref().filter(|c| entity.has_column(c)) {
        Some(col) => format!(" ORDER BY {} {}", quoted(col), filter.sort.as_sql()),
        None => match entity.columns.first() {
            Some(first) => format!(" ORDER BY {} ASC", quoted(first)),
            None => String::new(),
        },
    };
    let limit_clause = if filter.limit > 0 {
        format!(" LIMIT {}", q.push_int(filter.limit))
    } else {
        String::new()
    };
    let offset_clause = if filter.offset > 0 {
        format!(" OFFSET {}", q.push_int(filter.offset))
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(entity),
        table,
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    ListQueries { select: q, count }
}

/// UPDATE by id: SET only payload columns that exist, primary key excluded. Id binds last.
pub fn update(entity: &TableDescriptor, id: &GenericValue, body: &GenericRecord) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, val) in writable_columns(entity, body) {
        let rhs = q.push_value(entity, name, val);
        sets.push(format!("{} = {}", quoted(name), rhs));
    }
    if sets.is_empty() {
        return Err(AppError::NoUpdatableColumns {
            table: entity.table.clone(),
        });
    }
    let pk = &entity.primary_key;
    let id_ph = q.push_value(entity, pk, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        entity.qualified_name(),
        sets.join(", "),
        quoted(pk),
        id_ph,
        select_column_list(entity)
    );
    Ok(q)
}

/// DELETE by id. The caller checks rows affected.
pub fn delete(entity: &TableDescriptor, id: &GenericValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &entity.primary_key;
    let ph = q.push_value(entity, pk, id);
    q.sql = format!("DELETE FROM {} WHERE {} = {}", entity.qualified_name(), quoted(pk), ph);
    q
}
