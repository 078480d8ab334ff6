//! Table structure read from `information_schema` on every call.
//!
//! Callers validate the table name before reaching the catalog; nothing here re-checks it.

use crate::coerce::TypeFamily;
use crate::error::{AppError, Operation};
use crate::sql::quoted;
use sqlx::PgPool;
use std::collections::HashMap;

/// Used when a table has no primary-key constraint.
pub const FALLBACK_PRIMARY_KEY: &str = "id";

const COLUMNS_QUERY: &str = r#"
SELECT column_name::text,
       CASE WHEN data_type = 'USER-DEFINED' THEN udt_name::text ELSE data_type::text END,
       udt_schema::text,
       udt_name::text
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
ORDER BY ordinal_position
"#;

const PRIMARY_KEY_QUERY: &str = r#"
SELECT kcu.column_name::text
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON tc.constraint_name = kcu.constraint_name
 AND tc.table_schema = kcu.table_schema
 AND tc.table_name = kcu.table_name
WHERE tc.table_schema = $1
  AND tc.table_name = $2
  AND tc.constraint_type = 'PRIMARY KEY'
ORDER BY kcu.ordinal_position
LIMIT 1
"#;

const EXISTS_QUERY: &str = r#"
SELECT EXISTS (
  SELECT 1 FROM information_schema.tables
  WHERE table_schema = $1 AND table_name = $2
)
"#;

const SCHEMA_EXISTS_QUERY: &str = r#"
SELECT EXISTS (
  SELECT 1 FROM information_schema.schemata
  WHERE schema_name = $1
)
"#;

/// Declared type of one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnType {
    /// `data_type`, or the underlying `udt_name` for user-defined types (enums, domains).
    pub declared: String,
    pub udt_schema: String,
    pub udt_name: String,
}

impl ColumnType {
    /// Fully qualified type to cast text parameters to, e.g. `"pg_catalog"."int4"`.
    pub fn cast_target(&self) -> String {
        format!("{}.{}", quoted(&self.udt_schema), quoted(&self.udt_name))
    }

    pub fn is_array(&self) -> bool {
        TypeFamily::of(&self.declared) == TypeFamily::Array
    }
}

/// Structure of one table, rebuilt per operation.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    pub schema: String,
    pub table: String,
    /// Column names in schema order.
    pub columns: Vec<String>,
    pub primary_key: String,
    pub column_types: HashMap<String, ColumnType>,
}

impl TableDescriptor {
    pub fn has_column(&self, name: &str) -> bool {
        self.column_types.contains_key(name)
    }

    pub fn column_type(&self, name: &str) -> Option<&ColumnType> {
        self.column_types.get(name)
    }

    pub fn declared_type(&self, name: &str) -> &str {
        self.column_type(name).map(|t| t.declared.as_str()).unwrap_or("")
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.table))
    }
}

pub struct SchemaCatalog<'a> {
    pool: &'a PgPool,
    schema: &'a str,
}

impl<'a> SchemaCatalog<'a> {
    pub fn new(pool: &'a PgPool, schema: &'a str) -> Self {
        SchemaCatalog { pool, schema }
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<(String, ColumnType)>, AppError> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(COLUMNS_QUERY)
            .bind(self.schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Describe, table, e))?;
        if rows.is_empty() {
            return Err(AppError::SchemaLookupFailure {
                table: table.to_string(),
            });
        }
        Ok(rows
            .into_iter()
            .map(|(name, declared, udt_schema, udt_name)| {
                (
                    name,
                    ColumnType {
                        declared,
                        udt_schema,
                        udt_name,
                    },
                )
            })
            .collect())
    }

    /// Column names in schema order. A missing table has no columns and fails.
    pub async fn columns(&self, table: &str) -> Result<Vec<String>, AppError> {
        Ok(self.fetch_columns(table).await?.into_iter().map(|(name, _)| name).collect())
    }

    pub async fn column_types(&self, table: &str) -> Result<HashMap<String, ColumnType>, AppError> {
        Ok(self.fetch_columns(table).await?.into_iter().collect())
    }

    /// Primary-key column; falls back to `id` with a warning when none can be found.
    pub async fn primary_key(&self, table: &str) -> String {
        let found: Result<Option<(String,)>, sqlx::Error> = sqlx::query_as(PRIMARY_KEY_QUERY)
            .bind(self.schema)
            .bind(table)
            .fetch_optional(self.pool)
            .await;
        match found {
            Ok(Some((column,))) => column,
            Ok(None) => {
                tracing::warn!(table = %table, "no primary key constraint, assuming '{}'", FALLBACK_PRIMARY_KEY);
                FALLBACK_PRIMARY_KEY.to_string()
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "primary key lookup failed, assuming '{}'", FALLBACK_PRIMARY_KEY);
                FALLBACK_PRIMARY_KEY.to_string()
            }
        }
    }

    pub async fn exists(&self, table: &str) -> Result<bool, AppError> {
        sqlx::query_scalar(EXISTS_QUERY)
            .bind(self.schema)
            .bind(table)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Describe, table, e))
    }

    /// Whether the configured schema is visible to the connected role.
    pub async fn schema_exists(&self) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(SCHEMA_EXISTS_QUERY)
            .bind(self.schema)
            .fetch_one(self.pool)
            .await
    }

    /// Columns, types and primary key in one descriptor.
    pub async fn describe(&self, table: &str) -> Result<TableDescriptor, AppError> {
        let fetched = self.fetch_columns(table).await?;
        let primary_key = self.primary_key(table).await;
        let columns = fetched.iter().map(|(name, _)| name.clone()).collect();
        Ok(TableDescriptor {
            schema: self.schema.to_string(),
            table: table.to_string(),
            columns,
            primary_key,
            column_types: fetched.into_iter().collect(),
        })
    }
}
