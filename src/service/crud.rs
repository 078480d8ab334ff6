//! Generic CRUD execution against PostgreSQL.
//!
//! Every operation validates its inputs, re-reads the table structure, builds the SQL,
//! runs it on the pool and coerces the returned rows. Dropping a returned future (client
//! disconnect, request timeout) aborts the in-flight statement and releases its connection.

use crate::catalog::{SchemaCatalog, TableDescriptor};
use crate::coerce::coerce;
use crate::error::{AppError, Operation};
use crate::service::validation::{ListParams, RequestValidator};
use crate::sql::{self, QueryBuf};
use crate::value::{GenericRecord, RawValue};
use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};

/// One page of a list call. `total` counts every matching row regardless of paging.
#[derive(Clone, Debug, Serialize)]
pub struct ListPage {
    pub items: Vec<GenericRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnSummary>,
    pub primary_key: String,
}

#[derive(Clone)]
pub struct CrudService {
    pool: PgPool,
    schema: String,
}

impl CrudService {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        CrudService {
            pool,
            schema: schema.into(),
        }
    }

    /// Round trip to the database that also confirms the exposed schema is still there.
    pub async fn ping(&self) -> Result<(), AppError> {
        let found = self
            .catalog()
            .schema_exists()
            .await
            .map_err(|e| AppError::Unavailable(format!("database unreachable: {}", e)))?;
        if !found {
            return Err(AppError::Unavailable(format!("schema {} not found", self.schema)));
        }
        Ok(())
    }

    fn catalog(&self) -> SchemaCatalog<'_> {
        SchemaCatalog::new(&self.pool, &self.schema)
    }

    /// Inserts every record in one transaction and returns the stored rows.
    /// Records naming no insertable column are skipped.
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub async fn create(&self, table: &str, records: &[GenericRecord]) -> Result<Vec<GenericRecord>, AppError> {
        RequestValidator::table_name(table)?;
        RequestValidator::create_payload(records)?;
        let entity = self.catalog().describe(table).await?;
        let queries = sql::insert_rows(&entity, records);

        let db_err = |e| AppError::database(Operation::Create, table, e);
        let mut out = Vec::with_capacity(queries.len());
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for q in &queries {
            log_query(q);
            let row = bind_all(q).fetch_one(&mut *tx).await.map_err(db_err)?;
            out.push(decode_row(&entity, &row));
        }
        tx.commit().await.map_err(db_err)?;
        tracing::info!(created = out.len(), "records created");
        Ok(out)
    }

    #[tracing::instrument(skip(self))]
    pub async fn read(&self, table: &str, id: &str) -> Result<GenericRecord, AppError> {
        RequestValidator::table_name(table)?;
        let id = RequestValidator::record_id(id)?;
        let entity = self.catalog().describe(table).await?;
        let q = sql::select_by_id(&entity, &id.to_value());
        log_query(&q);
        let row = bind_all(&q)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Read, table, e))?
            .ok_or_else(|| AppError::NotFound(format!("item {} in {}", id, table)))?;
        Ok(decode_row(&entity, &row))
    }

    #[tracing::instrument(skip(self, params))]
    pub async fn list(&self, table: &str, params: ListParams) -> Result<ListPage, AppError> {
        RequestValidator::table_name(table)?;
        let filter = RequestValidator::filter(params)?;
        let entity = self.catalog().describe(table).await?;
        let queries = sql::select_list(&entity, &filter);

        log_query(&queries.count);
        let mut count = sqlx::query_scalar::<_, i64>(&queries.count.sql);
        for p in &queries.count.params {
            count = count.bind(p.as_deref());
        }
        let total = count
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Count, table, e))?;

        log_query(&queries.select);
        let rows = bind_all(&queries.select)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(Operation::List, table, e))?;
        Ok(ListPage {
            items: rows.iter().map(|r| decode_row(&entity, r)).collect(),
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update(&self, table: &str, id: &str, data: &GenericRecord) -> Result<GenericRecord, AppError> {
        RequestValidator::table_name(table)?;
        let id = RequestValidator::record_id(id)?;
        RequestValidator::update_payload(data)?;
        let entity = self.catalog().describe(table).await?;
        let q = sql::update(&entity, &id.to_value(), data)?;
        log_query(&q);
        let row = bind_all(&q)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Update, table, e))?
            .ok_or_else(|| AppError::NotFound(format!("item {} in {}", id, table)))?;
        Ok(decode_row(&entity, &row))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), AppError> {
        RequestValidator::table_name(table)?;
        let id = RequestValidator::record_id(id)?;
        let entity = self.catalog().describe(table).await?;
        let q = sql::delete(&entity, &id.to_value());
        log_query(&q);
        let affected = bind_all(&q)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(Operation::Delete, table, e))?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound(format!("item {} in {}", id, table)));
        }
        tracing::info!("record deleted");
        Ok(())
    }

    /// Column names, declared types and primary key of an existing table.
    #[tracing::instrument(skip(self))]
    pub async fn describe(&self, table: &str) -> Result<TableInfo, AppError> {
        RequestValidator::table_name(table)?;
        let catalog = self.catalog();
        if !catalog.exists(table).await? {
            return Err(AppError::NotFound(format!("table {}", table)));
        }
        let entity = catalog.describe(table).await?;
        Ok(TableInfo {
            name: entity.table.clone(),
            columns: entity
                .columns
                .iter()
                .map(|c| ColumnSummary {
                    name: c.clone(),
                    data_type: entity.declared_type(c).to_string(),
                })
                .collect(),
            primary_key: entity.primary_key,
        })
    }
}

fn log_query(q: &QueryBuf) {
    tracing::debug!(sql = %q.sql, args = q.params.len(), "query");
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.as_deref());
    }
    query
}

fn decode_row(entity: &TableDescriptor, row: &PgRow) -> GenericRecord {
    let mut record = GenericRecord::new();
    for (name, raw) in row_to_raw(row) {
        let (value, warning) = coerce(raw, entity.declared_type(&name), &name);
        if let Some(w) = warning {
            tracing::warn!(table = %entity.table, "{}", w);
        }
        record.insert(name, value);
    }
    record
}

fn row_to_raw(row: &PgRow) -> Vec<(String, RawValue)> {
    use sqlx::Column;
    use sqlx::Row;
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), cell_to_raw(row, col.ordinal())))
        .collect()
}

fn cell_to_raw(row: &PgRow, i: usize) -> RawValue {
    use sqlx::{Column, Row, TypeInfo};
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map(RawValue::Text).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(i) {
        return v.map(RawValue::Int16).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
        return v.map(RawValue::Int32).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(RawValue::Int64).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(i) {
        return v.map(RawValue::Float32).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v.map(RawValue::Float64).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map(RawValue::Bool).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(i) {
        return v.map(RawValue::Json).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(i) {
        return v.map(|u| RawValue::Other(u.to_string())).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i) {
        return v.map(|d| RawValue::Other(d.to_rfc3339())).unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(i) {
        return v
            .map(|d| RawValue::Other(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(RawValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(i) {
        return v.map(|d| RawValue::Other(d.format("%Y-%m-%d").to_string())).unwrap_or(RawValue::Null);
    }
    let type_name = row.columns()[i].type_info().name().to_string();
    tracing::warn!(column = %row.columns()[i].name(), type_name = %type_name, "no decoder for column type");
    RawValue::Other(format!("<{}>", type_name))
}
