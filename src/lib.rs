//! Gen API: uniform CRUD over arbitrary PostgreSQL tables.
//!
//! Callers name a table per request; the schema is introspected on every call, SQL is
//! built with quoted identifiers and positional parameters, and rows are coerced into a
//! generic value model.

pub mod catalog;
pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod value;

pub use catalog::{ColumnType, SchemaCatalog, TableDescriptor};
pub use config::AppConfig;
pub use error::{AppError, ConfigError, ErrorKind};
pub use routes::{app, common_routes_with_ready, item_routes};
pub use service::{CrudService, ItemFilter, ListPage, ListParams, RequestValidator};
pub use state::AppState;
pub use value::{GenericRecord, GenericValue};
