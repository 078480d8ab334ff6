//! CrudService: generic CRUD over any table, driven by the schema catalog.

mod crud;
mod validation;
pub use crud::{ColumnSummary, CrudService, ListPage, TableInfo};
pub use validation::*;
