//! Shared application state for all routes. Holds no table metadata.

use crate::service::CrudService;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub crud: CrudService,
}

impl AppState {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        AppState {
            crud: CrudService::new(pool, schema),
        }
    }
}
