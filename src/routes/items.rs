//! Item CRUD and table routes. The table is named per request; nothing is registered per table.

use crate::handlers::{create, delete as delete_handler, describe, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn item_routes(state: AppState) -> Router {
    Router::new()
        .route("/items/:table_name", get(list).post(create))
        .route(
            "/items/:table_name/:id",
            get(read).put(update).patch(update).delete(delete_handler),
        )
        .route("/tables/:table_name", get(describe))
        .with_state(state)
}
