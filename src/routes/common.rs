//! Service routes outside `/api/v1`: liveness, readiness and build info.

use crate::error::AppError;
use crate::response::{success_message, success_one};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::Serialize;

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
}

/// Liveness only; never touches the database.
async fn health() -> impl IntoResponse {
    success_message("Service is healthy")
}

/// 503 with the error envelope until the pool reaches the database and the schema exists.
async fn ready(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.crud.ping().await.inspect_err(|e| {
        tracing::warn!(error = %e, "readiness check failed");
    })?;
    Ok(success_message("Service is ready"))
}

async fn version() -> impl IntoResponse {
    let info = BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    success_one(info, "Build information")
}

pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
