//! Router assembly.

mod common;
mod items;
pub use common::common_routes_with_ready;
pub use items::item_routes;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::AppState;
use axum::{error_handling::HandleErrorLayer, BoxError, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application: health routes at the root, item routes under `/api/v1`, with
/// request tracing, a per-request timeout and a body size limit.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", item_routes(state))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));
    with_request_timeout(router, config.request_timeout).layer(TraceLayer::new_for_http())
}

/// Drops the handler future once `timeout` elapses and answers with the error envelope.
fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                if err.is::<tower::timeout::error::Elapsed>() {
                    AppError::Timeout(timeout)
                } else {
                    AppError::Internal(err.to_string())
                }
            }))
            .timeout(timeout),
    )
}
