//! Table structure handler.

use crate::error::AppError;
use crate::response::success_one;
use crate::state::AppState;
use axum::extract::{rejection::PathRejection, Path, State};
use axum::response::IntoResponse;

pub async fn describe(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(table_name) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let info = state.crud.describe(&table_name).await?;
    Ok(success_one(info, "Table retrieved successfully"))
}
