//! Item CRUD handlers: create, read, list, update, delete on any table.

use crate::error::AppError;
use crate::extractors::ListQuery;
use crate::response::{created_one, success_message, success_one, success_page};
use crate::service::ListPage;
use crate::state::AppState;
use crate::value::GenericRecord;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub data: Vec<GenericRecord>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub data: GenericRecord,
}

fn path_value<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    path.map(|Path(v)| v).map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Syntax and shape errors are 400; size and content-type rejections keep their own status.
fn body_value<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v).map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(e.body_text()),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::UnsupportedMediaType(e.body_text()),
        _ => AppError::BadRequest(format!("invalid request body: {}", e.body_text())),
    })
}

pub async fn create(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let table_name = path_value(path)?;
    let req = body_value(body)?;
    let mut items = state.crud.create(&table_name, &req.data).await?;
    if items.len() == 1 {
        let item = items.remove(0);
        return Ok(created_one(item, "Item created successfully").into_response());
    }
    let n = items.len() as i64;
    let page = ListPage {
        items,
        total: n,
        limit: n,
        offset: 0,
    };
    Ok(success_page(page, &format!("{} items created successfully", n)).into_response())
}

pub async fn read(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (table_name, id) = path_value(path)?;
    let item = state.crud.read(&table_name, &id).await?;
    Ok(success_one(item, "Item retrieved successfully"))
}

pub async fn list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    ListQuery(params): ListQuery,
) -> Result<impl IntoResponse, AppError> {
    let table_name = path_value(path)?;
    let page = state.crud.list(&table_name, params).await?;
    Ok(success_page(page, "Items retrieved successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (table_name, id) = path_value(path)?;
    let req = body_value(body)?;
    let item = state.crud.update(&table_name, &id, &req.data).await?;
    Ok(success_one(item, "Item updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (table_name, id) = path_value(path)?;
    state.crud.delete(&table_name, &id).await?;
    Ok(success_message("Item deleted successfully"))
}
