//! Standard response envelope helpers.

use crate::service::ListPage;
use crate::value::GenericRecord;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ItemResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ItemsListResponse {
    pub success: bool,
    pub data: Vec<GenericRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn success_one<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ItemResponse<T>>) {
    with_status(StatusCode::OK, data, message)
}

pub fn created_one<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ItemResponse<T>>) {
    with_status(StatusCode::CREATED, data, message)
}

fn with_status<T: Serialize>(status: StatusCode, data: T, message: &str) -> (StatusCode, Json<ItemResponse<T>>) {
    (
        status,
        Json(ItemResponse {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }),
    )
}

pub fn success_page(page: ListPage, message: &str) -> (StatusCode, Json<ItemsListResponse>) {
    (
        StatusCode::OK,
        Json(ItemsListResponse {
            success: true,
            data: page.items,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            message: Some(message.to_string()),
        }),
    )
}

/// Success with no payload, e.g. after a delete.
pub fn success_message(message: &str) -> (StatusCode, Json<ItemResponse<()>>) {
    (
        StatusCode::OK,
        Json(ItemResponse {
            success: true,
            data: None,
            message: Some(message.to_string()),
        }),
    )
}
