//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Non-fatal problem met while coercing a stored value. The original text is kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionWarning {
    #[error("column {column}: cannot parse '{text}' as {target}")]
    Unparseable {
        column: String,
        text: String,
        target: &'static str,
    },
    #[error("column {column}: malformed array literal '{text}'")]
    MalformedArray { column: String, text: String },
    #[error("column {column}: jsonb value is not valid json: {reason}")]
    InvalidJson { column: String, reason: String },
}

/// Which statement a database failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Describe,
    Create,
    Read,
    List,
    Count,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Describe => "describe",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::List => "list",
            Operation::Count => "count",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no updatable columns for table {table}")]
    NoUpdatableColumns { table: String },
    #[error("table '{table}' not found or has no columns")]
    SchemaLookupFailure { table: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("{op} on table {table}: {source}")]
    Database {
        op: Operation,
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Coarse outcome category reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
}

impl AppError {
    /// Wrap a driver error with the operation and table it happened in.
    pub fn database(op: Operation, table: &str, source: sqlx::Error) -> Self {
        AppError::Database {
            op,
            table: table.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) | AppError::SchemaLookupFailure { .. } => ErrorKind::NotFound,
            AppError::InvalidIdentifier(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidId(_)
            | AppError::NoUpdatableColumns { .. }
            | AppError::BadRequest(_)
            | AppError::PayloadTooLarge(_)
            | AppError::UnsupportedMediaType(_) => ErrorKind::InvalidInput,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Timeout(_) | AppError::Unavailable(_) | AppError::Internal(_) => ErrorKind::Internal,
            AppError::Database { source, .. } => classify_sqlx(source),
        }
    }

    /// Short machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidIdentifier(_) => "invalid_identifier",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidId(_) => "invalid_id",
            AppError::NotFound(_) => "not_found",
            AppError::NoUpdatableColumns { .. } => "no_updatable_columns",
            AppError::SchemaLookupFailure { .. } => "table_not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::UnsupportedMediaType(_) => "unsupported_media_type",
            AppError::Timeout(_) => "timeout",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal_error",
            AppError::Database { .. } => match self.kind() {
                ErrorKind::NotFound => "not_found",
                ErrorKind::InvalidInput => "invalid_input",
                ErrorKind::Conflict => "conflict",
                ErrorKind::Internal => "database_error",
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => return StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => return StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => return StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Timeout(_) => return StatusCode::REQUEST_TIMEOUT,
            AppError::Unavailable(_) => return StatusCode::SERVICE_UNAVAILABLE,
            _ => {}
        }
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// SQLSTATE classes: 23505/23503 conflict, 22xxx and 23502 bad input, the rest internal.
fn classify_sqlx(e: &sqlx::Error) -> ErrorKind {
    if let sqlx::Error::RowNotFound = e {
        return ErrorKind::NotFound;
    }
    let Some(code) = e.as_database_error().and_then(|d| d.code()) else {
        return ErrorKind::Internal;
    };
    classify_sqlstate(&code)
}

fn classify_sqlstate(code: &str) -> ErrorKind {
    match code {
        "23505" | "23503" => ErrorKind::Conflict,
        "23502" => ErrorKind::InvalidInput,
        c if c.starts_with("22") => ErrorKind::InvalidInput,
        _ => ErrorKind::Internal,
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_422() {
        for e in [
            AppError::InvalidIdentifier("1abc".into()),
            AppError::InvalidInput("data cannot be empty".into()),
            AppError::InvalidId("0".into()),
            AppError::NoUpdatableColumns { table: "products".into() },
        ] {
            assert_eq!(e.kind(), ErrorKind::InvalidInput);
            assert_eq!(e.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn bad_request_keeps_400() {
        let e = AppError::BadRequest("invalid request body".into());
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.code(), "bad_request");
    }

    #[test]
    fn transport_errors_keep_their_status() {
        let cases = [
            (AppError::PayloadTooLarge("limit".into()), StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            (
                AppError::UnsupportedMediaType("json expected".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
            ),
            (
                AppError::Timeout(std::time::Duration::from_secs(30)),
                StatusCode::REQUEST_TIMEOUT,
                "timeout",
            ),
            (AppError::Unavailable("pool".into()), StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (e, status, code) in cases {
            assert_eq!(e.status(), status);
            assert_eq!(e.code(), code);
        }
    }

    #[test]
    fn missing_table_is_not_found() {
        let e = AppError::SchemaLookupFailure { table: "ghosts".into() };
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "table 'ghosts' not found or has no columns");
    }

    #[test]
    fn database_errors_carry_context() {
        let e = AppError::database(Operation::Update, "products", sqlx::Error::PoolTimedOut);
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert_eq!(e.code(), "database_error");
        assert!(e.to_string().starts_with("update on table products:"));
    }

    #[test]
    fn sqlstate_classification() {
        assert_eq!(classify_sqlstate("23505"), ErrorKind::Conflict);
        assert_eq!(classify_sqlstate("23503"), ErrorKind::Conflict);
        assert_eq!(classify_sqlstate("22P02"), ErrorKind::InvalidInput);
        assert_eq!(classify_sqlstate("23502"), ErrorKind::InvalidInput);
        assert_eq!(classify_sqlstate("42P01"), ErrorKind::Internal);
    }
}
