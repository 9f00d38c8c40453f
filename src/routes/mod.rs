// src/routes/mod.rs

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::ingest::IngestError;

pub mod health;
pub mod reports;
pub mod uploads;

/// Structured error body; `row`/`column` identify ingestion failures.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
            row: None,
            column: None,
        }),
    )
}

pub fn ingest_error(err: &IngestError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: err.to_string(),
            row: err.row(),
            column: err.column().map(str::to_string),
        }),
    )
}

// Common error mapper
pub fn internal_error<E: std::fmt::Display>(e: E) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: format!("internal error: {e}"),
            row: None,
            column: None,
        }),
    )
}
