// src/routes/health.rs

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

use super::{internal_error, ApiError};

#[derive(Serialize)]
pub struct HealthResp {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResp> {
    Json(HealthResp {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct StorageResp {
    pub message: &'static str,
    pub data_dir: String,
}

/// Storage self-check: the data dir must exist and be creatable.
pub async fn index(State(state): State<AppState>) -> Result<Json<StorageResp>, ApiError> {
    std::fs::create_dir_all(state.store.data_dir()).map_err(internal_error)?;
    Ok(Json(StorageResp {
        message: "dir structure is correct",
        data_dir: state.store.data_dir().display().to_string(),
    }))
}
