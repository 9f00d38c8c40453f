// src/routes/uploads.rs

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::{ThresholdTable, TicketTable};
use crate::{ingest, AppState};

use super::{bad_request, ingest_error, internal_error, ApiError};

#[derive(Serialize)]
pub struct UploadReceipt {
    pub rows_stored: usize,
    pub upload_id: Uuid,
    pub sha256: String,
    pub warnings: Vec<String>,
}

pub async fn upload_tickets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let bytes = read_csv_part(&mut multipart).await?;
    let sha256 = content_hash(&bytes);

    let batch = ingest::ingest_tickets(&bytes).map_err(|e| ingest_error(&e))?;
    for warning in &batch.warnings {
        tracing::warn!(upload = "tickets", %warning);
    }

    let table = TicketTable {
        upload_id: Uuid::new_v4(),
        uploaded_at: Utc::now(),
        rows: batch.tickets,
    };
    let stored = state.store.replace_tickets(table).map_err(internal_error)?;
    tracing::info!(upload_id = %stored.upload_id, rows = stored.rows.len(), "ticket table replaced");

    Ok(Json(UploadReceipt {
        rows_stored: stored.rows.len(),
        upload_id: stored.upload_id,
        sha256,
        warnings: batch.warnings,
    }))
}

pub async fn upload_sla(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let bytes = read_csv_part(&mut multipart).await?;
    let sha256 = content_hash(&bytes);

    let batch = ingest::ingest_thresholds(&bytes).map_err(|e| ingest_error(&e))?;
    for warning in &batch.warnings {
        tracing::warn!(upload = "sla", %warning);
    }

    let table = ThresholdTable {
        upload_id: Uuid::new_v4(),
        uploaded_at: Utc::now(),
        rows: batch.thresholds,
    };
    let stored = state
        .store
        .replace_thresholds(table)
        .map_err(internal_error)?;
    tracing::info!(upload_id = %stored.upload_id, rows = stored.rows.len(), "threshold table replaced");

    Ok(Json(UploadReceipt {
        rows_stored: stored.rows.len(),
        upload_id: stored.upload_id,
        sha256,
        warnings: batch.warnings,
    }))
}

/// First multipart part carrying a filename; must be a .csv.
async fn read_csv_part(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(bad_request("Only CSV supported"));
        }
        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
        return Ok(bytes.to_vec());
    }
    Err(bad_request("multipart upload must contain a CSV file part"))
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
