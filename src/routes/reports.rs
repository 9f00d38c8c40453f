// src/routes/reports.rs

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::engine::{self, reports};
use crate::store::{ThresholdTable, TicketTable};
use crate::AppState;

use super::{bad_request, ApiError};

/// Every report is a pure function of one consistent snapshot pair; the
/// only data-dependent failure is the pair not existing yet.
fn snapshot_or_400(state: &AppState) -> Result<(Arc<TicketTable>, Arc<ThresholdTable>), ApiError> {
    state
        .store
        .snapshot()
        .ok_or_else(|| bad_request("Upload both tickets CSV and SLA CSV first."))
}

pub async fn assignee_avg(
    State(state): State<AppState>,
) -> Result<Json<Vec<reports::AssigneeAverage>>, ApiError> {
    let (tickets, thresholds) = snapshot_or_400(&state)?;
    let enriched = engine::enrich_all(&tickets.rows, &thresholds.rows);
    Ok(Json(reports::assignee_averages(&enriched)))
}

pub async fn product_avg(
    State(state): State<AppState>,
) -> Result<Json<Vec<reports::ProductAverage>>, ApiError> {
    let (tickets, thresholds) = snapshot_or_400(&state)?;
    let enriched = engine::enrich_all(&tickets.rows, &thresholds.rows);
    Ok(Json(reports::product_averages(&enriched)))
}

pub async fn violations(
    State(state): State<AppState>,
) -> Result<Json<Vec<reports::ViolationRow>>, ApiError> {
    let (tickets, thresholds) = snapshot_or_400(&state)?;
    let enriched = engine::enrich_all(&tickets.rows, &thresholds.rows);
    Ok(Json(reports::violations(&enriched)))
}

pub async fn reopens(
    State(state): State<AppState>,
) -> Result<Json<Vec<reports::ReopenRow>>, ApiError> {
    let (tickets, thresholds) = snapshot_or_400(&state)?;
    let enriched = engine::enrich_all(&tickets.rows, &thresholds.rows);
    Ok(Json(reports::reopen_heavy(&enriched)))
}

pub async fn summary(State(state): State<AppState>) -> Result<Json<reports::Summary>, ApiError> {
    let (tickets, thresholds) = snapshot_or_400(&state)?;
    let enriched = engine::enrich_all(&tickets.rows, &thresholds.rows);
    Ok(Json(reports::summary(&enriched)))
}
