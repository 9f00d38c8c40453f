// src/lib.rs

pub mod engine;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: store::Store,
}

pub fn build_router(state: AppState) -> Router {
    // Very permissive CORS for local dev (tighten for prod)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // health & storage self-check
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health))
        // uploads (wholesale table replacement)
        .route("/upload/tickets", post(routes::uploads::upload_tickets))
        .route("/upload/sla", post(routes::uploads::upload_sla))
        // reports
        .route("/reports/assignee_avg", get(routes::reports::assignee_avg))
        .route("/reports/product_avg", get(routes::reports::product_avg))
        .route("/reports/violations", get(routes::reports::violations))
        .route("/reports/reopens", get(routes::reports::reopens))
        .route("/reports/summary", get(routes::reports::summary))
        // state & middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
