// src/main.rs

use std::env;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sla_analytics_api::{build_router, store::Store, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Open the snapshot store (reloads persisted tables)
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "/data".into());
    let store = Store::open(PathBuf::from(data_dir))?;
    tracing::info!(data_dir = %store.data_dir().display(), "snapshot store ready");

    let app = build_router(AppState { store });

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080); // default 8080

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API listening");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
