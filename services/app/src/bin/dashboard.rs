//! services/app/src/bin/dashboard.rs
//!
//! Prints the current user's dashboard snapshot as JSON.

use app_lib::{config::Config, error::AppError, state::AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(data_dir = %config.data_dir.display(), "Configuration loaded.");

    // --- 2. Build the Shared AppState ---
    let state = AppState::from_config(config).await?;
    let session = state.session();

    // --- 3. Pull the Snapshot ---
    let snapshot = session.dashboard().await.map_err(|e| {
        error!("Failed to build the dashboard: {e}");
        e
    })?;
    if snapshot.progress.is_none() {
        info!("Nobody is signed in; showing the legacy documents.");
    }
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
