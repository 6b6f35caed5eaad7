// SPDX-License-Identifier: MIT

//! Taskboard API Server
//!
//! Syncs tasks from Asana into Firestore, scores them against the
//! category point table, and serves aggregated team-performance views.

use std::sync::Arc;

use taskboard::{config::Config, db::Db, services::SyncService, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Taskboard API");

    if config.asana_access_token.is_none() || config.asana_project_id.is_none() {
        tracing::warn!("Asana credentials not configured; sync requests will fail");
    }

    // Initialize Firestore database
    let db = Db::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let sync_service = SyncService::new(db.clone(), config.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sync_service,
        sync_lock: tokio::sync::Mutex::new(()),
    });

    // Build router
    let app = taskboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskboard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
