// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cropdoc API Server
//!
//! Diagnoses crop diseases from uploaded photos via the Kindwise
//! identification API and keeps a per-user diagnosis history.

use cropdoc::{config::Config, db::FirestoreDb, services::DiseaseLibrary, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Cropdoc API");

    // Initialize database
    let db = FirestoreDb::connect(&config.database).await?;

    let state = Arc::new(AppState::new(config.clone(), db)?);

    // Seed the disease library if a seed file is configured
    if let Some(path) = &config.disease_seed_path {
        tracing::info!(path = %path.display(), "Loading disease library seed");
        let entries = DiseaseLibrary::load_seed_file(path)?;
        state.diseases.seed(entries).await?;
    }

    // Build router
    let app = cropdoc::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cropdoc=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
