// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava Export Dashboard server
//!
//! Serves the activity dashboard, the JSON API and the CSV downloads.

use std::sync::Arc;
use strava_export::{config::Config, services::StravaService, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        api_base = %config.api_base_url,
        athlete_check = config.athlete_check,
        "Starting Strava Export Dashboard"
    );

    let strava = StravaService::new(&config)?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        strava,
    });

    // Build router
    let app = strava_export::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strava_export=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
