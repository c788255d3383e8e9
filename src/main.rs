// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lectio API Server
//!
//! User accounts and practice texts for the Lectio reading app, backed
//! by Firebase Authentication and Firestore.

use lectio_api::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseTokenVerifier, IdentityClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Lectio API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize identity provider clients
    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new(&config.project_id)
            .expect("Failed to initialize token verifier"),
    );
    let identity = IdentityClient::new(&config).expect("Failed to initialize identity client");

    if let Some(database_url) = &config.database_url {
        tracing::info!(database_url = %database_url, "Provider database URL configured");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        token_verifier,
        identity,
    });

    // Build router
    let app = lectio_api::routes::create_router(state);

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
                .add_directive("lectio_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
