//! Online-learning model server
//!
//! Hosts a single active model, serves predictions, and updates the model
//! incrementally from ground-truth feedback over an HTTP API.

use anyhow::Result;
use model_server::{api, config};
use server_lib::{
    health::{components, ComponentHealth},
    Engine, HealthRegistry, ServerMetrics,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = %SERVER_VERSION, "Starting model-server");

    // Load configuration
    let config = config::ServerConfig::load()?;

    // Initialize health registry
    let health = HealthRegistry::new();
    health.register(components::STORE).await;
    health.register(components::HTTP).await;
    health
        .update(components::MODEL, ComponentHealth::degraded("No active model."))
        .await;

    // Initialize metrics and the engine
    let metrics = ServerMetrics::new();
    let engine = Engine::new();

    // Optionally configure a flavor at boot
    if let Some(flavor) = &config.flavor {
        let flavor = engine.init(flavor).await?;
        info!(flavor = %flavor, "Flavor configured from environment");
    }

    // Create shared application state
    let state = Arc::new(api::AppState::new(engine, health.clone(), metrics));

    // Mark server as ready after initialization
    health.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn({
        let state = state.clone();
        let bind_addr = config.bind_addr.clone();
        async move { api::serve(&bind_addr, config.port, state).await }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down");
        }
        result = api_handle => {
            result??;
        }
    }

    Ok(())
}
