//! vmms-server - vehicle maintenance cost prediction service

use anyhow::{Context, Result};
use maintenance_lib::{health::HealthRegistry, predictor::Predictor};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vmms_server::{api, AppState, ServerConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, level from RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting vmms-server");

    let config = ServerConfig::load()?;
    info!(
        port = config.api_port,
        model_path = %config.model_path.display(),
        database_path = %config.database_path.display(),
        reference_year = config.reference_year,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    let state = AppState::from_config(&config, health_registry.clone())
        .await
        .context("Failed to initialize application state")?;
    let state = Arc::new(state);

    state.logger.log_startup(
        SERVICE_VERSION,
        state.predictor.as_ref().map(|p| p.model_version()),
    );
    health_registry.set_ready(true).await;

    let logger = state.logger.clone();
    api::serve(config.api_port, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
