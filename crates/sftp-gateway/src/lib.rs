//! SFTP Gateway
//!
//! HTTP front end for the temporary SFTP server lifecycle. Exposes the
//! provisioning and cleanup triggers and runs the periodic sweep.

pub mod config;
pub mod handlers;
pub mod models;
pub mod scheduler;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Url;
use sftp_lifecycle::{Provisioner, Reaper};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use transfer_backend::{AwsCredentials, InMemoryTransfer, ProvisioningService, TransferClient};

pub use config::Config;
pub use handlers::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/servers", post(handlers::provision_handler))
        .route("/api/cleanup", post(handlers::cleanup_handler))
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Connect to the transfer service selected by the configuration
pub fn transfer_service(config: &Config) -> Result<Arc<dyn ProvisioningService>> {
    if config.mock_mode {
        info!("Using in-memory transfer service");
        return Ok(Arc::new(InMemoryTransfer::new(config.region.clone())));
    }

    let endpoint = config
        .transfer_endpoint
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid TRANSFER_ENDPOINT")?;
    let credentials = AwsCredentials::from_env()?;
    let client = TransferClient::new(&config.region, endpoint, credentials)?;

    info!("Using AWS Transfer Family in {}", config.region);
    Ok(Arc::new(client))
}

/// Build the shared state from a configuration and a connected service
pub fn build_state(config: &Config, service: Arc<dyn ProvisioningService>) -> Result<AppState> {
    let lifecycle = Arc::new(config.lifecycle_config()?);

    Ok(AppState {
        provisioner: Provisioner::new(service.clone(), lifecycle.clone()),
        reaper: Arc::new(Reaper::new(service, lifecycle)),
    })
}
