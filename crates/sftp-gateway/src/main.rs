//! SFTP Gateway Service
//!
//! Serves the provisioning API and sweeps expired servers in the background.

use anyhow::{Context, Result};
use sftp_gateway::{build_state, create_router, scheduler, transfer_service, Config};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sftp_gateway=debug,sftp_lifecycle=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SFTP Gateway");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  API address: {}", config.api_address());
    info!("  Mock mode: {}", config.mock_mode);
    info!("  Region: {}", config.region);
    info!("  Default lifetime: {} minutes", config.default_lifetime_minutes);
    info!("  Rollback on failure: {}", config.rollback_on_failure);

    let service = transfer_service(&config)?;
    let state = build_state(&config, service)?;
    let reaper = state.reaper.clone();

    let app = create_router(state);

    let api_addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("Failed to bind {}", api_addr))?;
    info!("API server listening on {}", api_addr);

    let api_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {:#}", e);
        }
    });

    let sweep_task = if config.sweep_enabled {
        Some(scheduler::start_sweep_task(
            reaper,
            Duration::from_secs(config.sweep_interval_secs),
        ))
    } else {
        info!("Periodic sweep disabled");
        None
    };
    let sweep = scheduler::join_sweep_task(sweep_task);

    tokio::select! {
        _ = api_task => {
            error!("API task terminated unexpectedly");
        }
        result = sweep => match result {
            Ok(()) => error!("Sweep task terminated unexpectedly"),
            Err(e) => error!("Sweep task failed: {}", e),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down SFTP Gateway");

    Ok(())
}
