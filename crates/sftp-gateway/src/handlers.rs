//! API request handlers for the SFTP gateway

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sftp_lifecycle::{ProvisionRequest, Provisioner, Reaper};
use std::sync::Arc;
use tempsftp_common::Error;
use tracing::{error, info};

use crate::models::{
    CleanupResponse, ProvisionServerRequest, ProvisionServerResponse, SuccessResponse,
};

const PROVISION_FAILED: &str = "An error occurred while processing your request";
const CLEANUP_FAILED: &str = "An error occurred during cleanup";

/// Shared application state
pub struct AppState {
    pub provisioner: Provisioner,
    pub reaper: Arc<Reaper>,
}

/// API Error type
///
/// Every failure is reported with the same status; `error` carries the
/// description of whatever went wrong.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
    pub error: String,
}

impl ApiError {
    fn new(message: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "message": self.message,
            "error": self.error
        });

        (self.status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sftp-gateway"
    }))
}

/// Provision a temporary SFTP server
pub async fn provision_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProvisionServerRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<ProvisionServerResponse>>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        error!("Rejected provisioning request: {}", e);
        ApiError::new(PROVISION_FAILED, e.body_text())
    })?;

    let lifetime_minutes = payload
        .lifetime_minutes
        .unwrap_or_else(|| state.provisioner.config().default_lifetime.num_minutes());

    info!(
        "Processing request for customer_id: {:?} with lifetime: {} minutes",
        payload.customer_id, lifetime_minutes
    );

    let server = provision(&state.provisioner, payload)
        .await
        .map_err(|e| {
            error!("Provisioning failed: {}", e);
            ApiError::new(PROVISION_FAILED, e)
        })?;

    info!(
        "Provisioned server {} for customer {}",
        server.server_id, server.customer_id
    );

    Ok(Json(SuccessResponse::new(
        format!("Temporary SFTP server created for {} minutes", lifetime_minutes),
        server.into(),
    )))
}

async fn provision(
    provisioner: &Provisioner,
    payload: ProvisionServerRequest,
) -> tempsftp_common::Result<sftp_lifecycle::ProvisionedServer> {
    let customer_id = payload.customer_id.ok_or(Error::MissingCustomerId)?;

    let mut request = ProvisionRequest::new(customer_id);
    request.ssh_public_key = payload.ssh_public_key;
    request.allowed_networks = payload.allowed_ips;
    if let Some(minutes) = payload.lifetime_minutes {
        request = request.with_lifetime_minutes(minutes)?;
    }

    provisioner.provision(request).await
}

/// Delete every expired server
pub async fn cleanup_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<CleanupResponse>>, ApiError> {
    info!("Cleanup requested");

    let deleted_servers = state.reaper.sweep().await.map_err(|e| {
        error!("An error occurred during cleanup: {}", e);
        ApiError::new(CLEANUP_FAILED, e)
    })?;

    Ok(Json(SuccessResponse::new(
        "Cleanup completed successfully",
        CleanupResponse { deleted_servers },
    )))
}
