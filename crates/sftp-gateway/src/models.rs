//! Request and response bodies of the gateway API

use serde::{Deserialize, Serialize};
use sftp_lifecycle::ProvisionedServer;
use tempsftp_common::expiry;

/// Request to provision a temporary SFTP server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionServerRequest {
    /// Required; kept optional here so a missing value is reported like any other failure
    pub customer_id: Option<String>,
    pub ssh_public_key: Option<String>,
    pub allowed_ips: Option<Vec<String>>,
    pub lifetime_minutes: Option<i64>,
}

/// Connection details of a provisioned server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionServerResponse {
    pub sftp_hostname: String,
    pub sftp_username: String,
    pub customer_id: String,
    /// UTC, `%Y-%m-%dT%H:%M:%S`; identical to the server's `ExpirationTime` tag
    pub expiration_time: String,
}

impl From<ProvisionedServer> for ProvisionServerResponse {
    fn from(server: ProvisionedServer) -> Self {
        Self {
            sftp_hostname: server.hostname,
            sftp_username: server.username,
            customer_id: server.customer_id.to_string(),
            expiration_time: expiry::encode(server.expires_at),
        }
    }
}

/// Result of a cleanup sweep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupResponse {
    pub deleted_servers: Vec<String>,
}

/// Success envelope: `{"status": "success", "message": ..., <payload>}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}
