//! Temporary server provisioning

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::Arc;
use tempsftp_common::expiry::{self, CUSTOMER_TAG};
use tempsftp_common::{
    AccessPolicy, AllowedNetworks, CreateServerRequest, CreateUserRequest, Error, Result, Tag,
    TenantId, UpdateAccessRequest,
};
use tracing::{error, info, warn};
use transfer_backend::ProvisioningService;

use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;

const ENDPOINT_TYPE: &str = "PUBLIC";
const IDENTITY_PROVIDER_TYPE: &str = "SERVICE_MANAGED";
const PROTOCOL: &str = "SFTP";
const HOME_DIRECTORY_TYPE: &str = "PATH";

/// A request for a temporary SFTP endpoint
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub customer_id: String,

    /// Authorized key for the user; empty counts as absent
    pub ssh_public_key: Option<String>,

    /// Source networks allowed to connect; empty or absent means any
    pub allowed_networks: Option<Vec<String>>,

    /// Server lifetime; the configured default when absent.
    /// Zero and negative values are accepted and yield an already expired server.
    pub lifetime: Option<TimeDelta>,
}

impl ProvisionRequest {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Default::default()
        }
    }

    /// Lifetime given in whole minutes
    pub fn with_lifetime_minutes(mut self, minutes: i64) -> Result<Self> {
        let lifetime = TimeDelta::try_minutes(minutes).ok_or(Error::InvalidLifetime { minutes })?;
        self.lifetime = Some(lifetime);
        Ok(self)
    }
}

/// Connection coordinates of a provisioned server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedServer {
    pub server_id: String,
    pub hostname: String,
    pub username: String,
    pub customer_id: TenantId,

    /// Same instant as the server's `ExpirationTime` tag
    pub expires_at: DateTime<Utc>,
}

/// Creates servers, users and access policies
pub struct Provisioner {
    service: Arc<dyn ProvisioningService>,
    config: Arc<LifecycleConfig>,
    clock: Arc<dyn Clock>,
}

impl Provisioner {
    pub fn new(service: Arc<dyn ProvisioningService>, config: Arc<LifecycleConfig>) -> Self {
        Self {
            service,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Provision a server and user for one tenant.
    ///
    /// Each step is a single remote call and any failure aborts the rest.
    /// Unless `rollback_on_failure` is set, a server created before the
    /// failure is left in place for the reaper.
    pub async fn provision(&self, request: ProvisionRequest) -> Result<ProvisionedServer> {
        let tenant = TenantId::parse(&request.customer_id)?;
        let networks = AllowedNetworks::parse(request.allowed_networks)?;
        let lifetime = request.lifetime.unwrap_or(self.config.default_lifetime);

        // One clock read feeds both the tag and the returned deadline
        let created_at = expiry::truncate(self.clock.now());
        let expires_at = created_at
            .checked_add_signed(lifetime)
            .ok_or(Error::ExpirationOverflow)?;

        info!(
            "Provisioning server for customer {} (lifetime {}s, expires {})",
            tenant,
            lifetime.num_seconds(),
            expiry::encode(expires_at)
        );

        let server_id = self.create_server(&tenant, expires_at).await?;

        let ssh_public_key = request.ssh_public_key.filter(|key| !key.is_empty());
        let username = match self
            .configure_user(&server_id, &tenant, ssh_public_key, &networks)
            .await
        {
            Ok(username) => username,
            Err(e) => {
                if self.config.rollback_on_failure {
                    self.rollback(&server_id).await;
                } else {
                    warn!(
                        "Provisioning failed after creating server {}; leaving it for expiry",
                        server_id
                    );
                }
                return Err(e);
            }
        };

        Ok(ProvisionedServer {
            hostname: self.config.hostname(&server_id),
            server_id,
            username,
            customer_id: tenant,
            expires_at,
        })
    }

    async fn create_server(&self, tenant: &TenantId, expires_at: DateTime<Utc>) -> Result<String> {
        let request = CreateServerRequest {
            endpoint_type: ENDPOINT_TYPE.to_string(),
            identity_provider_type: IDENTITY_PROVIDER_TYPE.to_string(),
            logging_role: self.config.logging_role_arn.as_str().to_string(),
            protocols: vec![PROTOCOL.to_string()],
            security_policy_name: self.config.security_policy.as_str().to_string(),
            tags: vec![
                Tag::new(CUSTOMER_TAG, tenant.as_str()),
                expiry::expiration_tag(expires_at),
            ],
        };

        let server_id = self.service.create_server(&request).await?;
        info!("Created temporary server: {}", server_id);
        Ok(server_id)
    }

    async fn configure_user(
        &self,
        server_id: &str,
        tenant: &TenantId,
        ssh_public_key: Option<String>,
        networks: &AllowedNetworks,
    ) -> Result<String> {
        let username = tenant.username();
        let home_directory = self.config.home_directory(tenant);

        info!("Creating user {} for server {}", username, server_id);
        self.service
            .create_user(&CreateUserRequest {
                server_id: server_id.to_string(),
                user_name: username.clone(),
                role: self.config.user_role_arn.as_str().to_string(),
                home_directory: home_directory.clone(),
                ssh_public_keys: ssh_public_key.into_iter().collect(),
            })
            .await?;
        info!("User {} created successfully", username);

        if networks.is_empty() {
            return Ok(username);
        }

        info!(
            "Restricting user {} to networks: {:?}",
            username,
            networks.as_slice()
        );
        let policy = AccessPolicy::restrict_to(networks).to_json()?;
        self.service
            .update_access(&UpdateAccessRequest {
                server_id: server_id.to_string(),
                user_name: username.clone(),
                home_directory,
                home_directory_type: HOME_DIRECTORY_TYPE.to_string(),
                policy,
            })
            .await?;
        info!("Policy updated successfully for user {}", username);

        Ok(username)
    }

    /// Best-effort removal of a partially provisioned server
    async fn rollback(&self, server_id: &str) {
        warn!("Rolling back partially provisioned server {}", server_id);

        match self.service.delete_server(server_id).await {
            Ok(()) => info!("Rolled back server {}", server_id),
            Err(e) if e.is_not_found() => info!("Server {} already gone", server_id),
            Err(e) => error!("Failed to roll back server {}: {}", server_id, e),
        }
    }
}
