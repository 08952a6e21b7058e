//! Expired server sweeping

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempsftp_common::expiry::{self, EXPIRATION_TAG};
use tempsftp_common::{Result, ServerSummary};
use tracing::{debug, info, warn};
use transfer_backend::ProvisioningService;

use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;

/// Deletes servers whose `ExpirationTime` has been reached
pub struct Reaper {
    service: Arc<dyn ProvisioningService>,
    config: Arc<LifecycleConfig>,
    clock: Arc<dyn Clock>,
}

impl Reaper {
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

    /// Run one sweep and return the ids of the servers it deleted, in scan order.
    ///
    /// Servers without a parseable `ExpirationTime` tag are never deleted.
    /// A failing list, tag read or delete aborts the sweep; deletions already
    /// made stay made and the rest is left for the next sweep.
    pub async fn sweep(&self) -> Result<Vec<String>> {
        info!("Starting cleanup of expired servers");

        let servers = self.service.list_servers().await?;
        let now = self.clock.now();
        debug!(
            "Checking {} servers against {}",
            servers.len(),
            expiry::encode(now)
        );

        let mut deleted = Vec::new();
        for server in &servers {
            if self.reap(server, now).await? {
                deleted.push(server.server_id.clone());
            }
        }

        info!("Cleanup completed. Deleted servers: {:?}", deleted);
        Ok(deleted)
    }

    /// Delete one server if expired. Returns whether this call deleted it.
    async fn reap(&self, server: &ServerSummary, now: DateTime<Utc>) -> Result<bool> {
        let tags = match self.service.list_tags_for_resource(&server.arn).await {
            Ok(tags) => tags,
            Err(e) if e.is_not_found() => {
                debug!("Server {} disappeared before its tags were read", server.server_id);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let expires_at = match expiry::find_expiration(&tags) {
            Some(expires_at) => expires_at,
            None => {
                if let Some(tag) = tags.iter().find(|t| t.key == EXPIRATION_TAG) {
                    warn!(
                        "Server {} has unparseable {} tag {:?}; skipping",
                        server.server_id, EXPIRATION_TAG, tag.value
                    );
                } else {
                    debug!("Server {} has no expiration tag", server.server_id);
                }
                return Ok(false);
            }
        };

        if !expiry::is_expired(expires_at, now) {
            debug!(
                "Server {} expires at {}",
                server.server_id,
                expiry::encode(expires_at)
            );
            return Ok(false);
        }

        if self.config.delete_users_before_server {
            self.delete_users(&server.server_id).await?;
        }

        info!("Deleting expired server: {}", server.server_id);
        match self.service.delete_server(&server.server_id).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                info!("Server {} was already deleted", server.server_id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_users(&self, server_id: &str) -> Result<()> {
        let users = match self.service.list_users(server_id).await {
            Ok(users) => users,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for user in users {
            info!("Deleting user {} of server {}", user.user_name, server_id);
            match self.service.delete_user(server_id, &user.user_name).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("User {} was already deleted", user.user_name)
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}
