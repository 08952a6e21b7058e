//! Configuration management for the SFTP gateway
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use sftp_lifecycle::LifecycleConfig;
use std::env;

/// Roles and bucket used when running against the in-memory backend
const MOCK_LOGGING_ROLE_ARN: &str = "arn:aws:iam::000000000000:role/sftp-logging";
const MOCK_USER_ROLE_ARN: &str = "arn:aws:iam::000000000000:role/sftp-user";
const MOCK_BUCKET_NAME: &str = "tempsftp-local";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Use the in-memory transfer service instead of AWS
    pub mock_mode: bool,

    /// AWS region of the transfer servers
    pub region: String,

    /// Override for the Transfer Family endpoint
    pub transfer_endpoint: Option<String>,

    /// Override for the Secrets Manager endpoint
    pub secrets_endpoint: Option<String>,

    pub logging_role_arn: Option<String>,
    pub user_role_arn: Option<String>,
    pub bucket_name: Option<String>,

    /// Transfer security policy name
    pub security_policy: String,

    /// Lifetime applied when a request does not carry one
    pub default_lifetime_minutes: i64,

    /// Delete a partially provisioned server when a later step fails
    pub rollback_on_failure: bool,

    /// Delete users explicitly before their server
    pub delete_users_before_server: bool,

    /// Run the periodic sweep inside the gateway
    pub sweep_enabled: bool,

    /// Seconds between sweeps
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config = Config {
            api_host: var("API_HOST", "0.0.0.0"),

            api_port: var("API_PORT", "8090")
                .parse()
                .context("Invalid API_PORT")?,

            mock_mode: var("MOCK_MODE", "true")
                .parse()
                .context("Invalid MOCK_MODE (expected true/false)")?,

            region: var("AWS_REGION", "us-east-1"),
            transfer_endpoint: optional("TRANSFER_ENDPOINT"),
            secrets_endpoint: optional("SECRETS_ENDPOINT"),

            logging_role_arn: optional("SFTP_LOGGING_ROLE_ARN"),
            user_role_arn: optional("SFTP_USER_ROLE_ARN"),
            bucket_name: optional("SFTP_BUCKET_NAME"),

            security_policy: var("SFTP_SECURITY_POLICY", "TransferSecurityPolicy-2022-03"),

            default_lifetime_minutes: var("DEFAULT_LIFETIME_MINUTES", "5")
                .parse()
                .context("Invalid DEFAULT_LIFETIME_MINUTES")?,

            rollback_on_failure: var("ROLLBACK_ON_FAILURE", "false")
                .parse()
                .context("Invalid ROLLBACK_ON_FAILURE (expected true/false)")?,

            delete_users_before_server: var("DELETE_USERS_BEFORE_SERVER", "false")
                .parse()
                .context("Invalid DELETE_USERS_BEFORE_SERVER (expected true/false)")?,

            sweep_enabled: var("SWEEP_ENABLED", "true")
                .parse()
                .context("Invalid SWEEP_ENABLED (expected true/false)")?,

            sweep_interval_secs: var("SWEEP_INTERVAL_SECS", "60")
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.sweep_interval_secs == 0 {
            anyhow::bail!("SWEEP_INTERVAL_SECS must be greater than 0");
        }

        // Against AWS the account-specific values have no usable default
        if !self.mock_mode {
            if self.logging_role_arn.is_none() {
                anyhow::bail!("SFTP_LOGGING_ROLE_ARN is required when MOCK_MODE=false");
            }
            if self.user_role_arn.is_none() {
                anyhow::bail!("SFTP_USER_ROLE_ARN is required when MOCK_MODE=false");
            }
            if self.bucket_name.is_none() {
                anyhow::bail!("SFTP_BUCKET_NAME is required when MOCK_MODE=false");
            }
        }

        self.lifecycle_config()?;

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Build the validated lifecycle configuration
    pub fn lifecycle_config(&self) -> Result<LifecycleConfig> {
        let logging_role = self
            .logging_role_arn
            .as_deref()
            .unwrap_or(MOCK_LOGGING_ROLE_ARN);
        let user_role = self.user_role_arn.as_deref().unwrap_or(MOCK_USER_ROLE_ARN);
        let bucket = self.bucket_name.as_deref().unwrap_or(MOCK_BUCKET_NAME);

        let mut config = LifecycleConfig::new(
            self.region.parse().context("Invalid AWS_REGION")?,
            logging_role.parse().context("Invalid SFTP_LOGGING_ROLE_ARN")?,
            user_role.parse().context("Invalid SFTP_USER_ROLE_ARN")?,
            bucket.parse().context("Invalid SFTP_BUCKET_NAME")?,
        );
        config.security_policy = self
            .security_policy
            .parse()
            .context("Invalid SFTP_SECURITY_POLICY")?;
        config.default_lifetime = TimeDelta::try_minutes(self.default_lifetime_minutes)
            .context("DEFAULT_LIFETIME_MINUTES is out of range")?;
        config.rollback_on_failure = self.rollback_on_failure;
        config.delete_users_before_server = self.delete_users_before_server;

        Ok(config)
    }
}
