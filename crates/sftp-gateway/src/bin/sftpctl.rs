//! Temporary SFTP server utility
//!
//! Commands:
//! - provision: Create a server and user for one customer
//! - sweep: Delete every expired server once
//! - get-secret: Read a secret from Secrets Manager
//!
//! Uses the same environment configuration as the gateway.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Parser, Subcommand};
use reqwest::Url;
use serde_json::json;
use sftp_gateway::{build_state, models::ProvisionServerResponse, transfer_service, Config};
use sftp_lifecycle::ProvisionRequest;
use tempsftp_common::SecretValue;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transfer_backend::{AwsCredentials, SecretStore, SecretsManagerClient};

#[derive(Parser)]
#[command(name = "sftpctl")]
#[command(about = "Provision and clean up temporary SFTP servers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a temporary server for a customer
    Provision {
        #[arg(long)]
        customer_id: String,

        /// OpenSSH public key for the customer's user
        #[arg(long)]
        ssh_public_key: Option<String>,

        /// Source network allowed to connect (repeatable)
        #[arg(long = "allowed-ip")]
        allowed_ips: Vec<String>,

        /// Server lifetime; the configured default when omitted
        #[arg(long, allow_negative_numbers = true)]
        lifetime_minutes: Option<i64>,
    },

    /// Delete every server whose expiration time has passed
    Sweep,

    /// Print a secret from Secrets Manager
    GetSecret {
        /// Secret name or ARN
        secret_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Provision {
            customer_id,
            ssh_public_key,
            allowed_ips,
            lifetime_minutes,
        } => {
            let mut request = ProvisionRequest::new(customer_id);
            request.ssh_public_key = ssh_public_key;
            request.allowed_networks = Some(allowed_ips);
            if let Some(minutes) = lifetime_minutes {
                request = request.with_lifetime_minutes(minutes)?;
            }
            provision(&config, request).await?
        }
        Commands::Sweep => sweep(&config).await?,
        Commands::GetSecret { secret_id } => get_secret(&config, &secret_id).await?,
    }

    Ok(())
}

async fn provision(config: &Config, request: ProvisionRequest) -> Result<()> {
    warn_if_mock(config);
    let state = build_state(config, transfer_service(config)?)?;

    let server = state
        .provisioner
        .provision(request)
        .await
        .context("Provisioning failed")?;

    print_json(&ProvisionServerResponse::from(server))
}

async fn sweep(config: &Config) -> Result<()> {
    warn_if_mock(config);
    let state = build_state(config, transfer_service(config)?)?;

    let deleted_servers = state.reaper.sweep().await.context("Cleanup failed")?;

    print_json(&json!({ "deleted_servers": deleted_servers }))
}

async fn get_secret(config: &Config, secret_id: &str) -> Result<()> {
    let endpoint = config
        .secrets_endpoint
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid SECRETS_ENDPOINT")?;
    let client = SecretsManagerClient::new(&config.region, endpoint, AwsCredentials::from_env()?)?;

    let body = match client.get_secret(secret_id).await? {
        SecretValue::Text(value) => json!({ "secret_id": secret_id, "secret_string": value }),
        SecretValue::Binary(bytes) => {
            json!({ "secret_id": secret_id, "secret_binary": STANDARD.encode(bytes) })
        }
    };

    print_json(&body)
}

fn warn_if_mock(config: &Config) {
    if config.mock_mode {
        warn!("MOCK_MODE is enabled; changes are made to a process-local backend only");
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
