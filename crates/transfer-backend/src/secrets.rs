//! Secret retrieval
//!
//! Failures from the secret store are surfaced to the caller unchanged.

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tempsftp_common::{Result, SecretValue, ServiceError};
use tracing::debug;

use crate::aws_client::AwsJsonClient;
use crate::credentials::AwsCredentials;
use crate::service::ServiceResult;

const SIGNING_NAME: &str = "secretsmanager";
const TARGET_PREFIX: &str = "secretsmanager";

/// Source of named secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret by name or ARN
    async fn get_secret(&self, secret_id: &str) -> ServiceResult<SecretValue>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueResponse {
    secret_string: Option<String>,
    secret_binary: Option<String>,
}

/// Client for AWS Secrets Manager
#[derive(Debug, Clone)]
pub struct SecretsManagerClient {
    client: AwsJsonClient,
}

impl SecretsManagerClient {
    pub fn new(region: &str, endpoint: Option<Url>, credentials: AwsCredentials) -> Result<Self> {
        let endpoint = match endpoint {
            Some(url) => url,
            None => AwsJsonClient::default_endpoint(SIGNING_NAME, region)?,
        };

        Ok(Self {
            client: AwsJsonClient::new(
                endpoint,
                region.to_string(),
                SIGNING_NAME,
                TARGET_PREFIX,
                credentials,
            )?,
        })
    }
}

#[async_trait]
impl SecretStore for SecretsManagerClient {
    async fn get_secret(&self, secret_id: &str) -> ServiceResult<SecretValue> {
        const OPERATION: &str = "GetSecretValue";

        debug!("Fetching secret {}", secret_id);

        let response: GetSecretValueResponse = self
            .client
            .call(OPERATION, &json!({ "SecretId": secret_id }))
            .await?;

        // A text payload wins when both are present
        if let Some(text) = response.secret_string {
            return Ok(SecretValue::Text(text));
        }

        match response.secret_binary {
            Some(encoded) => BASE64_STANDARD
                .decode(encoded.as_bytes())
                .map(SecretValue::Binary)
                .map_err(|e| ServiceError::InvalidResponse {
                    operation: OPERATION,
                    message: format!("SecretBinary is not valid base64: {}", e),
                }),
            None => Err(ServiceError::InvalidResponse {
                operation: OPERATION,
                message: "Response carries neither SecretString nor SecretBinary".to_string(),
            }),
        }
    }
}
