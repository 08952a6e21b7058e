//! Signed AWS JSON 1.1 protocol client shared by the service clients

use chrono::Utc;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tempsftp_common::{partition, ServiceError};
use tracing::debug;

use crate::credentials::AwsCredentials;
use crate::service::ServiceResult;
use crate::sigv4::{self, SignableRequest, SigningParams};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Error body returned by JSON protocol services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Minimal client for one AWS JSON 1.1 service endpoint
#[derive(Debug, Clone)]
pub struct AwsJsonClient {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    region: String,
    signing_name: &'static str,
    target_prefix: &'static str,
    credentials: AwsCredentials,
}

impl AwsJsonClient {
    /// Create a client for `endpoint`.
    ///
    /// `signing_name` is the service name in the credential scope, and
    /// `target_prefix` the `X-Amz-Target` prefix for its operations.
    pub fn new(
        endpoint: Url,
        region: String,
        signing_name: &'static str,
        target_prefix: &'static str,
        credentials: AwsCredentials,
    ) -> Result<Self, tempsftp_common::Error> {
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(tempsftp_common::Error::Config(format!(
                    "Endpoint has no host: {}",
                    endpoint
                )))
            }
        };

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            host,
            region,
            signing_name,
            target_prefix,
            credentials,
        })
    }

    /// Default public endpoint for a service in a region
    pub fn default_endpoint(
        service: &str,
        region: &str,
    ) -> Result<Url, tempsftp_common::Error> {
        let raw = format!(
            "https://{}.{}.{}/",
            service,
            region,
            partition::dns_suffix(region)
        );
        Url::parse(&raw)
            .map_err(|e| tempsftp_common::Error::Config(format!("Invalid endpoint {}: {}", raw, e)))
    }

    /// Invoke an operation and deserialize its response body
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        body: &Value,
    ) -> ServiceResult<T> {
        let bytes = self.send(operation, body).await?;
        let bytes = if bytes.is_empty() { &b"{}"[..] } else { &bytes[..] };

        serde_json::from_slice(bytes).map_err(|e| ServiceError::InvalidResponse {
            operation,
            message: e.to_string(),
        })
    }

    /// Invoke an operation whose response body carries nothing we need
    pub async fn call_unit(&self, operation: &'static str, body: &Value) -> ServiceResult<()> {
        self.send(operation, body).await.map(|_| ())
    }

    async fn send(&self, operation: &'static str, body: &Value) -> ServiceResult<Vec<u8>> {
        let payload = serde_json::to_vec(body).map_err(|e| ServiceError::InvalidResponse {
            operation,
            message: format!("Failed to serialize request: {}", e),
        })?;
        let target = format!("{}.{}", self.target_prefix, operation);

        let signed = sigv4::sign(
            &SignableRequest {
                method: "POST",
                path: self.endpoint.path(),
                headers: &[
                    ("content-type", CONTENT_TYPE),
                    ("host", self.host.as_str()),
                    ("x-amz-target", target.as_str()),
                ],
                payload: &payload,
            },
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: self.signing_name,
                time: Utc::now(),
            },
        );

        debug!("Calling {} at {}", target, self.endpoint);

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &target);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| ServiceError::Transport {
                operation,
                message: e.to_string(),
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Transport {
                operation,
                message: e.to_string(),
            })?
            .to_vec();

        if status.is_success() {
            return Ok(bytes);
        }

        Err(parse_error(operation, status, &bytes))
    }
}

/// Map an error response onto a [`ServiceError`]
fn parse_error(operation: &'static str, status: reqwest::StatusCode, body: &[u8]) -> ServiceError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();

    let code = parsed
        .as_ref()
        .and_then(|b| b.error_type.as_deref())
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    if code == NOT_FOUND_CODE {
        ServiceError::NotFound { operation, message }
    } else {
        ServiceError::Api {
            operation,
            code,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_error_strips_namespace() {
        let body = br#"{"__type":"com.amazonaws.transfer#ThrottlingException","message":"Rate exceeded"}"#;
        let err = parse_error("ListServers", StatusCode::BAD_REQUEST, body);

        assert_eq!(
            err,
            ServiceError::Api {
                operation: "ListServers",
                code: "ThrottlingException".to_string(),
                message: "Rate exceeded".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_error_not_found() {
        let body = br#"{"__type":"ResourceNotFoundException","Message":"Unknown server"}"#;
        let err = parse_error("DeleteServer", StatusCode::BAD_REQUEST, body);

        assert!(err.is_not_found());
        assert!(err.to_string().contains("Unknown server"));
    }

    #[test]
    fn test_parse_error_without_json_body() {
        let err = parse_error("CreateServer", StatusCode::BAD_GATEWAY, b"upstream down");

        assert_eq!(
            err,
            ServiceError::Api {
                operation: "CreateServer",
                code: "HTTP 502".to_string(),
                message: "upstream down".to_string(),
            }
        );
    }

    #[test]
    fn test_host_includes_explicit_port() {
        let client = AwsJsonClient::new(
            Url::parse("http://127.0.0.1:4566/").unwrap(),
            "us-east-1".to_string(),
            "transfer",
            "TransferService",
            AwsCredentials::new("a", "b"),
        )
        .unwrap();
        assert_eq!(client.host, "127.0.0.1:4566");

        let default = AwsJsonClient::new(
            AwsJsonClient::default_endpoint("transfer", "eu-west-1").unwrap(),
            "eu-west-1".to_string(),
            "transfer",
            "TransferService",
            AwsCredentials::new("a", "b"),
        )
        .unwrap();
        assert_eq!(default.host, "transfer.eu-west-1.amazonaws.com");

        let china = AwsJsonClient::default_endpoint("transfer", "cn-north-1").unwrap();
        assert_eq!(china.as_str(), "https://transfer.cn-north-1.amazonaws.com.cn/");
    }
}
