//! AWS Transfer Family client

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tempsftp_common::{
    CreateServerRequest, CreateUserRequest, Result, ServerSummary, Tag, UpdateAccessRequest,
    UserSummary,
};
use tracing::{debug, info};

use crate::aws_client::AwsJsonClient;
use crate::credentials::AwsCredentials;
use crate::service::{ProvisioningService, ServiceResult};

const SIGNING_NAME: &str = "transfer";
const TARGET_PREFIX: &str = "TransferService";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateServerResponse {
    server_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedServer {
    arn: String,
    server_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListServersResponse {
    #[serde(default)]
    servers: Vec<ListedServer>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTagsResponse {
    #[serde(default)]
    tags: Vec<Tag>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedUser {
    arn: String,
    user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<ListedUser>,
    next_token: Option<String>,
}

/// Client for the Transfer Family JSON API
#[derive(Debug, Clone)]
pub struct TransferClient {
    client: AwsJsonClient,
}

impl TransferClient {
    /// Create a client for `region`, optionally against a custom endpoint
    pub fn new(region: &str, endpoint: Option<Url>, credentials: AwsCredentials) -> Result<Self> {
        let endpoint = match endpoint {
            Some(url) => url,
            None => AwsJsonClient::default_endpoint(SIGNING_NAME, region)?,
        };

        info!("Transfer client using endpoint {}", endpoint);

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

/// Add `NextToken` to a request body when continuing a listing
fn with_token(mut body: Map<String, Value>, next_token: &Option<String>) -> Value {
    if let Some(token) = next_token {
        body.insert("NextToken".to_string(), Value::String(token.clone()));
    }
    Value::Object(body)
}

/// A pagination token is only meaningful when non-empty
fn continues(next_token: &Option<String>) -> bool {
    next_token.as_deref().is_some_and(|t| !t.is_empty())
}

#[async_trait]
impl ProvisioningService for TransferClient {
    async fn create_server(&self, request: &CreateServerRequest) -> ServiceResult<String> {
        let body = json!({
            "EndpointType": request.endpoint_type,
            "IdentityProviderType": request.identity_provider_type,
            "LoggingRole": request.logging_role,
            "Protocols": request.protocols,
            "SecurityPolicyName": request.security_policy_name,
            "Tags": request.tags,
        });

        let response: CreateServerResponse = self.client.call("CreateServer", &body).await?;
        Ok(response.server_id)
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<()> {
        let mut body = json!({
            "ServerId": request.server_id,
            "UserName": request.user_name,
            "Role": request.role,
            "HomeDirectory": request.home_directory,
        });
        // The API takes a single key body at creation time
        if let Some(key) = request.ssh_public_keys.first() {
            body["SshPublicKeyBody"] = Value::String(key.clone());
        }

        self.client.call_unit("CreateUser", &body).await
    }

    async fn update_access(&self, request: &UpdateAccessRequest) -> ServiceResult<()> {
        let body = json!({
            "ServerId": request.server_id,
            "UserName": request.user_name,
            "HomeDirectory": request.home_directory,
            "HomeDirectoryType": request.home_directory_type,
            "Policy": request.policy,
        });

        self.client.call_unit("UpdateUser", &body).await
    }

    async fn list_servers(&self) -> ServiceResult<Vec<ServerSummary>> {
        let mut servers = Vec::new();
        let mut next_token = None;

        loop {
            let mut body = Map::new();
            body.insert("MaxResults".to_string(), json!(1000));
            let page: ListServersResponse = self
                .client
                .call("ListServers", &with_token(body, &next_token))
                .await?;

            servers.extend(page.servers.into_iter().map(|s| ServerSummary {
                server_id: s.server_id,
                arn: s.arn,
            }));

            if !continues(&page.next_token) {
                break;
            }
            next_token = page.next_token;
        }

        debug!("Listed {} servers", servers.len());
        Ok(servers)
    }

    async fn list_tags_for_resource(&self, arn: &str) -> ServiceResult<Vec<Tag>> {
        let mut tags = Vec::new();
        let mut next_token = None;

        loop {
            let mut body = Map::new();
            body.insert("Arn".to_string(), json!(arn));
            let page: ListTagsResponse = self
                .client
                .call("ListTagsForResource", &with_token(body, &next_token))
                .await?;

            tags.extend(page.tags);

            if !continues(&page.next_token) {
                break;
            }
            next_token = page.next_token;
        }

        Ok(tags)
    }

    async fn list_users(&self, server_id: &str) -> ServiceResult<Vec<UserSummary>> {
        let mut users = Vec::new();
        let mut next_token = None;

        loop {
            let mut body = Map::new();
            body.insert("ServerId".to_string(), json!(server_id));
            let page: ListUsersResponse = self
                .client
                .call("ListUsers", &with_token(body, &next_token))
                .await?;

            users.extend(page.users.into_iter().map(|u| UserSummary {
                user_name: u.user_name,
                arn: u.arn,
            }));

            if !continues(&page.next_token) {
                break;
            }
            next_token = page.next_token;
        }

        Ok(users)
    }

    async fn delete_user(&self, server_id: &str, user_name: &str) -> ServiceResult<()> {
        let body = json!({ "ServerId": server_id, "UserName": user_name });
        self.client.call_unit("DeleteUser", &body).await
    }

    async fn delete_server(&self, server_id: &str) -> ServiceResult<()> {
        let body = json!({ "ServerId": server_id });
        self.client.call_unit("DeleteServer", &body).await
    }
}
