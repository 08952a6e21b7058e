//! Wire-independent models for the server provisioning service

use serde::{Deserialize, Serialize};

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A server as returned by list-servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub server_id: String,
    pub arn: String,
}

/// A user as returned by list-users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_name: String,
    pub arn: String,
}

/// Parameters for creating a transient SFTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServerRequest {
    /// Always `PUBLIC`
    pub endpoint_type: String,

    /// Always `SERVICE_MANAGED`
    pub identity_provider_type: String,

    /// IAM role the service uses for CloudWatch logging
    pub logging_role: String,

    /// Always `["SFTP"]`
    pub protocols: Vec<String>,

    pub security_policy_name: String,

    pub tags: Vec<Tag>,
}

/// Parameters for creating a user scoped to one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub server_id: String,
    pub user_name: String,

    /// IAM role granting the user access to the bucket
    pub role: String,

    pub home_directory: String,

    /// Zero or one authorized key
    pub ssh_public_keys: Vec<String>,
}

/// Parameters for narrowing a user's access with a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAccessRequest {
    pub server_id: String,
    pub user_name: String,
    pub home_directory: String,

    /// Always `PATH`
    pub home_directory_type: String,

    /// Serialized policy document
    pub policy: String,
}

/// Payload returned by the secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretValue {
    Text(String),
    Binary(Vec<u8>),
}
