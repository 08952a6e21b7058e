//! The provisioning service trait

use async_trait::async_trait;
use tempsftp_common::{
    CreateServerRequest, CreateUserRequest, ServerSummary, ServiceError, Tag, UpdateAccessRequest,
    UserSummary,
};

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Operations consumed from the managed server/user provisioning service.
///
/// List operations return the complete result set; implementations follow
/// pagination tokens to the end and fail the whole call if any page fails.
#[async_trait]
pub trait ProvisioningService: Send + Sync {
    /// Create a server and return its identifier
    async fn create_server(&self, request: &CreateServerRequest) -> ServiceResult<String>;

    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<()>;

    /// Attach a policy document to an existing user
    async fn update_access(&self, request: &UpdateAccessRequest) -> ServiceResult<()>;

    async fn list_servers(&self) -> ServiceResult<Vec<ServerSummary>>;

    async fn list_tags_for_resource(&self, arn: &str) -> ServiceResult<Vec<Tag>>;

    async fn list_users(&self, server_id: &str) -> ServiceResult<Vec<UserSummary>>;

    async fn delete_user(&self, server_id: &str, user_name: &str) -> ServiceResult<()>;

    async fn delete_server(&self, server_id: &str) -> ServiceResult<()>;
}
