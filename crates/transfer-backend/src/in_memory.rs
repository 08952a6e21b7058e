//! In-memory provisioning service for development and testing
//!
//! Simulates the managed transfer service without any network access.
//! Every call is recorded in order, and failures can be injected per
//! operation (optionally per target resource).

use async_trait::async_trait;
use tempsftp_common::{
    CreateServerRequest, CreateUserRequest, ServerSummary, ServiceError, Tag, UpdateAccessRequest,
    UserSummary,
};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::service::{ProvisioningService, ServiceResult};

/// Account id used in generated ARNs
const ACCOUNT_ID: &str = "000000000000";

/// Remote operations, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateServer,
    CreateUser,
    UpdateAccess,
    ListServers,
    ListTagsForResource,
    ListUsers,
    DeleteUser,
    DeleteServer,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::CreateServer => "CreateServer",
            Operation::CreateUser => "CreateUser",
            Operation::UpdateAccess => "UpdateAccess",
            Operation::ListServers => "ListServers",
            Operation::ListTagsForResource => "ListTagsForResource",
            Operation::ListUsers => "ListUsers",
            Operation::DeleteUser => "DeleteUser",
            Operation::DeleteServer => "DeleteServer",
        }
    }
}

/// A call received by the in-memory service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CreateServer(CreateServerRequest),
    CreateUser(CreateUserRequest),
    UpdateAccess(UpdateAccessRequest),
    ListServers,
    ListTagsForResource { arn: String },
    ListUsers { server_id: String },
    DeleteUser { server_id: String, user_name: String },
    DeleteServer { server_id: String },
}

impl RecordedCall {
    pub fn operation(&self) -> Operation {
        match self {
            RecordedCall::CreateServer(_) => Operation::CreateServer,
            RecordedCall::CreateUser(_) => Operation::CreateUser,
            RecordedCall::UpdateAccess(_) => Operation::UpdateAccess,
            RecordedCall::ListServers => Operation::ListServers,
            RecordedCall::ListTagsForResource { .. } => Operation::ListTagsForResource,
            RecordedCall::ListUsers { .. } => Operation::ListUsers,
            RecordedCall::DeleteUser { .. } => Operation::DeleteUser,
            RecordedCall::DeleteServer { .. } => Operation::DeleteServer,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredServer {
    summary: ServerSummary,
    tags: Vec<Tag>,
    users: Vec<CreateUserRequest>,
    policies: Vec<UpdateAccessRequest>,
}

#[derive(Debug)]
struct InjectedFailure {
    operation: Operation,
    /// Server id or ARN; `None` matches every call of the operation
    target: Option<String>,
    error: ServiceError,
}

#[derive(Debug, Default)]
struct State {
    servers: Vec<StoredServer>,
    calls: Vec<RecordedCall>,
    failures: Vec<InjectedFailure>,
}

impl State {
    fn check(&self, operation: Operation, target: Option<&str>) -> ServiceResult<()> {
        let failure = self.failures.iter().find(|f| {
            f.operation == operation
                && match (&f.target, target) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        });

        match failure {
            Some(f) => Err(f.error.clone()),
            None => Ok(()),
        }
    }

    fn server_mut(&mut self, operation: Operation, server_id: &str) -> ServiceResult<&mut StoredServer> {
        self.servers
            .iter_mut()
            .find(|s| s.summary.server_id == server_id)
            .ok_or_else(|| not_found(operation, format!("Unknown server: {}", server_id)))
    }
}

fn not_found(operation: Operation, message: String) -> ServiceError {
    ServiceError::NotFound {
        operation: operation.name(),
        message,
    }
}

/// Process-local provisioning service
#[derive(Debug)]
pub struct InMemoryTransfer {
    region: String,
    state: Mutex<State>,
}

impl InMemoryTransfer {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn new_summary(&self) -> ServerSummary {
        let simple = Uuid::new_v4().simple().to_string();
        let server_id = format!("s-{}", &simple[..17]);
        let arn = format!(
            "arn:aws:transfer:{}:{}:server/{}",
            self.region, ACCOUNT_ID, server_id
        );
        ServerSummary { server_id, arn }
    }

    /// Seed a server directly, bypassing call recording
    pub async fn insert_server(&self, tags: Vec<Tag>) -> ServerSummary {
        let summary = self.new_summary();
        self.state.lock().await.servers.push(StoredServer {
            summary: summary.clone(),
            tags,
            users: Vec::new(),
            policies: Vec::new(),
        });
        summary
    }

    /// Fail every call of `operation` with `error`
    pub async fn fail_on(&self, operation: Operation, error: ServiceError) {
        self.state.lock().await.failures.push(InjectedFailure {
            operation,
            target: None,
            error,
        });
    }

    /// Fail calls of `operation` addressed to `target` (server id or ARN)
    pub async fn fail_on_target(
        &self,
        operation: Operation,
        target: impl Into<String>,
        error: ServiceError,
    ) {
        self.state.lock().await.failures.push(InjectedFailure {
            operation,
            target: Some(target.into()),
            error,
        });
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Calls received so far, in order
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of recorded calls of one operation
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Identifiers of live servers, in creation order
    pub async fn server_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .servers
            .iter()
            .map(|s| s.summary.server_id.clone())
            .collect()
    }

    pub async fn tags_for(&self, server_id: &str) -> Option<Vec<Tag>> {
        self.state
            .lock()
            .await
            .servers
            .iter()
            .find(|s| s.summary.server_id == server_id)
            .map(|s| s.tags.clone())
    }

    pub async fn users_for(&self, server_id: &str) -> Option<Vec<CreateUserRequest>> {
        self.state
            .lock()
            .await
            .servers
            .iter()
            .find(|s| s.summary.server_id == server_id)
            .map(|s| s.users.clone())
    }

    pub async fn policies_for(&self, server_id: &str) -> Option<Vec<UpdateAccessRequest>> {
        self.state
            .lock()
            .await
            .servers
            .iter()
            .find(|s| s.summary.server_id == server_id)
            .map(|s| s.policies.clone())
    }
}

#[async_trait]
impl ProvisioningService for InMemoryTransfer {
    async fn create_server(&self, request: &CreateServerRequest) -> ServiceResult<String> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::CreateServer(request.clone()));
        state.check(Operation::CreateServer, None)?;

        let summary = self.new_summary();
        let server_id = summary.server_id.clone();
        state.servers.push(StoredServer {
            summary,
            tags: request.tags.clone(),
            users: Vec::new(),
            policies: Vec::new(),
        });

        debug!("In-memory transfer: created server {}", server_id);
        Ok(server_id)
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::CreateUser(request.clone()));
        state.check(Operation::CreateUser, Some(&request.server_id))?;

        let server = state.server_mut(Operation::CreateUser, &request.server_id)?;
        if server.users.iter().any(|u| u.user_name == request.user_name) {
            return Err(ServiceError::Api {
                operation: Operation::CreateUser.name(),
                code: "ResourceExistsException".to_string(),
                message: format!("User already exists: {}", request.user_name),
            });
        }
        server.users.push(request.clone());
        Ok(())
    }

    async fn update_access(&self, request: &UpdateAccessRequest) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::UpdateAccess(request.clone()));
        state.check(Operation::UpdateAccess, Some(&request.server_id))?;

        let server = state.server_mut(Operation::UpdateAccess, &request.server_id)?;
        if !server.users.iter().any(|u| u.user_name == request.user_name) {
            return Err(not_found(
                Operation::UpdateAccess,
                format!("Unknown user: {}", request.user_name),
            ));
        }
        server.policies.push(request.clone());
        Ok(())
    }

    async fn list_servers(&self) -> ServiceResult<Vec<ServerSummary>> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::ListServers);
        state.check(Operation::ListServers, None)?;

        Ok(state.servers.iter().map(|s| s.summary.clone()).collect())
    }

    async fn list_tags_for_resource(&self, arn: &str) -> ServiceResult<Vec<Tag>> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::ListTagsForResource {
            arn: arn.to_string(),
        });
        state.check(Operation::ListTagsForResource, Some(arn))?;

        state
            .servers
            .iter()
            .find(|s| s.summary.arn == arn)
            .map(|s| s.tags.clone())
            .ok_or_else(|| {
                not_found(
                    Operation::ListTagsForResource,
                    format!("Unknown resource: {}", arn),
                )
            })
    }

    async fn list_users(&self, server_id: &str) -> ServiceResult<Vec<UserSummary>> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::ListUsers {
            server_id: server_id.to_string(),
        });
        state.check(Operation::ListUsers, Some(server_id))?;

        let server = state.server_mut(Operation::ListUsers, server_id)?;
        let arn = server.summary.arn.replace(":server/", ":user/");
        Ok(server
            .users
            .iter()
            .map(|u| UserSummary {
                user_name: u.user_name.clone(),
                arn: format!("{}/{}", arn, u.user_name),
            })
            .collect())
    }

    async fn delete_user(&self, server_id: &str, user_name: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::DeleteUser {
            server_id: server_id.to_string(),
            user_name: user_name.to_string(),
        });
        state.check(Operation::DeleteUser, Some(server_id))?;

        let server = state.server_mut(Operation::DeleteUser, server_id)?;
        let before = server.users.len();
        server.users.retain(|u| u.user_name != user_name);
        if server.users.len() == before {
            return Err(not_found(
                Operation::DeleteUser,
                format!("Unknown user: {}", user_name),
            ));
        }
        Ok(())
    }

    async fn delete_server(&self, server_id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::DeleteServer {
            server_id: server_id.to_string(),
        });
        state.check(Operation::DeleteServer, Some(server_id))?;

        let before = state.servers.len();
        // Users and policies go with their server
        state.servers.retain(|s| s.summary.server_id != server_id);
        if state.servers.len() == before {
            return Err(not_found(
                Operation::DeleteServer,
                format!("Unknown server: {}", server_id),
            ));
        }

        debug!("In-memory transfer: deleted server {}", server_id);
        Ok(())
    }
}
