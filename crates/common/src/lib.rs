pub mod error;
pub mod expiry;
pub mod models;
pub mod network;
pub mod partition;
pub mod policy;
pub mod tenant;

pub use error::{Error, Result, ServiceError};
pub use models::{
    CreateServerRequest, CreateUserRequest, SecretValue, ServerSummary, Tag, UpdateAccessRequest,
    UserSummary,
};
pub use network::AllowedNetworks;
pub use policy::AccessPolicy;
pub use tenant::TenantId;
