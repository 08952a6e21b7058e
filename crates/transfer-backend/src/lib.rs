//! Provisioning Service boundary
//!
//! Everything this project knows about servers, users and tags lives in the
//! managed transfer service. This crate exposes that service through the
//! [`ProvisioningService`] trait with two implementations:
//!
//! - [`TransferClient`]: signed JSON requests against AWS Transfer Family
//! - [`InMemoryTransfer`]: a process-local stand-in for development and tests
//!
//! It also provides [`SecretsManagerClient`] for reading secrets.

pub mod aws_client;
pub mod credentials;
pub mod in_memory;
pub mod secrets;
pub mod service;
pub mod sigv4;
pub mod transfer_client;

pub use credentials::AwsCredentials;
pub use in_memory::{InMemoryTransfer, Operation, RecordedCall};
pub use secrets::{SecretStore, SecretsManagerClient};
pub use service::{ProvisioningService, ServiceResult};
pub use transfer_client::TransferClient;
