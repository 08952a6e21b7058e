//! Temporary SFTP server lifecycle
//!
//! Two independent operations over the managed transfer service:
//!
//! - [`Provisioner`] creates a server tagged with its customer and deadline,
//!   a scoped user, and optionally a source-network policy for that user.
//! - [`Reaper`] lists every server, reads its `ExpirationTime` tag and
//!   deletes the ones whose deadline has passed.
//!
//! No server state is kept locally. Every expiry decision re-reads the tags
//! held by the service, so sweeps can be re-run or overlap safely.

pub mod clock;
pub mod config;
pub mod provisioner;
pub mod reaper;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BucketName, LifecycleConfig, Region, RoleArn, SecurityPolicy};
pub use provisioner::{ProvisionRequest, ProvisionedServer, Provisioner};
pub use reaper::Reaper;
