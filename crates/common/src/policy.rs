//! Access policy documents

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::network::AllowedNetworks;

/// Policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Condition key matched against the caller's source address
pub const SOURCE_IP_KEY: &str = "aws:SourceIp";

/// Capability statement granting full transfer rights from a set of networks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPolicy {
    version: &'static str,
    statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    effect: &'static str,
    action: &'static str,
    resource: &'static str,
    condition: Value,
}

impl AccessPolicy {
    /// Restrict every transfer action to callers from `networks`
    pub fn restrict_to(networks: &AllowedNetworks) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: vec![Statement {
                effect: "Allow",
                action: "transfer:*",
                resource: "*",
                condition: json!({
                    "IpAddress": {
                        SOURCE_IP_KEY: networks.as_slice(),
                    }
                }),
            }],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
