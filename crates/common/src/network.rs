//! Source network allow-lists

use ipnet::IpNet;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Validated list of CIDR blocks or bare addresses.
///
/// Entries are kept exactly as supplied, in the supplied order, so the
/// access policy condition mirrors the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedNetworks(Vec<String>);

impl AllowedNetworks {
    /// Parse an optional list. `None` and an empty list both mean unrestricted.
    pub fn parse(raw: Option<Vec<String>>) -> Result<Self> {
        let entries = raw.unwrap_or_default();

        for entry in &entries {
            if entry.parse::<IpNet>().is_err() && entry.parse::<IpAddr>().is_err() {
                return Err(Error::InvalidNetwork {
                    value: entry.clone(),
                    reason: "expected an IP address or CIDR block".to_string(),
                });
            }
        }

        Ok(Self(entries))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
