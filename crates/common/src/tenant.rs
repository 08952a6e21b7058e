//! Tenant identifier validation
//!
//! The customer identifier ends up verbatim in a tag value, an S3 home
//! directory path segment and the SFTP username, so it is checked once here
//! against the character set all three accept.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Maximum tenant identifier length
pub const MAX_TENANT_ID_LEN: usize = 64;

/// Prefix of the per-tenant SFTP username
pub const USERNAME_PREFIX: &str = "temp-user-";

/// A validated customer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validate a raw customer identifier
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::MissingCustomerId);
        }

        let invalid = |reason: &str| Error::InvalidCustomerId {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.len() > MAX_TENANT_ID_LEN {
            return Err(invalid("must be at most 64 characters"));
        }

        if !raw.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(invalid("must start with a letter or digit"));
        }

        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(invalid(&format!("character {:?} is not allowed", c)));
        }

        if raw.contains("..") {
            return Err(invalid("must not contain '..'"));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic SFTP username for this tenant
    pub fn username(&self) -> String {
        format!("{}{}", USERNAME_PREFIX, self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for raw in ["acme", "test-customer-001", "Tenant_42", "a.b-c"] {
            let id = TenantId::parse(raw).unwrap();
            assert_eq!(id.as_str(), raw);
        }
    }

    #[test]
    fn test_username_is_derived() {
        let id = TenantId::parse("acme").unwrap();
        assert_eq!(id.username(), "temp-user-acme");
    }

    #[test]
    fn test_empty_is_missing() {
        assert!(matches!(TenantId::parse(""), Err(Error::MissingCustomerId)));
    }

    #[test]
    fn test_rejects_path_and_tag_hazards() {
        for raw in ["../etc", "a/b", "a..b", "-leading", ".hidden", "sp ace", "ünï"] {
            let err = TenantId::parse(raw).unwrap_err();
            assert!(
                matches!(err, Error::InvalidCustomerId { .. }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overlong() {
        let raw = "a".repeat(MAX_TENANT_ID_LEN + 1);
        assert!(TenantId::parse(&raw).is_err());
        assert!(TenantId::parse(&raw[..MAX_TENANT_ID_LEN]).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: TenantId = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(ok.as_str(), "acme");
        assert!(serde_json::from_str::<TenantId>("\"a/b\"").is_err());
    }
}
