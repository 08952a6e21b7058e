//! Lifecycle configuration
//!
//! Account-specific values (roles, bucket, region, security policy) are
//! explicit, validated inputs rather than embedded constants.

use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;
use tempsftp_common::{partition, Error, Result, TenantId};

/// Lifetime applied when a request does not specify one
pub const DEFAULT_LIFETIME_MINUTES: i64 = 5;

fn config_error(message: String) -> Error {
    Error::Config(message)
}

/// AWS region name such as `us-east-1` or `us-gov-west-1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region(String);

impl Region {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        let valid = parts.len() >= 3
            && parts[0].len() == 2
            && parts[..parts.len() - 1]
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
            && parts[parts.len() - 1]
                .chars()
                .all(|c| c.is_ascii_digit())
            && !parts[parts.len() - 1].is_empty();

        if !valid {
            return Err(config_error(format!("Invalid AWS region: {:?}", s)));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IAM role ARN, `arn:<partition>:iam::<account>:role/<path/name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn(String);

impl RoleArn {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoleArn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || config_error(format!("Invalid IAM role ARN: {:?}", s));

        let parts: Vec<&str> = s.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" || parts[2] != "iam" || !parts[3].is_empty() {
            return Err(invalid());
        }
        if !matches!(parts[1], "aws" | "aws-cn" | "aws-us-gov") {
            return Err(invalid());
        }
        if parts[4].len() != 12 || !parts[4].chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let name = parts[5].strip_prefix("role/").ok_or_else(invalid)?;
        let name_ok = !name.is_empty()
            && !name.ends_with('/')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-/".contains(c));
        if !name_ok {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

/// S3 bucket name backing the home directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketName(String);

impl BucketName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BucketName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = (3..=63).contains(&s.len())
            && s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
            && s.starts_with(|c: char| c.is_ascii_alphanumeric())
            && s.ends_with(|c: char| c.is_ascii_alphanumeric())
            && !s.contains("..");

        if !valid {
            return Err(config_error(format!("Invalid S3 bucket name: {:?}", s)));
        }
        Ok(Self(s.to_string()))
    }
}

/// Supported Transfer Family security policy versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityPolicy {
    V2018_11,
    V2020_06,
    #[default]
    V2022_03,
    V2023_05,
    V2024_01,
    Fips2020_06,
    Fips2023_05,
    Fips2024_01,
}

impl SecurityPolicy {
    pub const ALL: [SecurityPolicy; 8] = [
        SecurityPolicy::V2018_11,
        SecurityPolicy::V2020_06,
        SecurityPolicy::V2022_03,
        SecurityPolicy::V2023_05,
        SecurityPolicy::V2024_01,
        SecurityPolicy::Fips2020_06,
        SecurityPolicy::Fips2023_05,
        SecurityPolicy::Fips2024_01,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityPolicy::V2018_11 => "TransferSecurityPolicy-2018-11",
            SecurityPolicy::V2020_06 => "TransferSecurityPolicy-2020-06",
            SecurityPolicy::V2022_03 => "TransferSecurityPolicy-2022-03",
            SecurityPolicy::V2023_05 => "TransferSecurityPolicy-2023-05",
            SecurityPolicy::V2024_01 => "TransferSecurityPolicy-2024-01",
            SecurityPolicy::Fips2020_06 => "TransferSecurityPolicy-FIPS-2020-06",
            SecurityPolicy::Fips2023_05 => "TransferSecurityPolicy-FIPS-2023-05",
            SecurityPolicy::Fips2024_01 => "TransferSecurityPolicy-FIPS-2024-01",
        }
    }
}

impl FromStr for SecurityPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                config_error(format!(
                    "Unknown security policy {:?} (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by the provisioner and the reaper
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub region: Region,

    /// Role the service assumes to write server logs
    pub logging_role_arn: RoleArn,

    /// Role granting users access to their home directory
    pub user_role_arn: RoleArn,

    pub bucket: BucketName,

    pub security_policy: SecurityPolicy,

    /// Applied when a request carries no lifetime
    pub default_lifetime: TimeDelta,

    /// Suffix of the public server hostname, derived from the region's partition
    pub endpoint_domain: String,

    /// Delete a freshly created server when a later provisioning step fails
    pub rollback_on_failure: bool,

    /// Delete a server's users explicitly before deleting the server
    pub delete_users_before_server: bool,
}

impl LifecycleConfig {
    /// Create a configuration with default policy, lifetime and behaviour flags
    pub fn new(
        region: Region,
        logging_role_arn: RoleArn,
        user_role_arn: RoleArn,
        bucket: BucketName,
    ) -> Self {
        let endpoint_domain = partition::dns_suffix(region.as_str()).to_string();
        Self {
            region,
            logging_role_arn,
            user_role_arn,
            bucket,
            security_policy: SecurityPolicy::default(),
            default_lifetime: TimeDelta::minutes(DEFAULT_LIFETIME_MINUTES),
            endpoint_domain,
            rollback_on_failure: false,
            delete_users_before_server: false,
        }
    }

    /// Public hostname of a server
    pub fn hostname(&self, server_id: &str) -> String {
        format!(
            "{}.server.transfer.{}.{}",
            server_id, self.region, self.endpoint_domain
        )
    }

    /// Home directory of a tenant's user
    pub fn home_directory(&self, tenant: &TenantId) -> String {
        format!("/{}/{}", self.bucket.as_str(), tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LifecycleConfig {
        LifecycleConfig::new(
            "eu-west-2".parse().unwrap(),
            "arn:aws:iam::123456789012:role/sftp-logging".parse().unwrap(),
            "arn:aws:iam::123456789012:role/service/sftp-user".parse().unwrap(),
            "customer-drop".parse().unwrap(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.security_policy.as_str(), "TransferSecurityPolicy-2022-03");
        assert_eq!(config.default_lifetime, TimeDelta::minutes(5));
        assert!(!config.rollback_on_failure);
        assert!(!config.delete_users_before_server);
    }

    #[test]
    fn test_hostname_and_home_directory() {
        let config = config();
        assert_eq!(
            config.hostname("s-0123456789abcdef0"),
            "s-0123456789abcdef0.server.transfer.eu-west-2.amazonaws.com"
        );

        let tenant = TenantId::parse("acme").unwrap();
        assert_eq!(config.home_directory(&tenant), "/customer-drop/acme");
    }

    #[test]
    fn test_china_region_hostname() {
        let config = LifecycleConfig::new(
            "cn-north-1".parse().unwrap(),
            "arn:aws-cn:iam::123456789012:role/sftp-logging".parse().unwrap(),
            "arn:aws-cn:iam::123456789012:role/sftp-user".parse().unwrap(),
            "customer-drop".parse().unwrap(),
        );
        assert_eq!(
            config.hostname("s-0123456789abcdef0"),
            "s-0123456789abcdef0.server.transfer.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_region_validation() {
        for ok in ["us-east-1", "eu-central-2", "us-gov-west-1", "ap-southeast-3"] {
            assert!(ok.parse::<Region>().is_ok(), "{ok}");
        }
        for bad in ["", "us-east", "US-EAST-1", "us_east_1", "useast1", "us--1"] {
            assert!(bad.parse::<Region>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_role_arn_validation() {
        assert!("arn:aws:iam::123456789012:role/x".parse::<RoleArn>().is_ok());
        assert!("arn:aws-us-gov:iam::123456789012:role/a/b".parse::<RoleArn>().is_ok());

        for bad in [
            "arn:aws:iam::YOUR_ACCOUNT_ID:role/YOUR_LOGGING_ROLE",
            "arn:aws:iam::123456789012:user/x",
            "arn:aws:s3:::bucket",
            "arn:aws:iam::123456789012:role/",
            "role/x",
        ] {
            assert!(bad.parse::<RoleArn>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_bucket_validation() {
        assert!("my.bucket-01".parse::<BucketName>().is_ok());
        for bad in ["ab", "YOUR_S3_BUCKET_NAME", "-bucket", "bucket-", "a..b", "a/b"] {
            assert!(bad.parse::<BucketName>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_security_policy_parsing() {
        for policy in SecurityPolicy::ALL {
            assert_eq!(policy.as_str().parse::<SecurityPolicy>().unwrap(), policy);
        }

        let err = "TransferSecurityPolicy-1999-01"
            .parse::<SecurityPolicy>()
            .unwrap_err();
        assert!(err.to_string().contains("TransferSecurityPolicy-2022-03"));
    }
}
