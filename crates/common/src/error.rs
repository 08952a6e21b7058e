use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("customer_id is required")]
    MissingCustomerId,

    #[error("Invalid customer_id {value:?}: {reason}")]
    InvalidCustomerId { value: String, reason: String },

    #[error("Invalid network {value:?}: {reason}")]
    InvalidNetwork { value: String, reason: String },

    #[error("Invalid lifetime: {minutes} minutes")]
    InvalidLifetime { minutes: i64 },

    #[error("Expiration time out of range")]
    ExpirationOverflow,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Failure reported by the server provisioning service.
///
/// Callers propagate these unchanged. The only kind inspected anywhere is
/// [`ServiceError::is_not_found`], which makes repeated deletes idempotent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{operation} failed: {code}: {message}")]
    Api {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("{operation} failed: resource not found: {message}")]
    NotFound {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} transport error: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned an invalid response: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display_keeps_remote_message() {
        let err = Error::from(ServiceError::Api {
            operation: "CreateServer",
            code: "ThrottlingException".to_string(),
            message: "Rate exceeded".to_string(),
        });

        assert_eq!(
            err.to_string(),
            "CreateServer failed: ThrottlingException: Rate exceeded"
        );
    }

    #[test]
    fn test_only_not_found_is_classified() {
        let not_found = ServiceError::NotFound {
            operation: "DeleteServer",
            message: "Unknown server".to_string(),
        };
        let denied = ServiceError::Api {
            operation: "DeleteServer",
            code: "AccessDeniedException".to_string(),
            message: "denied".to_string(),
        };

        assert!(not_found.is_not_found());
        assert!(!denied.is_not_found());
    }
}
