//! Error types for orgpolicy.
//!
//! All errors are strongly typed using thiserror, so callers can match on
//! the exact reason a query failed.

use thiserror::Error;

use crate::storage::SourceError;

/// Classified failures of a hierarchy query.
///
/// A query either succeeds with a (possibly empty) list or fails with
/// exactly one of these.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Employee not found: {id:?}")]
    EmployeeNotFound {
        id: String,
    },

    #[error("Invalid employee response: {count} rows for id {id:?}")]
    InvalidEmployeeResponse {
        id: String,
        count: usize,
    },

    #[error("Position not found: {id:?}")]
    PositionNotFound {
        id: String,
    },

    #[error("Invalid position response: {count} rows for id {id:?}")]
    InvalidPositionResponse {
        id: String,
        count: usize,
    },

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl PolicyError {
    /// Returns true if the employee or its position does not resolve.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EmployeeNotFound { .. } | Self::PositionNotFound { .. })
    }

    /// Returns true if a source broke the one-row-per-id contract.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmployeeResponse { .. } | Self::InvalidPositionResponse { .. }
        )
    }
}

/// Errors raised by the query worker pool.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Query queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Query worker pool disconnected")]
    Disconnected,

    #[error("Query timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn query worker: {message}")]
    Spawn {
        message: String,
    },
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config field '{field}': {reason}")]
    Invalid {
        field: String,
        reason: String,
    },
}

/// Top-level error type for orgpolicy.
#[derive(Debug, Error)]
pub enum OrgError {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SourceError> for OrgError {
    fn from(err: SourceError) -> Self {
        Self::Policy(PolicyError::Source(err))
    }
}

impl OrgError {
    /// Returns true if this is a policy error.
    #[must_use]
    pub const fn is_policy(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Returns true if this is a runtime error.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// Returns true if this is a config error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Policy(PolicyError::Source(e)) => e.is_retryable(),
            Self::Policy(_) => false, // Classification won't change on retry
            Self::Runtime(e) => matches!(e, RuntimeError::QueueFull { .. } | RuntimeError::Timeout { .. }),
            Self::Config(_) => false,
        }
    }
}

/// Result type alias for orgpolicy operations.
pub type OrgResult<T> = Result<T, OrgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_employee_not_found() {
        let err = PolicyError::EmployeeNotFound { id: "99".to_string() };
        let msg = format!("{err}");
        assert!(msg.contains("Employee not found"));
        assert!(msg.contains("\"99\""));
        assert!(err.is_not_found());
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_policy_error_invalid_response() {
        let err = PolicyError::InvalidPositionResponse {
            id: "2".to_string(),
            count: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("3 rows"));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_policy_error_from_source() {
        let err: PolicyError = SourceError::Cancelled.into();
        assert!(matches!(err, PolicyError::Source(SourceError::Cancelled)));
    }

    #[test]
    fn test_runtime_error_timeout() {
        let err = RuntimeError::Timeout { duration_ms: 5000 };
        assert!(format!("{err}").contains("5000ms"));
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::Invalid {
            field: "runtime.workers".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("runtime.workers"));
        assert!(msg.contains("at least 1"));
    }

    #[test]
    fn test_org_error_classification() {
        let err: OrgError = PolicyError::EmployeeNotFound { id: "1".into() }.into();
        assert!(err.is_policy());
        assert!(!err.is_retryable());

        let err: OrgError = RuntimeError::QueueFull { capacity: 4 }.into();
        assert!(err.is_runtime());
        assert!(err.is_retryable());

        let err: OrgError = SourceError::Connection("reset".into()).into();
        assert!(err.is_policy());
        assert!(err.is_retryable());

        let err: OrgError = SourceError::Cancelled.into();
        assert!(!err.is_retryable());

        let err: OrgError = ConfigError::Invalid {
            field: "f".into(),
            reason: "r".into(),
        }
        .into();
        assert!(err.is_config());
        assert!(!err.is_retryable());
    }
}
