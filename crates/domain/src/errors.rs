//! Error types used throughout the application

use bulkload_common::{ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for bulk loading
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BulkLoadError {
    /// Driver failure that may succeed on a fresh attempt (dropped
    /// connection, deadlock, server restarting).
    #[error("Transient driver error: {0}")]
    Transient(String),

    /// Driver failure that will repeat on every attempt (bad SQL, constraint
    /// violation).
    #[error("Database error: {0}")]
    Database(String),

    /// A file or path could not be read or written.
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The load test failed on every permitted attempt.
    #[error("Maximum test attempts reached: {attempts}")]
    AttemptsExhausted { attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for bulk load operations
pub type Result<T> = std::result::Result<T, BulkLoadError>;

impl ErrorClassification for BulkLoadError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transient(_) => ErrorSeverity::Warning,
            Self::Database(_)
            | Self::Resource(_)
            | Self::Config(_)
            | Self::InvalidInput(_) => ErrorSeverity::Error,
            Self::AttemptsExhausted { .. } | Self::Internal(_) => ErrorSeverity::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(BulkLoadError::Transient("connection reset".into()).is_retryable());
        assert!(!BulkLoadError::Database("syntax error".into()).is_retryable());
        assert!(!BulkLoadError::Resource("missing.sql".into()).is_retryable());
        assert!(!BulkLoadError::AttemptsExhausted { attempts: 3 }.is_retryable());
    }

    #[test]
    fn exhaustion_is_critical_and_named() {
        let err = BulkLoadError::AttemptsExhausted { attempts: 12 };

        assert!(err.is_critical());
        assert_eq!(err.to_string(), "Maximum test attempts reached: 12");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&BulkLoadError::Transient("eof".into())).unwrap();
        assert_eq!(json, r#"{"type":"Transient","message":"eof"}"#);
    }
}
