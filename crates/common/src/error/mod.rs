//! Error classification shared by bulkload crates
//!
//! Errors that cross the load test retry boundary implement
//! [`ErrorClassification`], so the runner can decide whether to start a
//! fresh attempt without knowing the concrete error type.
//!
//! | Severity | Meaning for a load run |
//! |----------|------------------------|
//! | `Info` | Nothing went wrong, worth a note |
//! | `Warning` | Attempt lost, a retry may recover |
//! | `Error` | Load test failed, inputs or database need fixing |
//! | `Critical` | Run gave up or hit a bug |

use std::fmt;

/// Retry and severity answers for an error value
pub trait ErrorClassification {
    /// Whether a fresh attempt could succeed.
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    /// Label matching the log level names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
