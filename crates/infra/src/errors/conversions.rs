//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use bulkload_domain::BulkLoadError;
use csv::Error as CsvError;
use native_tls::Error as TlsError;
use tokio_postgres::error::SqlState;
use tokio_postgres::Error as PgError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BulkLoadError);

impl From<InfraError> for BulkLoadError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BulkLoadError> for InfraError {
    fn from(value: BulkLoadError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBulkLoadError {
    fn into_bulkload(self) -> BulkLoadError;
}

/* -------------------------------------------------------------------------- */
/* tokio_postgres::Error → BulkLoadError */
/* -------------------------------------------------------------------------- */

/// SQLSTATEs worth a fresh attempt: connection exceptions (class 08),
/// serialization failures, deadlocks, connection exhaustion, server
/// shutdown/startup, and objects still in use by a departing session (55006).
pub fn is_transient_state(state: &SqlState) -> bool {
    let code = state.code();
    code.starts_with("08")
        || matches!(
            code,
            "40001" | "40P01" | "53300" | "55006" | "57P01" | "57P02" | "57P03"
        )
}

impl IntoBulkLoadError for PgError {
    fn into_bulkload(self) -> BulkLoadError {
        if self.is_closed() {
            return BulkLoadError::Transient(format!("connection closed: {self}"));
        }

        if let Some(db) = self.as_db_error() {
            let message = format!("{} (SQLSTATE {})", db.message(), db.code().code());
            return if is_transient_state(db.code()) {
                BulkLoadError::Transient(message)
            } else {
                BulkLoadError::Database(message)
            };
        }

        let io_source = std::error::Error::source(&self)
            .is_some_and(|source| source.downcast_ref::<IoError>().is_some());
        if io_source {
            BulkLoadError::Transient(format!("connection I/O failure: {self}"))
        } else {
            BulkLoadError::Database(self.to_string())
        }
    }
}

impl From<PgError> for InfraError {
    fn from(value: PgError) -> Self {
        InfraError(value.into_bulkload())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → BulkLoadError */
/* -------------------------------------------------------------------------- */

impl IntoBulkLoadError for IoError {
    fn into_bulkload(self) -> BulkLoadError {
        BulkLoadError::Resource(self.to_string())
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_bulkload())
    }
}

/* -------------------------------------------------------------------------- */
/* csv::Error → BulkLoadError */
/* -------------------------------------------------------------------------- */

impl IntoBulkLoadError for CsvError {
    fn into_bulkload(self) -> BulkLoadError {
        match self.kind() {
            csv::ErrorKind::Io(err) => BulkLoadError::Resource(format!("result file I/O: {err}")),
            _ => BulkLoadError::Internal(format!("result record rejected: {self}")),
        }
    }
}

impl From<CsvError> for InfraError {
    fn from(value: CsvError) -> Self {
        InfraError(value.into_bulkload())
    }
}

/* -------------------------------------------------------------------------- */
/* native_tls::Error → BulkLoadError */
/* -------------------------------------------------------------------------- */

impl IntoBulkLoadError for TlsError {
    fn into_bulkload(self) -> BulkLoadError {
        BulkLoadError::Config(format!("TLS connector setup failed: {self}"))
    }
}

impl From<TlsError> for InfraError {
    fn from(value: TlsError) -> Self {
        InfraError(value.into_bulkload())
    }
}

/* -------------------------------------------------------------------------- */
/* config formats → BulkLoadError */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(BulkLoadError::Config(format!("Invalid TOML format: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(BulkLoadError::Config(format!("Invalid JSON format: {value}")))
    }
}
