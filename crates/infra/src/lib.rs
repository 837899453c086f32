//! # bulkload Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The PostgreSQL adapter for the loader ports (`tokio-postgres`)
//! - Configuration loading (TOML/JSON plus environment overrides)
//! - Logging setup (`tracing-subscriber`, `tracing-appender`)
//! - The CSV result writer and the synthetic dataset generator
//!
//! ## Architecture
//! - Implements traits defined in `bulkload-core`
//! - Depends on `bulkload-domain` and `bulkload-core`
//! - Contains all "impure" code (network, file system)

pub mod config;
pub mod database;
pub mod dataset;
pub mod errors;
pub mod observability;
pub mod results;

// Re-export commonly used items
pub use database::{PgConnection, PgConnector};
pub use dataset::{DatasetGenerator, DatasetSummary};
pub use errors::InfraError;
pub use observability::{init_logging, run_timestamp, LoggingGuard};
pub use results::CsvResultWriter;
