//! # Bulkload Core
//!
//! Bulk loading engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the transactional database client
//! - Statement source, batcher and the carousel/pool loaders
//! - The load test runner and the batch test sweep
//!
//! ## Architecture Principles
//! - Only depends on `bulkload-common` and `bulkload-domain`
//! - No database driver, file format or CLI code
//! - All external dependencies via traits
//! - Time is injected through [`bulkload_common::Clock`]

pub mod benchmark;
pub mod loading;

// Testing utilities
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use benchmark::{BatchTestDriver, DataFile, LoadPlan, LoadTestRunner, ResultSink};
pub use loading::ports::{Connection, Connector, Session, WriteTransaction};
pub use loading::{Loader, LoaderSettings};
