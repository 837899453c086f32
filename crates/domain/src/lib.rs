//! # Bulkload Domain
//!
//! Business domain types for the bulk-load benchmark.
//!
//! This crate contains:
//! - Configuration structures and their validation
//! - Domain error type and Result definition
//! - Loader/driver selectors and load result records
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on the foundation tier of `bulkload-common`
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
