//! # bulkload CLI
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands behind the `bulkload` binary (`run`, `load`, `generate`)
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the PostgreSQL adapter into the core loaders

pub mod commands;
pub mod context;

pub use commands::{generate_dataset, run_single, run_sweep, SingleLoad};
pub use context::AppContext;
