//! Synthetic dataset generation
//!
//! Produces the schema and statement files the loaders consume: one file of
//! entity inserts and one of relation inserts between random existing
//! entities.

pub mod generator;

pub use generator::{DatasetGenerator, DatasetSummary};
