//! Error conversions for infrastructure adapters

pub mod conversions;

pub use conversions::{is_transient_state, InfraError};
