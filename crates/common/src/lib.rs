//! Shared building blocks for the bulkload crates.
//!
//! # Feature Tiers
//!
//! Pick the tier a crate needs:
//! - `foundation`: error classification and severity levels, no dependencies
//! - `runtime`: clock abstraction with async sleeping on tokio

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "foundation")]
pub mod error;

#[cfg(feature = "runtime")]
pub mod time;

#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock};
