//! Domain data types
//!
//! - Selectors for the loader strategy and the database driver flavour
//! - Load result records produced by the load test runner

pub mod result;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use result::{FileMetrics, LoadResult};

use crate::impl_selector_conversions;

/// Bulk loading strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Ring of concurrently open transactions on a single session
    Carousel,
    /// Pool of independent workers, one transaction per batch
    Pool,
}

impl_selector_conversions!(LoaderKind {
    Carousel => "carousel",
    Pool => "pool",
});

/// Database driver flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Plaintext connection
    #[default]
    Core,
    /// TLS connection to any of several addresses, credentials required
    Cloud,
}

impl_selector_conversions!(DriverKind {
    Core => "core",
    Cloud => "cloud",
});

/// Purpose of a database session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Schema,
    Data,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Data => f.write_str("data"),
        }
    }
}
