//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock time, including async sleeping,
//!   so retry loops and elapsed-time measurements can be tested without
//!   waiting.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use bulkload_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
