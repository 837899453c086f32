//! Observability infrastructure
//!
//! Installs the process-wide `tracing` subscriber: human-readable output on
//! stdout plus, when a logs directory is configured, a timestamped log file
//! written through a non-blocking appender.

pub mod logging;

pub use logging::{init_logging, run_timestamp, LoggingGuard};
