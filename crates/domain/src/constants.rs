//! Domain constants
//!
//! Centralized defaults shared by configuration loading and the loaders.

// Configuration defaults
pub const DEFAULT_STATEMENT_EXTENSION: &str = "sql";
pub const DEFAULT_MAINTENANCE_DATABASE: &str = "postgres";
pub const DEFAULT_TEST_REATTEMPT_WAIT_SECS: u64 = 10;
pub const DEFAULT_MAXIMUM_TEST_ATTEMPTS: u32 = 12;

// Pool loader queue capacity per worker
pub const QUEUE_LENGTH_FACTOR: usize = 4;

// Timestamp used for log and result file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%y-%m-%d_%H-%M-%S";

// Environment overrides
pub const ENV_PASSWORD: &str = "BULKLOAD_PASSWORD";
pub const ENV_DATABASE: &str = "BULKLOAD_DATABASE";
pub const ENV_ADDRESSES: &str = "BULKLOAD_ADDRESSES";
