//! Load test orchestration: single runs with retries and full sweeps

pub mod ports;
pub mod runner;
pub mod sweep;

pub use ports::ResultSink;
pub use runner::{DataFile, LoadPlan, LoadTestRunner};
pub use sweep::BatchTestDriver;
