//! Port interfaces for publishing load test results

use bulkload_domain::{LoadResult, Result};

/// Receives each load result as soon as its test completes
pub trait ResultSink: Send {
    /// Persist or forward one result.
    fn record(&mut self, result: &LoadResult) -> Result<()>;
}

/// Sink that keeps results in memory
impl ResultSink for Vec<LoadResult> {
    fn record(&mut self, result: &LoadResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}
