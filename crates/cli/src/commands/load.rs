//! Single load test

use std::num::NonZeroUsize;
use std::sync::Arc;

use bulkload_core::{LoadPlan, LoadTestRunner, ResultSink};
use bulkload_domain::{BulkLoadError, LoadResult, LoaderKind, Result};
use bulkload_infra::CsvResultWriter;
use tracing::info;

use crate::context::AppContext;

/// Parameters of a one-off load test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleLoad {
    /// Falls back to `loading.loader_type`
    pub loader: Option<LoaderKind>,
    pub batch_size: Option<usize>,
    pub transaction_count: usize,
}

/// Run one load test and append its row to this run's results file.
///
/// # Errors
/// `BulkLoadError::InvalidInput` for a zero batch size or transaction count,
/// otherwise whatever the runner reports.
pub async fn run_single(context: &AppContext, request: SingleLoad) -> Result<LoadResult> {
    let config = &context.config;
    let kind = request.loader.unwrap_or(config.loading.loader_type);
    let batch_size = match request.batch_size {
        Some(size) => Some(NonZeroUsize::new(size).ok_or_else(|| {
            BulkLoadError::InvalidInput("batch size must be positive".to_string())
        })?),
        None => None,
    };
    if request.transaction_count == 0 {
        return Err(BulkLoadError::InvalidInput("transaction count must be positive".to_string()));
    }

    let plan = LoadPlan::with_loader(config, kind, batch_size, request.transaction_count);
    let runner = LoadTestRunner::new(Arc::clone(&context.connector), Arc::clone(&context.clock), plan);
    let result = runner.run().await?;

    let mut writer = CsvResultWriter::create(
        &config.project.results_dir,
        &context.timestamp,
        &config.loading.data_files,
    )?;
    writer.record(&result)?;

    info!(
        loader_type = %kind,
        statements = result.total_count(),
        seconds = result.total_elapsed().as_secs_f64(),
        path = %writer.path().display(),
        "Load test complete"
    );
    Ok(result)
}
