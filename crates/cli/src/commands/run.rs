//! Full sweep over the configured batch sizes and transaction counts

use std::sync::Arc;

use bulkload_core::BatchTestDriver;
use bulkload_domain::{LoadResult, Result};
use bulkload_infra::CsvResultWriter;
use tracing::info;

use crate::context::AppContext;

/// Run every combination and write one CSV row per completed load test.
///
/// # Errors
/// Stops at the first combination that fails for good; rows written before
/// the failure stay in the results file.
pub async fn run_sweep(context: &AppContext) -> Result<Vec<LoadResult>> {
    let config = &context.config;
    let mut writer = CsvResultWriter::create(
        &config.project.results_dir,
        &context.timestamp,
        &config.loading.data_files,
    )?;

    let driver = BatchTestDriver::new(
        Arc::clone(&context.connector),
        Arc::clone(&context.clock),
        Arc::clone(config),
    );
    let results = driver.run(&mut writer).await?;

    info!(
        results = results.len(),
        path = %writer.path().display(),
        "Sweep results written"
    );
    Ok(results)
}
