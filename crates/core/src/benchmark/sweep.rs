//! Batch test driver
//!
//! Sweeps every `(batch_size, transaction_count)` pair from the
//! configuration, batch size in the outer loop, running one load test per
//! pair strictly one after another.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bulkload_common::Clock;
use bulkload_domain::{BulkLoadError, Config, LoadResult, Result};
use tracing::info;

use super::ports::ResultSink;
use super::runner::{LoadPlan, LoadTestRunner};
use crate::loading::Connector;

/// Runs the configured sweep of load tests
pub struct BatchTestDriver {
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
}

impl BatchTestDriver {
    pub fn new(connector: Arc<dyn Connector>, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self {
        Self { connector, clock, config }
    }

    /// Pairs in the order they will run.
    pub fn combinations(&self) -> Vec<(usize, usize)> {
        let loading = &self.config.loading;
        loading
            .batch_sizes
            .iter()
            .flat_map(|&batch_size| {
                loading.transaction_counts.iter().map(move |&count| (batch_size, count))
            })
            .collect()
    }

    /// Run every combination, handing each result to `sink` as it completes.
    ///
    /// # Errors
    /// Stops at the first failed load test or sink write and returns that
    /// error; results already recorded stay recorded.
    pub async fn run(&self, sink: &mut dyn ResultSink) -> Result<Vec<LoadResult>> {
        let combinations = self.combinations();
        info!(
            loader_type = %self.config.loading.loader_type,
            combinations = combinations.len(),
            "Starting batch test sweep"
        );

        let mut results = Vec::with_capacity(combinations.len());
        for (index, (batch_size, transaction_count)) in combinations.into_iter().enumerate() {
            let batch_size = NonZeroUsize::new(batch_size).ok_or_else(|| {
                BulkLoadError::Config("loading.batch_sizes must be positive".to_string())
            })?;
            info!(
                combination = index + 1,
                batch_size = batch_size.get(),
                transaction_count,
                "Running load test"
            );

            let plan = LoadPlan::from_config(&self.config, Some(batch_size), transaction_count);
            let runner =
                LoadTestRunner::new(Arc::clone(&self.connector), Arc::clone(&self.clock), plan);
            let result = runner.run().await?;
            sink.record(&result)?;
            results.push(result);
        }

        info!(completed = results.len(), "Batch test sweep complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use bulkload_common::MockClock;
    use bulkload_domain::{ConnectionConfig, GenerationConfig, LoaderKind, LoadingConfig, ProjectConfig};

    use super::*;
    use crate::testing::RecordingDriver;

    fn config(dir: &Path, kind: LoaderKind) -> Config {
        Config {
            project: ProjectConfig {
                dataset_dir: dir.to_path_buf(),
                results_dir: dir.join("results"),
                logs_dir: None,
            },
            connection: ConnectionConfig {
                driver_type: Default::default(),
                addresses: vec!["localhost:5432".into()],
                username: None,
                password: None,
                database: "bulkload".into(),
                maintenance_database: "postgres".into(),
            },
            generation: GenerationConfig::default(),
            loading: LoadingConfig {
                schema_file: "schema".into(),
                data_files: vec!["entities".into()],
                statement_extension: "sql".into(),
                loader_type: kind,
                batch_sizes: vec![5, 50],
                transaction_counts: vec![1, 3],
                test_reattempt_wait: 1,
                maximum_test_attempts: 2,
            },
        }
    }

    fn write_dataset(dir: &Path, statements: usize) {
        std::fs::write(dir.join("schema.sql"), "CREATE TABLE t (id INT);").unwrap();
        let data: String = (0..statements).map(|i| format!("INSERT INTO t VALUES ({i});\n")).collect();
        std::fs::write(dir.join("entities.sql"), data).unwrap();
    }

    #[tokio::test]
    async fn runs_batch_sizes_outer_and_counts_inner() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), 30);
        let driver = RecordingDriver::new();
        let sweep = BatchTestDriver::new(
            driver.connector(),
            Arc::new(MockClock::new()),
            Arc::new(config(dir.path(), LoaderKind::Pool)),
        );
        let mut sink: Vec<LoadResult> = Vec::new();

        let results = sweep.run(&mut sink).await.unwrap();

        let order: Vec<(Option<usize>, usize)> =
            results.iter().map(|r| (r.batch_size, r.transaction_count)).collect();
        assert_eq!(order, vec![(Some(5), 1), (Some(5), 3), (Some(50), 1), (Some(50), 3)]);
        assert_eq!(sink, results);
        assert!(results.iter().all(|r| r.total_count() == 30));
        assert_eq!(driver.databases_recreated(), 4);
    }

    #[tokio::test]
    async fn stops_at_first_failed_combination() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), 10);
        let driver = RecordingDriver::new();
        driver.fail_insert("INSERT INTO t VALUES (4);", BulkLoadError::Database("bad row".into()));
        let sweep = BatchTestDriver::new(
            driver.connector(),
            Arc::new(MockClock::new()),
            Arc::new(config(dir.path(), LoaderKind::Carousel)),
        );
        let mut sink: Vec<LoadResult> = Vec::new();

        let err = sweep.run(&mut sink).await.unwrap_err();

        assert!(matches!(err, BulkLoadError::Database(_)));
        assert!(sink.is_empty());
        assert_eq!(driver.databases_recreated(), 1);
    }
}
