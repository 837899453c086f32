//! Load test runner
//!
//! One load test = recreate the target database, apply the schema, then load
//! every data file with the selected loader. Transient driver failures
//! abandon the attempt and restart it from scratch after a fixed wait, up to
//! the configured number of attempts.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bulkload_common::{Clock, ErrorClassification};
use bulkload_domain::{
    BulkLoadError, Config, FileMetrics, LoadResult, LoaderKind, Result, SessionKind,
};
use tracing::{debug, error, info, warn};

use crate::loading::{Connection, Connector, Loader, LoaderSettings, Session};

/// A data file and where to read it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub name: String,
    pub path: PathBuf,
}

/// Everything a single load test needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub schema_path: PathBuf,
    pub data_files: Vec<DataFile>,
    pub settings: LoaderSettings,
    pub reattempt_wait: Duration,
    pub maximum_attempts: u32,
}

impl LoadPlan {
    /// Plan for one `(batch_size, transaction_count)` pair of `config`.
    pub fn from_config(
        config: &Config,
        batch_size: Option<NonZeroUsize>,
        transaction_count: usize,
    ) -> Self {
        Self::with_loader(config, config.loading.loader_type, batch_size, transaction_count)
    }

    /// Same as [`LoadPlan::from_config`] with an explicit loader strategy.
    pub fn with_loader(
        config: &Config,
        kind: LoaderKind,
        batch_size: Option<NonZeroUsize>,
        transaction_count: usize,
    ) -> Self {
        Self {
            schema_path: config.schema_path(),
            data_files: config
                .loading
                .data_files
                .iter()
                .map(|name| DataFile { name: name.clone(), path: config.data_path(name) })
                .collect(),
            settings: LoaderSettings { kind, batch_size, transaction_count },
            reattempt_wait: config.reattempt_wait(),
            maximum_attempts: config.loading.maximum_test_attempts,
        }
    }
}

/// Runs one load test with whole-attempt retries
pub struct LoadTestRunner {
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    plan: LoadPlan,
}

impl LoadTestRunner {
    pub fn new(connector: Arc<dyn Connector>, clock: Arc<dyn Clock>, plan: LoadPlan) -> Self {
        Self { connector, clock, plan }
    }

    pub fn plan(&self) -> &LoadPlan {
        &self.plan
    }

    /// Run attempts until one succeeds or the attempt budget is spent.
    ///
    /// # Errors
    /// - `BulkLoadError::AttemptsExhausted` when every permitted attempt hit a
    ///   transient failure
    /// - any non-transient error, unchanged, from the attempt that raised it
    pub async fn run(&self) -> Result<LoadResult> {
        let settings = self.plan.settings;
        let mut attempt: u32 = 1;

        loop {
            info!(
                attempt,
                loader_type = %settings.kind,
                batch_size = settings.batch_size.map(NonZeroUsize::get),
                transaction_count = settings.transaction_count,
                "Starting load test"
            );

            match self.attempt().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "Load test attempt failed with a transient error");
                    attempt += 1;
                    if attempt > self.plan.maximum_attempts {
                        let exhausted =
                            BulkLoadError::AttemptsExhausted { attempts: self.plan.maximum_attempts };
                        error!(error = %exhausted, "Giving up on load test");
                        return Err(exhausted);
                    }
                    self.clock.sleep(self.plan.reattempt_wait).await;
                    info!("Re-starting test. Attempt: {attempt}");
                }
                Err(e) => {
                    error!(attempt, error = %e, "Load test failed");
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self) -> Result<LoadResult> {
        let schema = tokio::fs::read_to_string(&self.plan.schema_path).await.map_err(|e| {
            BulkLoadError::Resource(format!(
                "Failed to read schema {}: {e}",
                self.plan.schema_path.display()
            ))
        })?;

        let mut connection = self.connector.connect().await?;
        let prepared = prepare_database(connection.as_mut(), &schema).await;
        if let Err(e) = connection.close().await {
            debug!(error = %e, "Ignoring failure while closing connection");
        }
        prepared?;

        let settings = self.plan.settings;
        let mut result = LoadResult::new(
            settings.kind,
            settings.batch_size.map(NonZeroUsize::get),
            settings.transaction_count,
        );
        for file in &self.plan.data_files {
            info!(file = %file.name, "Loading data file");
            let started = self.clock.now();
            let mut loader =
                Loader::build(Arc::clone(&self.connector), vec![file.path.clone()], settings)
                    .await?;
            loader.load().await?;
            let elapsed = self.clock.now().saturating_duration_since(started);
            let count = loader.queries_run();
            info!(
                file = %file.name,
                count,
                elapsed_secs = elapsed.as_secs_f64(),
                "Finished loading data file"
            );
            result.files.push(FileMetrics { file: file.name.clone(), count, elapsed });
        }
        Ok(result)
    }
}

/// Drop and recreate the target database, then apply the schema in one
/// committed transaction.
async fn prepare_database(connection: &mut dyn Connection, schema: &str) -> Result<()> {
    connection.recreate_database().await?;
    let session = connection.session(SessionKind::Schema).await?;
    let applied = apply_schema(session.as_ref(), schema).await;
    if let Err(e) = session.close().await {
        debug!(error = %e, "Ignoring failure while closing schema session");
    }
    applied?;
    debug!("Schema applied");
    Ok(())
}

async fn apply_schema(session: &dyn Session, schema: &str) -> Result<()> {
    let mut transaction = session.transaction().await?;
    if let Err(e) = transaction.define(schema).await {
        if let Err(close_error) = transaction.close().await {
            debug!(error = %close_error, "Ignoring failure while closing schema transaction");
        }
        return Err(e);
    }
    transaction.commit().await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bulkload_common::MockClock;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::RecordingDriver;

    struct Fixture {
        _dir: TempDir,
        plan: LoadPlan,
    }

    fn fixture(kind: LoaderKind, statements: usize, maximum_attempts: u32) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.sql");
        std::fs::write(&schema_path, "CREATE TABLE users (id BIGINT);").unwrap();
        let data_path = dir.path().join("entities.sql");
        let mut data = std::fs::File::create(&data_path).unwrap();
        for i in 0..statements {
            writeln!(data, "INSERT INTO users VALUES ({i});").unwrap();
        }

        Fixture {
            plan: LoadPlan {
                schema_path,
                data_files: vec![DataFile { name: "entities".into(), path: data_path }],
                settings: LoaderSettings {
                    kind,
                    batch_size: NonZeroUsize::new(10),
                    transaction_count: 2,
                },
                reattempt_wait: Duration::from_secs(10),
                maximum_attempts,
            },
            _dir: dir,
        }
    }

    fn runner(driver: &RecordingDriver, clock: &MockClock, plan: LoadPlan) -> LoadTestRunner {
        LoadTestRunner::new(driver.connector(), Arc::new(clock.clone()), plan)
    }

    #[tokio::test]
    async fn applies_schema_then_loads_each_file() {
        let driver = RecordingDriver::new();
        let clock = MockClock::new();
        let fixture = fixture(LoaderKind::Carousel, 35, 3);

        let result = runner(&driver, &clock, fixture.plan.clone()).run().await.unwrap();

        assert_eq!(driver.databases_recreated(), 1);
        let schema_commits: Vec<_> =
            driver.commits().into_iter().filter(|c| c.kind == SessionKind::Schema).collect();
        assert_eq!(schema_commits.len(), 1);
        assert_eq!(schema_commits[0].definitions, vec!["CREATE TABLE users (id BIGINT);"]);
        assert_eq!(result.loader_type, LoaderKind::Carousel);
        assert_eq!(result.batch_size, Some(10));
        assert_eq!(result.file("entities").map(|m| m.count), Some(35));
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn transient_failures_restart_the_whole_attempt() {
        let driver = RecordingDriver::new();
        driver.fail_recreates(2, BulkLoadError::Transient("server restarting".into()));
        let clock = MockClock::new();
        let fixture = fixture(LoaderKind::Pool, 20, 5);

        let result = runner(&driver, &clock, fixture.plan.clone()).run().await.unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 2]);
        assert_eq!(driver.databases_recreated(), 1);
        assert_eq!(result.total_count(), 20);
        assert_eq!(driver.connections_opened(), driver.connections_closed());
    }

    #[tokio::test]
    async fn exhaustion_after_maximum_attempts() {
        let driver = RecordingDriver::new();
        driver.fail_connects(10, BulkLoadError::Transient("connection refused".into()));
        let clock = MockClock::new();
        let fixture = fixture(LoaderKind::Carousel, 5, 3);

        let err = runner(&driver, &clock, fixture.plan.clone()).run().await.unwrap_err();

        assert_eq!(err, BulkLoadError::AttemptsExhausted { attempts: 3 });
        assert_eq!(clock.sleep_count(), 2);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let driver = RecordingDriver::new();
        driver.fail_insert("INSERT INTO users VALUES (3);", BulkLoadError::Database("bad row".into()));
        let clock = MockClock::new();
        let fixture = fixture(LoaderKind::Carousel, 5, 3);

        let err = runner(&driver, &clock, fixture.plan.clone()).run().await.unwrap_err();

        assert!(matches!(err, BulkLoadError::Database(_)));
        assert_eq!(clock.sleep_count(), 0);
        assert_eq!(driver.databases_recreated(), 1);
    }

    #[tokio::test]
    async fn missing_schema_is_a_resource_error() {
        let driver = RecordingDriver::new();
        let clock = MockClock::new();
        let mut fixture = fixture(LoaderKind::Carousel, 5, 3);
        fixture.plan.schema_path = fixture.plan.schema_path.with_file_name("absent.sql");

        let err = runner(&driver, &clock, fixture.plan.clone()).run().await.unwrap_err();

        assert!(matches!(err, BulkLoadError::Resource(_)));
        assert_eq!(driver.connections_opened(), 0);
    }
}
