//! Pool loader
//!
//! A producer splits the statement stream into batches and feeds them through
//! a bounded queue to `T` workers. Each worker owns its own connection and
//! session and commits one transaction per batch. Closing the queue is the
//! only termination signal.
//!
//! Batches may commit out of order across workers. A failed worker is logged
//! and stops on its own while its siblings keep draining; the load still
//! succeeds once every worker has exited. Batches already committed stay
//! committed and the failed batch is lost.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bulkload_domain::constants::QUEUE_LENGTH_FACTOR;
use bulkload_domain::{BulkLoadError, Result, SessionKind};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::batcher::{Batch, Batcher};
use super::ports::{Connector, Session};
use super::source::{StatementCounter, StatementSource};

type SharedQueue = Arc<Mutex<mpsc::Receiver<Batch>>>;

/// Multi-worker loader, one transaction per batch
pub struct PoolLoader {
    connector: Arc<dyn Connector>,
    batcher: Option<Batcher>,
    counter: StatementCounter,
    transaction_count: usize,
    batches_committed: Arc<AtomicU64>,
}

impl PoolLoader {
    /// # Errors
    /// Returns `BulkLoadError::InvalidInput` when `batch_size` is unset or
    /// `transaction_count` is zero.
    pub fn new(
        connector: Arc<dyn Connector>,
        paths: Vec<PathBuf>,
        batch_size: Option<NonZeroUsize>,
        transaction_count: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.ok_or_else(|| {
            BulkLoadError::InvalidInput("pool loader requires a batch size".to_string())
        })?;
        if transaction_count == 0 {
            return Err(BulkLoadError::InvalidInput(
                "transaction count must be at least 1".to_string(),
            ));
        }

        let batcher = Batcher::new(StatementSource::new(paths), batch_size);
        let counter = batcher.counter();
        Ok(Self {
            connector,
            batcher: Some(batcher),
            counter,
            transaction_count,
            batches_committed: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run the producer and all workers to completion.
    ///
    /// Worker failures do not fail the load: each one is logged where it
    /// happens and counted here.
    ///
    /// # Errors
    /// After every worker has exited, reports the producer's read error if
    /// there was one.
    pub async fn load(&mut self) -> Result<()> {
        let mut batcher = self.batcher.take().ok_or_else(|| {
            BulkLoadError::InvalidInput("pool loader has already been run".to_string())
        })?;
        warn_if_oversubscribed(self.transaction_count);
        info!(
            batch_size = batcher.batch_size().get(),
            transaction_count = self.transaction_count,
            "Starting pool load"
        );

        let (sender, receiver) = mpsc::channel(QUEUE_LENGTH_FACTOR * self.transaction_count);
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for worker in 0..self.transaction_count {
            workers.spawn(run_worker(
                worker,
                Arc::clone(&self.connector),
                Arc::clone(&queue),
                Arc::clone(&self.batches_committed),
            ));
        }
        // Workers hold the only receivers from here on
        drop(queue);

        let produced = produce(&mut batcher, sender).await;

        let mut failed_workers = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                // already logged by the worker
                Ok(Err(_)) => failed_workers += 1,
                Err(e) => {
                    error!(error = %e, "Pool worker panicked");
                    failed_workers += 1;
                }
            }
        }

        produced?;
        if failed_workers > 0 {
            warn!(
                failed_workers,
                batches = self.batches_committed(),
                "Pool load finished with failed workers; their batches were not committed"
            );
        }

        info!(
            statements = self.counter.get(),
            batches = self.batches_committed(),
            "Pool load complete"
        );
        Ok(())
    }

    pub fn queries_run(&self) -> u64 {
        self.counter.get()
    }

    /// Batches committed by all workers so far.
    pub fn batches_committed(&self) -> u64 {
        self.batches_committed.load(Ordering::Relaxed)
    }
}

fn warn_if_oversubscribed(transaction_count: usize) {
    if let Ok(cpus) = std::thread::available_parallelism() {
        if transaction_count > cpus.get() {
            warn!(
                transaction_count,
                cpus = cpus.get(),
                "Transaction count exceeds available CPUs; workers will contend for cores"
            );
        }
    }
}

/// Feed batches into the queue, then close it by dropping the sender.
async fn produce(batcher: &mut Batcher, sender: mpsc::Sender<Batch>) -> Result<()> {
    let mut sent = 0u64;
    while let Some(batch) = batcher.next_batch().await? {
        if sender.send(batch).await.is_err() {
            warn!(sent, "Every pool worker has stopped; abandoning remaining batches");
            return Ok(());
        }
        sent += 1;
    }
    debug!(sent, "All batches queued");
    Ok(())
}

async fn run_worker(
    worker: usize,
    connector: Arc<dyn Connector>,
    queue: SharedQueue,
    batches_committed: Arc<AtomicU64>,
) -> Result<()> {
    let mut connection = connector.connect().await?;
    let outcome = match connection.session(SessionKind::Data).await {
        Ok(session) => {
            let outcome = drain_queue(worker, session.as_ref(), &queue, &batches_committed).await;
            if let Err(e) = session.close().await {
                debug!(worker, error = %e, "Ignoring failure while closing session");
            }
            outcome
        }
        Err(e) => Err(e),
    };
    drop(queue);
    if let Err(e) = connection.close().await {
        debug!(worker, error = %e, "Ignoring failure while closing connection");
    }

    if let Err(e) = &outcome {
        error!(worker, error = %e, "Pool worker stopped");
    }
    outcome
}

async fn drain_queue(
    worker: usize,
    session: &dyn Session,
    queue: &SharedQueue,
    batches_committed: &AtomicU64,
) -> Result<()> {
    let mut committed = 0u64;
    loop {
        let next = queue.lock().await.recv().await;
        let Some(batch) = next else {
            debug!(worker, committed, "Queue closed; worker finished");
            return Ok(());
        };

        let mut transaction = session.transaction().await?;
        for statement in &batch {
            if let Err(e) = transaction.insert(statement).await {
                if let Err(close_error) = transaction.close().await {
                    debug!(worker, error = %close_error, "Ignoring failure while closing transaction");
                }
                return Err(e);
            }
        }
        transaction.commit().await?;
        committed += 1;
        batches_committed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::testing::RecordingDriver;

    fn numbered_file(count: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..count {
            writeln!(file, "INSERT {i};").unwrap();
        }
        file
    }

    fn loader(driver: &RecordingDriver, file: &NamedTempFile, batch_size: usize, workers: usize) -> PoolLoader {
        PoolLoader::new(
            driver.connector(),
            vec![file.path().to_path_buf()],
            NonZeroUsize::new(batch_size),
            workers,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn every_batch_commits_exactly_once() {
        let driver = RecordingDriver::new();
        let file = numbered_file(95);
        let mut loader = loader(&driver, &file, 10, 3);

        loader.load().await.unwrap();

        assert_eq!(driver.data_commits().len(), 10);
        assert_eq!(loader.batches_committed(), 10);
        assert_eq!(loader.queries_run(), 95);
        let mut statements = driver.committed_statements();
        statements.sort_by_key(|s| s.trim_start_matches("INSERT ").trim_end_matches(';').parse::<u32>().unwrap());
        let expected: Vec<String> = (0..95).map(|i| format!("INSERT {i};")).collect();
        assert_eq!(statements, expected);
    }

    #[tokio::test]
    async fn each_worker_owns_a_connection_and_session() {
        let driver = RecordingDriver::new();
        let file = numbered_file(40);
        let mut loader = loader(&driver, &file, 4, 4);

        loader.load().await.unwrap();

        assert_eq!(driver.connections_opened(), 4);
        assert_eq!(driver.connections_closed(), 4);
        assert_eq!(driver.sessions_opened(SessionKind::Data), 4);
        assert_eq!(driver.sessions_closed(), 4);
        assert_eq!(driver.live_transactions(), 0);
    }

    #[tokio::test]
    async fn empty_stream_commits_nothing() {
        let driver = RecordingDriver::new();
        let file = numbered_file(0);
        let mut loader = loader(&driver, &file, 10, 2);

        loader.load().await.unwrap();

        assert_eq!(driver.transactions_opened(), 0);
        assert_eq!(loader.queries_run(), 0);
    }

    #[tokio::test]
    async fn failed_insert_stops_only_that_worker() {
        let driver = RecordingDriver::new();
        driver.fail_insert("INSERT 0;", BulkLoadError::Database("duplicate key".into()));
        let file = numbered_file(50);
        let mut loader = loader(&driver, &file, 5, 2);

        loader.load().await.unwrap();

        // The first batch is lost; the surviving worker commits the rest
        assert_eq!(driver.data_commits().len(), 9);
        assert_eq!(loader.batches_committed(), 9);
        assert_eq!(loader.queries_run(), 50);
        assert_eq!(driver.live_transactions(), 0);
        assert_eq!(driver.connections_closed(), 2);
    }

    #[tokio::test]
    async fn failed_commit_stops_only_that_worker() {
        let driver = RecordingDriver::new();
        driver.fail_commit(1, BulkLoadError::Database("constraint".into()));
        let file = numbered_file(50);
        let mut loader = loader(&driver, &file, 5, 2);

        loader.load().await.unwrap();

        assert_eq!(driver.data_commits().len(), 9);
        assert_eq!(driver.committed_statements().len(), 45);
        assert_eq!(driver.committing_data_sessions(), 1);
        assert_eq!(driver.live_transactions(), 0);
        assert_eq!(driver.sessions_closed(), 2);
    }

    #[tokio::test]
    async fn transient_worker_failure_is_not_returned() {
        let driver = RecordingDriver::new();
        driver.fail_commit(3, BulkLoadError::Transient("connection reset".into()));
        let file = numbered_file(40);
        let mut loader = loader(&driver, &file, 4, 3);

        loader.load().await.unwrap();

        assert_eq!(loader.batches_committed(), 9);
        assert_eq!(driver.committed_statements().len(), 36);
    }

    #[tokio::test]
    async fn producer_stops_when_every_worker_is_gone() {
        let driver = RecordingDriver::new();
        driver.fail_connects(2, BulkLoadError::Transient("connection refused".into()));
        let file = numbered_file(1_000);
        let mut loader = loader(&driver, &file, 1, 2);

        loader.load().await.unwrap();

        assert!(loader.queries_run() < 1_000);
        assert_eq!(loader.batches_committed(), 0);
        assert_eq!(driver.transactions_opened(), 0);
    }

    #[tokio::test]
    async fn unreadable_file_is_returned() {
        let driver = RecordingDriver::new();
        let dir = tempfile::tempdir().unwrap();
        let mut loader = PoolLoader::new(
            driver.connector(),
            vec![dir.path().join("absent.sql")],
            NonZeroUsize::new(5),
            2,
        )
        .unwrap();

        let err = loader.load().await.unwrap_err();

        assert!(matches!(err, BulkLoadError::Resource(_)));
        assert_eq!(driver.sessions_closed(), 2);
    }

    #[test]
    fn batch_size_is_required() {
        let driver = RecordingDriver::new();
        let result = PoolLoader::new(driver.connector(), vec![], None, 2);
        assert!(matches!(result, Err(BulkLoadError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn loader_runs_once() {
        let driver = RecordingDriver::new();
        let file = numbered_file(3);
        let mut loader = loader(&driver, &file, 2, 1);

        loader.load().await.unwrap();
        assert!(matches!(loader.load().await, Err(BulkLoadError::InvalidInput(_))));
    }
}
