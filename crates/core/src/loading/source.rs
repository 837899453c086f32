//! Lazy statement source over one or more flat files

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bulkload_domain::{BulkLoadError, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

/// Shared count of statements handed out by a [`StatementSource`]
#[derive(Debug, Clone, Default)]
pub struct StatementCounter(Arc<AtomicU64>);

impl StatementCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forward-only, single-pass sequence of statements
///
/// Files are read line by line in the order given; each file is opened only
/// when the previous one is exhausted. Line terminators (`\n`, `\r\n`) are
/// stripped and every line, blank or not, is one statement.
pub struct StatementSource {
    pending: VecDeque<PathBuf>,
    current: Option<(PathBuf, Lines<BufReader<File>>)>,
    counter: StatementCounter,
}

impl StatementSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            pending: paths.into_iter().map(Into::into).collect(),
            current: None,
            counter: StatementCounter::default(),
        }
    }

    /// Handle on the produced-statement count that outlives the source.
    pub fn counter(&self) -> StatementCounter {
        self.counter.clone()
    }

    pub fn produced(&self) -> u64 {
        self.counter.get()
    }

    /// Next statement, or `None` once every file is exhausted.
    ///
    /// # Errors
    /// Returns `BulkLoadError::Resource` when a file cannot be opened or read.
    pub async fn next_statement(&mut self) -> Result<Option<String>> {
        loop {
            if let Some((path, lines)) = self.current.as_mut() {
                let line = lines.next_line().await.map_err(|e| {
                    BulkLoadError::Resource(format!("Failed to read {}: {e}", path.display()))
                })?;
                if let Some(line) = line {
                    self.counter.increment();
                    return Ok(Some(line));
                }
                debug!(path = %path.display(), "Statement file exhausted");
                self.current = None;
            }

            let Some(path) = self.pending.pop_front() else {
                return Ok(None);
            };
            let file = File::open(&path).await.map_err(|e| {
                BulkLoadError::Resource(format!("Failed to open {}: {e}", path.display()))
            })?;
            debug!(path = %path.display(), "Reading statements");
            self.current = Some((path, BufReader::new(file).lines()));
        }
    }
}
