//! Fixed-size batching over a statement source

use std::num::NonZeroUsize;

use bulkload_domain::Result;

use super::source::{StatementCounter, StatementSource};

/// Ordered group of statements committed together
pub type Batch = Vec<String>;

/// Groups statements into batches of exactly `batch_size`
///
/// Only the terminal batch may be shorter, and it is never empty: a stream
/// of `n` statements yields `ceil(n / batch_size)` batches.
pub struct Batcher {
    source: StatementSource,
    batch_size: NonZeroUsize,
}

impl Batcher {
    pub fn new(source: StatementSource, batch_size: NonZeroUsize) -> Self {
        Self { source, batch_size }
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn counter(&self) -> StatementCounter {
        self.source.counter()
    }

    /// Next batch, or `None` once the source is exhausted.
    ///
    /// # Errors
    /// Propagates read failures from the underlying source.
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        let mut batch = Vec::with_capacity(self.batch_size.get());
        while batch.len() < self.batch_size.get() {
            match self.source.next_statement().await? {
                Some(statement) => batch.push(statement),
                None => break,
            }
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}
