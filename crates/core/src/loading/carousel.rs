//! Carousel loader
//!
//! Keeps a ring of `T` write transactions open on a single session and
//! hands out inserts round-robin. Once `batch_size * T` statements are
//! uncommitted the whole ring is committed in ring order and replaced by
//! `T` fresh transactions.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use bulkload_domain::{BulkLoadError, Result, SessionKind};
use tracing::{debug, info};

use super::ports::{Connection, Connector, Session, WriteTransaction};
use super::source::{StatementCounter, StatementSource};

struct Slot {
    transaction: Box<dyn WriteTransaction>,
    inserted: usize,
}

/// Fixed ring of concurrently open transactions with a rotating cursor
pub struct TransactionRing {
    slots: Vec<Slot>,
    cursor: usize,
}

impl TransactionRing {
    /// Open exactly `count` transactions on `session`.
    ///
    /// If any open fails, the transactions already opened are closed.
    pub async fn open(session: &dyn Session, count: usize) -> Result<Self> {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            match session.transaction().await {
                Ok(transaction) => slots.push(Slot { transaction, inserted: 0 }),
                Err(e) => {
                    close_slots(slots).await;
                    return Err(e);
                }
            }
        }
        Ok(Self { slots, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Statements inserted into each slot, in ring order.
    pub fn inserted(&self) -> Vec<usize> {
        self.slots.iter().map(|slot| slot.inserted).collect()
    }

    /// Insert into the slot under the cursor and advance the cursor.
    pub async fn insert(&mut self, statement: &str) -> Result<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(self.cursor)
            .ok_or_else(|| BulkLoadError::Internal("transaction ring is empty".to_string()))?;
        slot.transaction.insert(statement).await?;
        slot.inserted += 1;
        self.cursor = (self.cursor + 1) % len;
        Ok(())
    }

    /// Commit every slot in ring order, starting at the cursor.
    ///
    /// Stops at the first failed commit; the slots not yet committed are
    /// closed best-effort before the error is returned.
    pub async fn commit(self) -> Result<()> {
        let mut slots = self.slots;
        slots.rotate_left(self.cursor);

        let mut remaining = slots.into_iter();
        while let Some(slot) = remaining.next() {
            if let Err(e) = slot.transaction.commit().await {
                close_slots(remaining.collect()).await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Close every slot without committing, swallowing failures.
    pub async fn close(self) {
        close_slots(self.slots).await;
    }
}

async fn close_slots(slots: Vec<Slot>) {
    for slot in slots {
        if let Err(e) = slot.transaction.close().await {
            debug!(error = %e, "Ignoring failure while closing transaction");
        }
    }
}

/// Single-session loader over a ring of open transactions
pub struct CarouselLoader {
    source: StatementSource,
    counter: StatementCounter,
    batch_size: Option<NonZeroUsize>,
    transaction_count: usize,
    /// Uncommitted statements that trigger a ring commit
    threshold: Option<usize>,
    connection: Option<Box<dyn Connection>>,
    session: Option<Box<dyn Session>>,
    ring: Option<TransactionRing>,
    uncommitted: usize,
    commit_cycles: usize,
}

impl CarouselLoader {
    /// Connect, open a data session and open the initial ring.
    ///
    /// # Errors
    /// Returns `BulkLoadError::InvalidInput` when `transaction_count` is zero
    /// or the commit threshold `batch_size * transaction_count` overflows,
    /// otherwise whatever the driver reports. Anything opened before the
    /// failure is released.
    pub async fn open(
        connector: Arc<dyn Connector>,
        paths: Vec<PathBuf>,
        batch_size: Option<NonZeroUsize>,
        transaction_count: usize,
    ) -> Result<Self> {
        if transaction_count == 0 {
            return Err(BulkLoadError::InvalidInput(
                "transaction count must be at least 1".to_string(),
            ));
        }
        let threshold = match batch_size {
            Some(size) => Some(size.get().checked_mul(transaction_count).ok_or_else(|| {
                BulkLoadError::InvalidInput(format!(
                    "batch size {size} times transaction count {transaction_count} overflows"
                ))
            })?),
            None => None,
        };

        let mut connection = connector.connect().await?;
        let session = match connection.session(SessionKind::Data).await {
            Ok(session) => session,
            Err(e) => {
                release_connection(connection).await;
                return Err(e);
            }
        };
        let ring = match TransactionRing::open(session.as_ref(), transaction_count).await {
            Ok(ring) => ring,
            Err(e) => {
                release_session(session).await;
                release_connection(connection).await;
                return Err(e);
            }
        };

        let source = StatementSource::new(paths);
        let counter = source.counter();
        Ok(Self {
            source,
            counter,
            batch_size,
            transaction_count,
            threshold,
            connection: Some(connection),
            session: Some(session),
            ring: Some(ring),
            uncommitted: 0,
            commit_cycles: 0,
        })
    }

    /// Stream every statement through the ring, then drain and tear down.
    pub async fn load(&mut self) -> Result<()> {
        info!(
            batch_size = self.batch_size.map(NonZeroUsize::get),
            transaction_count = self.transaction_count,
            "Starting carousel load"
        );
        let outcome = self.run().await;
        self.teardown().await;
        if outcome.is_ok() {
            info!(
                statements = self.counter.get(),
                commit_cycles = self.commit_cycles,
                "Carousel load complete"
            );
        }
        outcome
    }

    pub fn queries_run(&self) -> u64 {
        self.counter.get()
    }

    /// Completed commits of the whole ring.
    pub fn commit_cycles(&self) -> usize {
        self.commit_cycles
    }

    async fn run(&mut self) -> Result<()> {
        let threshold = self.threshold;

        while let Some(statement) = self.source.next_statement().await? {
            self.ring_mut()?.insert(&statement).await?;
            self.uncommitted += 1;

            if threshold.is_some_and(|threshold| self.uncommitted >= threshold) {
                self.commit_ring().await?;
                self.reopen_ring().await?;
            }
        }

        if self.uncommitted > 0 || self.commit_cycles == 0 {
            self.commit_ring().await?;
        }
        Ok(())
    }

    fn ring_mut(&mut self) -> Result<&mut TransactionRing> {
        self.ring
            .as_mut()
            .ok_or_else(|| BulkLoadError::Internal("transaction ring is not open".to_string()))
    }

    async fn commit_ring(&mut self) -> Result<()> {
        let ring = self
            .ring
            .take()
            .ok_or_else(|| BulkLoadError::Internal("transaction ring is not open".to_string()))?;
        debug!(uncommitted = self.uncommitted, cycle = self.commit_cycles + 1, "Committing ring");
        ring.commit().await?;
        self.uncommitted = 0;
        self.commit_cycles += 1;
        Ok(())
    }

    async fn reopen_ring(&mut self) -> Result<()> {
        let session = self
            .session
            .as_deref()
            .ok_or_else(|| BulkLoadError::Internal("session is not open".to_string()))?;
        self.ring = Some(TransactionRing::open(session, self.transaction_count).await?);
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Some(ring) = self.ring.take() {
            ring.close().await;
        }
        if let Some(session) = self.session.take() {
            release_session(session).await;
        }
        if let Some(connection) = self.connection.take() {
            release_connection(connection).await;
        }
    }
}

async fn release_session(session: Box<dyn Session>) {
    if let Err(e) = session.close().await {
        debug!(error = %e, "Ignoring failure while closing session");
    }
}

async fn release_connection(connection: Box<dyn Connection>) {
    if let Err(e) = connection.close().await {
        debug!(error = %e, "Ignoring failure while closing connection");
    }
}
