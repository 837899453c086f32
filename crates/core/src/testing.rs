//! In-memory recording driver for tests
//!
//! [`RecordingDriver`] implements the full port chain without a database.
//! Every connection, session and transaction is counted, committed
//! statements are kept in commit order, and faults can be scheduled for
//! connects, database recreation, inserts and commits.
//!
//! ```rust,ignore
//! use bulkload_core::testing::RecordingDriver;
//! use bulkload_domain::BulkLoadError;
//!
//! let driver = RecordingDriver::new();
//! driver.fail_connects(2, BulkLoadError::Transient("connection refused".into()));
//! let connector = driver.connector();
//! # drop(connector);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bulkload_domain::{BulkLoadError, Result, SessionKind};
use parking_lot::Mutex;

use crate::loading::ports::{Connection, Connector, Session, WriteTransaction};

/// A transaction as it was committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub session: u64,
    pub kind: SessionKind,
    pub definitions: Vec<String>,
    pub statements: Vec<String>,
}

#[derive(Default)]
struct DriverState {
    connections_opened: u64,
    connections_closed: u64,
    databases_recreated: u64,
    sessions: HashMap<u64, SessionKind>,
    next_session: u64,
    sessions_closed: u64,
    transactions_opened: u64,
    transactions_closed: u64,
    live_transactions: u64,
    peak_live_transactions: u64,
    commit_attempts: u64,
    commits: Vec<CommittedTransaction>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    connects: Vec<BulkLoadError>,
    recreates: Vec<BulkLoadError>,
    commit: Option<(u64, BulkLoadError)>,
    insert: Option<(String, BulkLoadError)>,
}

/// Recording stand-in for a database driver
#[derive(Clone, Default)]
pub struct RecordingDriver {
    state: Arc<Mutex<DriverState>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector handing out recording connections.
    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(RecordingConnector { state: Arc::clone(&self.state) })
    }

    // Fault scheduling

    /// Fail the next `times` connects with `error`.
    pub fn fail_connects(&self, times: usize, error: BulkLoadError) {
        let mut state = self.state.lock();
        state.faults.connects.extend(std::iter::repeat(error).take(times));
    }

    /// Fail the next `times` database recreations with `error`.
    pub fn fail_recreates(&self, times: usize, error: BulkLoadError) {
        let mut state = self.state.lock();
        state.faults.recreates.extend(std::iter::repeat(error).take(times));
    }

    /// Fail the `nth` commit attempt (1-based, counted across all sessions).
    pub fn fail_commit(&self, nth: u64, error: BulkLoadError) {
        self.state.lock().faults.commit = Some((nth, error));
    }

    /// Fail every insert of exactly `statement`.
    pub fn fail_insert(&self, statement: impl Into<String>, error: BulkLoadError) {
        self.state.lock().faults.insert = Some((statement.into(), error));
    }

    // Observations

    pub fn connections_opened(&self) -> u64 {
        self.state.lock().connections_opened
    }

    pub fn connections_closed(&self) -> u64 {
        self.state.lock().connections_closed
    }

    pub fn databases_recreated(&self) -> u64 {
        self.state.lock().databases_recreated
    }

    pub fn sessions_opened(&self, kind: SessionKind) -> usize {
        self.state.lock().sessions.values().filter(|k| **k == kind).count()
    }

    pub fn sessions_closed(&self) -> u64 {
        self.state.lock().sessions_closed
    }

    pub fn transactions_opened(&self) -> u64 {
        self.state.lock().transactions_opened
    }

    pub fn transactions_closed(&self) -> u64 {
        self.state.lock().transactions_closed
    }

    /// Transactions opened but neither committed nor closed.
    pub fn live_transactions(&self) -> u64 {
        self.state.lock().live_transactions
    }

    /// Highest number of simultaneously live transactions seen.
    pub fn peak_live_transactions(&self) -> u64 {
        self.state.lock().peak_live_transactions
    }

    pub fn commits(&self) -> Vec<CommittedTransaction> {
        self.state.lock().commits.clone()
    }

    /// Committed data transactions only.
    pub fn data_commits(&self) -> Vec<CommittedTransaction> {
        self.state.lock().commits.iter().filter(|c| c.kind == SessionKind::Data).cloned().collect()
    }

    /// Every committed data statement, in commit order.
    pub fn committed_statements(&self) -> Vec<String> {
        self.data_commits().into_iter().flat_map(|commit| commit.statements).collect()
    }

    /// Distinct data sessions that committed at least once.
    pub fn committing_data_sessions(&self) -> usize {
        let mut sessions: Vec<u64> = self.data_commits().iter().map(|c| c.session).collect();
        sessions.sort_unstable();
        sessions.dedup();
        sessions.len()
    }
}

struct RecordingConnector {
    state: Arc<Mutex<DriverState>>,
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let mut state = self.state.lock();
        if !state.faults.connects.is_empty() {
            return Err(state.faults.connects.remove(0));
        }
        state.connections_opened += 1;
        Ok(Box::new(RecordingConnection { state: Arc::clone(&self.state) }))
    }
}

struct RecordingConnection {
    state: Arc<Mutex<DriverState>>,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn recreate_database(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.faults.recreates.is_empty() {
            return Err(state.faults.recreates.remove(0));
        }
        state.databases_recreated += 1;
        Ok(())
    }

    async fn session(&mut self, kind: SessionKind) -> Result<Box<dyn Session>> {
        let mut state = self.state.lock();
        let id = state.next_session;
        state.next_session += 1;
        state.sessions.insert(id, kind);
        Ok(Box::new(RecordingSession { state: Arc::clone(&self.state), id, kind }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.lock().connections_closed += 1;
        Ok(())
    }
}

struct RecordingSession {
    state: Arc<Mutex<DriverState>>,
    id: u64,
    kind: SessionKind,
}

#[async_trait]
impl Session for RecordingSession {
    async fn transaction(&self) -> Result<Box<dyn WriteTransaction>> {
        let mut state = self.state.lock();
        state.transactions_opened += 1;
        state.live_transactions += 1;
        state.peak_live_transactions = state.peak_live_transactions.max(state.live_transactions);
        Ok(Box::new(RecordingTransaction {
            state: Arc::clone(&self.state),
            session: self.id,
            kind: self.kind,
            definitions: Vec::new(),
            statements: Vec::new(),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.lock().sessions_closed += 1;
        Ok(())
    }
}

struct RecordingTransaction {
    state: Arc<Mutex<DriverState>>,
    session: u64,
    kind: SessionKind,
    definitions: Vec<String>,
    statements: Vec<String>,
}

#[async_trait]
impl WriteTransaction for RecordingTransaction {
    async fn define(&mut self, schema: &str) -> Result<()> {
        self.definitions.push(schema.to_string());
        Ok(())
    }

    async fn insert(&mut self, statement: &str) -> Result<()> {
        if let Some((failing, error)) = &self.state.lock().faults.insert {
            if failing == statement {
                return Err(error.clone());
            }
        }
        self.statements.push(statement.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut state = this.state.lock();
        state.commit_attempts += 1;
        state.live_transactions -= 1;
        if let Some((nth, error)) = &state.faults.commit {
            if *nth == state.commit_attempts {
                let error = error.clone();
                state.transactions_closed += 1;
                return Err(error);
            }
        }
        state.commits.push(CommittedTransaction {
            session: this.session,
            kind: this.kind,
            definitions: this.definitions,
            statements: this.statements,
        });
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock();
        state.live_transactions -= 1;
        state.transactions_closed += 1;
        Ok(())
    }
}
