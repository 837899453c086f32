//! Port interfaces for the transactional database client
//!
//! The loaders only ever talk to the database through this chain:
//! a [`Connector`] opens [`Connection`]s, a connection opens [`Session`]s
//! against the target database, and a session opens any number of
//! concurrently live [`WriteTransaction`]s.

use async_trait::async_trait;
use bulkload_domain::{Result, SessionKind};

/// Opens connections to the database server
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// A live connection to the database server
#[async_trait]
pub trait Connection: Send + Sync {
    /// Drop the target database if it exists and create it empty.
    async fn recreate_database(&mut self) -> Result<()>;

    /// Open a session on the target database.
    async fn session(&mut self, kind: SessionKind) -> Result<Box<dyn Session>>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A session on the target database
#[async_trait]
pub trait Session: Send + Sync {
    /// Open a write transaction.
    ///
    /// Several transactions opened on the same session may be live at once.
    async fn transaction(&self) -> Result<Box<dyn WriteTransaction>>;

    /// Release the session and anything it still holds.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// An open write transaction
#[async_trait]
pub trait WriteTransaction: Send {
    /// Apply schema definition text (may hold several statements).
    async fn define(&mut self, schema: &str) -> Result<()>;

    /// Execute one insert statement.
    async fn insert(&mut self, statement: &str) -> Result<()>;

    /// Commit everything inserted so far.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Abandon the transaction without committing.
    async fn close(self: Box<Self>) -> Result<()>;
}
