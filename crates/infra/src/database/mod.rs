//! Database adapters

pub mod postgres;

pub use postgres::{PgConnection, PgConnector};
