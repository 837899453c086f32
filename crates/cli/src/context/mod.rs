//! Application context - dependency injection container

use std::sync::Arc;

use bulkload_common::{Clock, SystemClock};
use bulkload_core::Connector;
use bulkload_domain::{Config, Result};
use bulkload_infra::PgConnector;
use tracing::info;

/// Holds the configuration and the adapters shared by every command
pub struct AppContext {
    pub config: Arc<Config>,
    pub connector: Arc<dyn Connector>,
    pub clock: Arc<dyn Clock>,
    /// Names the result file of this run
    pub timestamp: String,
}

impl AppContext {
    /// Wire the PostgreSQL connector and the system clock.
    ///
    /// # Errors
    /// Returns `BulkLoadError::Config` if the connection section cannot be
    /// turned into a connector.
    pub fn new(config: Config, timestamp: String) -> Result<Self> {
        let connector = PgConnector::new(&config.connection)?;
        info!(
            driver = %connector.driver(),
            database = %connector.database(),
            "Application context initialized"
        );
        Ok(Self::with_adapters(config, Arc::new(connector), Arc::new(SystemClock), timestamp))
    }

    /// Build a context around explicit adapters.
    pub fn with_adapters(
        config: Config,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
        timestamp: String,
    ) -> Self {
        Self { config: Arc::new(config), connector, clock, timestamp }
    }
}
