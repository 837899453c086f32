//! PostgreSQL adapter for the loader ports, built on `tokio-postgres`.
//!
//! - [`PgConnector`] resolves the configured addresses and driver flavour
//!   (`core` = plaintext, `cloud` = TLS with credentials).
//! - A [`PgConnection`] talks to the maintenance database and can drop and
//!   recreate the target database.
//! - A session on the target database keeps a small set of idle clients.
//!   Every write transaction owns one client for its lifetime, so a session
//!   can hold as many concurrently open transactions as the loader needs.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bulkload_core::{Connection, Connector, Session, WriteTransaction};
use bulkload_domain::{BulkLoadError, ConnectionConfig, DriverKind, Result, SessionKind};
use parking_lot::Mutex;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

const DEFAULT_PORT: u16 = 5432;

/// Opens PostgreSQL connections for the configured server
#[derive(Clone)]
pub struct PgConnector {
    inner: Arc<PgSettings>,
}

struct PgSettings {
    driver: DriverKind,
    addresses: Vec<(String, u16)>,
    username: Option<String>,
    password: Option<String>,
    database: String,
    maintenance_database: String,
    tls: Option<MakeTlsConnector>,
}

impl PgConnector {
    /// Build a connector from the connection section of the configuration.
    ///
    /// # Errors
    /// Returns `BulkLoadError::Config` for malformed addresses, missing cloud
    /// credentials or a TLS backend that cannot be initialised.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let addresses =
            config.addresses.iter().map(|address| parse_address(address)).collect::<Result<Vec<_>>>()?;
        if addresses.is_empty() {
            return Err(BulkLoadError::Config("at least one address is required".into()));
        }

        let tls = match config.driver_type {
            DriverKind::Core => None,
            DriverKind::Cloud => {
                if config.username.is_none() || config.password.is_none() {
                    return Err(BulkLoadError::Config(
                        "cloud driver requires a username and password".into(),
                    ));
                }
                let connector = native_tls::TlsConnector::new().map_err(map_tls_error)?;
                Some(MakeTlsConnector::new(connector))
            }
        };

        info!(
            driver = %config.driver_type,
            addresses = config.addresses.len(),
            database = %config.database,
            "PostgreSQL connector configured"
        );

        Ok(Self {
            inner: Arc::new(PgSettings {
                driver: config.driver_type,
                addresses,
                username: config.username.clone(),
                password: config.password.clone(),
                database: config.database.clone(),
                maintenance_database: config.maintenance_database.clone(),
                tls,
            }),
        })
    }

    pub fn driver(&self) -> DriverKind {
        self.inner.driver
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    fn pg_config(&self, dbname: &str) -> tokio_postgres::Config {
        let settings = &self.inner;
        let mut config = tokio_postgres::Config::new();
        for (host, port) in &settings.addresses {
            config.host(host);
            config.port(*port);
        }
        if let Some(user) = &settings.username {
            config.user(user);
        }
        if let Some(password) = &settings.password {
            config.password(password);
        }
        config.dbname(dbname);
        config.application_name("bulkload");
        config
    }

    /// Open one client on `dbname` and drive its connection in the background.
    async fn open_client(&self, dbname: &str) -> Result<Client> {
        let config = self.pg_config(dbname);
        match &self.inner.tls {
            None => {
                let (client, connection) = config.connect(NoTls).await.map_err(map_pg_error)?;
                spawn_connection(connection, dbname.to_string());
                Ok(client)
            }
            Some(tls) => {
                let (client, connection) =
                    config.connect(tls.clone()).await.map_err(map_pg_error)?;
                spawn_connection(connection, dbname.to_string());
                Ok(client)
            }
        }
    }
}

fn spawn_connection<F>(connection: F, database: String)
where
    F: Future<Output = std::result::Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, database = %database, "PostgreSQL connection task ended with error");
        }
    });
}

#[async_trait]
impl Connector for PgConnector {
    #[instrument(skip(self), fields(database = %self.inner.maintenance_database))]
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let client = self.open_client(&self.inner.maintenance_database).await?;
        debug!("Connected to maintenance database");
        Ok(Box::new(PgConnection { connector: self.clone(), client }))
    }
}

/// Connection to the maintenance database
pub struct PgConnection {
    connector: PgConnector,
    client: Client,
}

#[async_trait]
impl Connection for PgConnection {
    #[instrument(skip(self), fields(database = %self.connector.inner.database))]
    async fn recreate_database(&mut self) -> Result<()> {
        let database = quote_identifier(&self.connector.inner.database);
        self.client
            .batch_execute(&drop_database_statement(&database))
            .await
            .map_err(map_pg_error)?;
        self.client
            .batch_execute(&format!("CREATE DATABASE {database}"))
            .await
            .map_err(map_pg_error)?;
        info!("Target database recreated");
        Ok(())
    }

    async fn session(&mut self, kind: SessionKind) -> Result<Box<dyn Session>> {
        let first = self.connector.open_client(&self.connector.inner.database).await?;
        debug!(%kind, "Session opened");
        Ok(Box::new(PgSession {
            connector: self.connector.clone(),
            kind,
            idle: Arc::new(Mutex::new(vec![first])),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}

type IdleClients = Arc<Mutex<Vec<Client>>>;

/// Session on the target database
struct PgSession {
    connector: PgConnector,
    kind: SessionKind,
    idle: IdleClients,
}

#[async_trait]
impl Session for PgSession {
    async fn transaction(&self) -> Result<Box<dyn WriteTransaction>> {
        let reused = self.idle.lock().pop().filter(|client| !client.is_closed());
        let client = match reused {
            Some(client) => client,
            None => self.connector.open_client(&self.connector.inner.database).await?,
        };
        client.batch_execute("BEGIN").await.map_err(map_pg_error)?;
        Ok(Box::new(PgTransaction { client, idle: Arc::clone(&self.idle) }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let released = std::mem::take(&mut *self.idle.lock()).len();
        debug!(kind = %self.kind, released, "Session closed");
        Ok(())
    }
}

/// Write transaction pinned to one client
struct PgTransaction {
    client: Client,
    idle: IdleClients,
}

#[async_trait]
impl WriteTransaction for PgTransaction {
    async fn define(&mut self, schema: &str) -> Result<()> {
        self.client.batch_execute(schema).await.map_err(map_pg_error)
    }

    async fn insert(&mut self, statement: &str) -> Result<()> {
        self.client.batch_execute(statement).await.map_err(map_pg_error)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { client, idle } = *self;
        client.batch_execute("COMMIT").await.map_err(map_pg_error)?;
        idle.lock().push(client);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let Self { client, idle } = *self;
        client.batch_execute("ROLLBACK").await.map_err(map_pg_error)?;
        idle.lock().push(client);
        Ok(())
    }
}

/// Split `host:port`, defaulting the port when it is omitted.
fn parse_address(address: &str) -> Result<(String, u16)> {
    let address = address.trim();
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|e| {
                BulkLoadError::Config(format!("invalid port in address '{address}': {e}"))
            })?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(BulkLoadError::Config(format!("missing host in address '{address}'"))),
        None if address.is_empty() => Err(BulkLoadError::Config("empty address".into())),
        None => Ok((address.to_string(), DEFAULT_PORT)),
    }
}

/// Quote an identifier for use in DDL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Drop that terminates sessions still attached to the previous attempt's
/// database (PostgreSQL 13+).
fn drop_database_statement(quoted: &str) -> String {
    format!("DROP DATABASE IF EXISTS {quoted} WITH (FORCE)")
}

fn map_pg_error(err: tokio_postgres::Error) -> BulkLoadError {
    BulkLoadError::from(InfraError::from(err))
}

fn map_tls_error(err: native_tls::Error) -> BulkLoadError {
    BulkLoadError::from(InfraError::from(err))
}
