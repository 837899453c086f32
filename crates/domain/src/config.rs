//! Configuration management

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAINTENANCE_DATABASE, DEFAULT_MAXIMUM_TEST_ATTEMPTS, DEFAULT_STATEMENT_EXTENSION,
    DEFAULT_TEST_REATTEMPT_WAIT_SECS,
};
use crate::errors::{BulkLoadError, Result};
use crate::types::{DriverKind, LoaderKind};

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub loading: LoadingConfig,
}

/// Filesystem layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub dataset_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Log files are only written when set
    #[serde(default)]
    pub logs_dir: Option<PathBuf>,
}

/// Database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub driver_type: DriverKind,
    /// `host:port` pairs tried in order
    pub addresses: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Target database, dropped and recreated on every attempt
    pub database: String,
    /// Database used to issue `DROP`/`CREATE DATABASE`
    #[serde(default = "default_maintenance_database")]
    pub maintenance_database: String,
}

/// Synthetic dataset generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub entity_count: u64,
    pub relation_count: u64,
    pub attributes_per_entity: usize,
    pub random_seed: u64,
}

/// Load test parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingConfig {
    pub schema_file: String,
    pub data_files: Vec<String>,
    #[serde(default = "default_statement_extension")]
    pub statement_extension: String,
    pub loader_type: LoaderKind,
    pub batch_sizes: Vec<usize>,
    pub transaction_counts: Vec<usize>,
    /// Seconds to wait before re-starting a failed attempt
    #[serde(default = "default_test_reattempt_wait")]
    pub test_reattempt_wait: u64,
    #[serde(default = "default_maximum_test_attempts")]
    pub maximum_test_attempts: u32,
}

fn default_maintenance_database() -> String {
    DEFAULT_MAINTENANCE_DATABASE.to_string()
}

fn default_statement_extension() -> String {
    DEFAULT_STATEMENT_EXTENSION.to_string()
}

fn default_test_reattempt_wait() -> u64 {
    DEFAULT_TEST_REATTEMPT_WAIT_SECS
}

fn default_maximum_test_attempts() -> u32 {
    DEFAULT_MAXIMUM_TEST_ATTEMPTS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { entity_count: 1_000, relation_count: 1_000, attributes_per_entity: 4, random_seed: 0 }
    }
}

impl Config {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `BulkLoadError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let connection = &self.connection;
        if connection.addresses.is_empty() {
            return Err(invalid("connection.addresses must list at least one host:port"));
        }
        if connection.addresses.iter().any(|address| address.trim().is_empty()) {
            return Err(invalid("connection.addresses must not contain empty entries"));
        }
        if connection.database.trim().is_empty() {
            return Err(invalid("connection.database must not be empty"));
        }
        if connection.driver_type == DriverKind::Cloud
            && (connection.username.is_none() || connection.password.is_none())
        {
            return Err(invalid("cloud driver requires connection.username and a password"));
        }

        let loading = &self.loading;
        if loading.schema_file.trim().is_empty() {
            return Err(invalid("loading.schema_file must not be empty"));
        }
        if loading.data_files.is_empty() {
            return Err(invalid("loading.data_files must list at least one file"));
        }
        if loading.batch_sizes.is_empty() {
            return Err(invalid("loading.batch_sizes must list at least one size"));
        }
        if loading.batch_sizes.contains(&0) {
            return Err(invalid("loading.batch_sizes must be positive"));
        }
        if loading.transaction_counts.is_empty() {
            return Err(invalid("loading.transaction_counts must list at least one count"));
        }
        if loading.transaction_counts.contains(&0) {
            return Err(invalid("loading.transaction_counts must be positive"));
        }
        if loading.maximum_test_attempts == 0 {
            return Err(invalid("loading.maximum_test_attempts must be at least 1"));
        }

        Ok(())
    }

    /// `{dataset_dir}/{schema_file}.{statement_extension}`
    pub fn schema_path(&self) -> PathBuf {
        self.statement_path(&self.loading.schema_file)
    }

    /// `{dataset_dir}/{name}.{statement_extension}`
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.statement_path(name)
    }

    pub fn data_paths(&self) -> Vec<PathBuf> {
        self.loading.data_files.iter().map(|name| self.data_path(name)).collect()
    }

    pub fn reattempt_wait(&self) -> Duration {
        Duration::from_secs(self.loading.test_reattempt_wait)
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.project.dataset_dir
    }

    fn statement_path(&self, name: &str) -> PathBuf {
        self.project.dataset_dir.join(format!("{name}.{}", self.loading.statement_extension))
    }
}

fn invalid(message: &str) -> BulkLoadError {
    BulkLoadError::Config(message.to_string())
}
