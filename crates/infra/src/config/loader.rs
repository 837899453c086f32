//! Configuration loader
//!
//! Loads benchmark configuration from a file, then applies environment
//! overrides and validates the result.
//!
//! ## Loading Strategy
//! 1. Use the explicit path if one is given, otherwise probe standard
//!    locations
//! 2. Parse as TOML or JSON depending on the file extension
//! 3. Apply environment overrides
//! 4. Validate value ranges
//!
//! ## Environment Variables
//! - `BULKLOAD_PASSWORD`: Database password (never stored in config output)
//! - `BULKLOAD_DATABASE`: Target database name
//! - `BULKLOAD_ADDRESSES`: `;`-separated `host:port` list
//!
//! ## File Locations
//! Without an explicit path, candidates are checked in this order:
//! 1. `./bulkload.toml`, `./config.toml`, `./bulkload.json`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use bulkload_domain::constants::{ENV_ADDRESSES, ENV_DATABASE, ENV_PASSWORD};
use bulkload_domain::{BulkLoadError, Config, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["bulkload.toml", "config.toml", "bulkload.json", "config.json"];

/// Load, override and validate configuration
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `BulkLoadError::Config` if:
/// - No config file is found or the given one does not exist
/// - File format is invalid or required fields are missing
/// - Validation fails after overrides
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = load_from_file(path)?;
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file without overrides or validation
///
/// # Errors
/// Returns `BulkLoadError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BulkLoadError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BulkLoadError::Config(
                "No bulkload.toml, config.toml, bulkload.json or config.json found".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BulkLoadError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Deserialize `contents` using the format implied by `path`.
///
/// Files without an extension are read as TOML.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents).map_err(|e| InfraError::from(e).into()),
        _ => Err(BulkLoadError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Apply `BULKLOAD_*` environment overrides in place.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(password) = env_value(ENV_PASSWORD) {
        tracing::debug!("Database password taken from environment");
        config.connection.password = Some(password);
    }
    if let Some(database) = env_value(ENV_DATABASE) {
        tracing::debug!(database = %database, "Target database overridden from environment");
        config.connection.database = database;
    }
    if let Some(addresses) = env_value(ENV_ADDRESSES) {
        config.connection.addresses = split_addresses(&addresses);
        tracing::debug!(
            addresses = config.connection.addresses.len(),
            "Addresses overridden from environment"
        );
    }
}

/// Search the standard locations for a config file
///
/// # Returns
/// The first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    find_config_in(&roots)
}

fn find_config_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Non-empty value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const TOML_CONTENT: &str = r#"
[project]
dataset_dir = "dataset"
results_dir = "results"

[connection]
addresses = ["localhost:5432"]
database = "bulkload"

[loading]
schema_file = "schema"
data_files = ["entities", "relations"]
loader_type = "carousel"
batch_sizes = [100]
transaction_counts = [4]
"#;

    fn write_with_extension(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        (temp_file, path)
    }

    fn clear_env() {
        std::env::remove_var(ENV_PASSWORD);
        std::env::remove_var(ENV_DATABASE);
        std::env::remove_var(ENV_ADDRESSES);
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_file, path) = write_with_extension(TOML_CONTENT, "toml");

        let config = load_from_file(Some(path.clone())).expect("Should load config from TOML file");
        assert_eq!(config.connection.database, "bulkload");
        assert_eq!(config.loading.data_files, vec!["entities", "relations"]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_applies_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_PASSWORD, "s3cret");
        std::env::set_var(ENV_DATABASE, "bulkload_ci");
        std::env::set_var(ENV_ADDRESSES, "db-1:5432; db-2:5433;");
        let (_file, path) = write_with_extension(TOML_CONTENT, "toml");

        let config = load(Some(path.clone())).expect("Should load with overrides");

        assert_eq!(config.connection.password.as_deref(), Some("s3cret"));
        assert_eq!(config.connection.database, "bulkload_ci");
        assert_eq!(config.connection.addresses, vec!["db-1:5432", "db-2:5433"]);

        clear_env();
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_DATABASE, "   ");
        let (_file, path) = write_with_extension(TOML_CONTENT, "toml");

        let config = load(Some(path.clone())).expect("Should load");
        assert_eq!(config.connection.database, "bulkload");

        clear_env();
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        let invalid = TOML_CONTENT.replace("batch_sizes = [100]", "batch_sizes = [0]");
        let (_file, path) = write_with_extension(&invalid, "toml");

        let err = load(Some(path.clone())).unwrap_err();
        assert!(matches!(err, BulkLoadError::Config(_)), "Should be a Config error");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/bulkload.toml")));

        let err = result.unwrap_err();
        assert!(matches!(err, BulkLoadError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let result = parse_config("[project", &PathBuf::from("bulkload.toml"));
        assert!(matches!(result, Err(BulkLoadError::Config(_))));
    }

    #[test]
    fn test_find_config_prefers_earlier_roots_and_names() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("config.json"), "{}").unwrap();
        std::fs::write(second.path().join("bulkload.toml"), "").unwrap();
        std::fs::write(first.path().join("bulkload.toml"), "").unwrap();

        let found = find_config_in(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(found, Some(first.path().join("bulkload.toml")));

        let none = find_config_in(&[tempfile::tempdir().unwrap().path().to_path_buf()]);
        assert_eq!(none, None);
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(split_addresses("a:1;b:2"), vec!["a:1", "b:2"]);
        assert!(split_addresses(" ; ").is_empty());
    }
}
