//! Configuration management.
//!
//! Settings come from a TOML file, then environment variables override
//! individual keys. Loaded once at startup.

use crate::models::{ColumnDef, IndexDefinition, TableSchema};
use crate::observability::{LogFormat, LoggingConfig, MetricsConfig};
use crate::services::{DEFAULT_DATABASE, DEFAULT_TABLE, StoreSettings};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CHUNKBASE_CONFIG_PATH";

/// Default workspace directory.
pub const DEFAULT_WORKSPACE: &str = "./workspace";
/// Default UI host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default UI port.
pub const DEFAULT_PORT: u16 = 7860;

/// Main configuration for chunkbase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkbaseConfig {
    /// Where and what to store.
    pub storage: StorageConfig,
    /// Form UI listener.
    pub server: ServerConfig,
    /// Logging.
    pub logging: LoggingConfig,
    /// Metrics.
    pub metrics: MetricsConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageConfig {
    /// Workspace directory, or `:memory:`.
    pub workspace: String,
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Full-text index created at startup.
    pub index: IndexDefinition,
    /// Table columns.
    pub columns: TableSchema,
}

/// Form UI listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Logging section.
    pub logging: Option<LoggingConfig>,
    /// Metrics section.
    pub metrics: Option<MetricsConfig>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileStorage {
    /// Workspace directory.
    pub workspace: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Table name.
    pub table: Option<String>,
    /// Full-text index.
    pub index: Option<IndexDefinition>,
    /// Table columns.
    pub columns: Option<Vec<ColumnDef>>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileServer {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let store = StoreSettings::default();
        Self {
            workspace: DEFAULT_WORKSPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            index: store.index,
            columns: store.schema,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for ChunkbaseConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ChunkbaseConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or its columns
    /// do not form a valid schema.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/chunkbase/config.toml` on
    /// Linux), then `./chunkbase.toml`. Returns defaults if neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is invalid.
    pub fn load_default() -> Result<Self> {
        match Self::default_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Candidate config file locations, in lookup order.
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(base_dirs) = directories::BaseDirs::new() {
            paths.push(base_dirs.config_dir().join("chunkbase").join("config.toml"));
        }
        paths.push(PathBuf::from("chunkbase.toml"));
        paths
    }

    /// Converts a `ConfigFile` to `ChunkbaseConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(storage) = file.storage {
            if let Some(workspace) = storage.workspace {
                config.storage.workspace = workspace;
            }
            if let Some(database) = storage.database {
                config.storage.database = database;
            }
            if let Some(table) = storage.table {
                config.storage.table = table;
            }
            if let Some(index) = storage.index {
                config.storage.index = index;
            }
            if let Some(columns) = storage.columns {
                config.storage.columns = TableSchema::new(columns)?;
            }
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(metrics) = file.metrics {
            config.metrics = metrics;
        }

        Ok(config)
    }

    /// Applies `CHUNKBASE_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an unparsable value.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a key lookup (the environment, in production).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a value does not parse.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(workspace) = lookup("CHUNKBASE_WORKSPACE") {
            self.storage.workspace = workspace;
        }
        if let Some(database) = lookup("CHUNKBASE_DATABASE") {
            self.storage.database = database;
        }
        if let Some(table) = lookup("CHUNKBASE_TABLE") {
            self.storage.table = table;
        }
        if let Some(host) = lookup("CHUNKBASE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CHUNKBASE_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::InvalidInput(format!("CHUNKBASE_PORT '{port}' is not a port")))?;
        }
        if let Some(format) = lookup("CHUNKBASE_LOG_FORMAT") {
            self.logging.format = format.parse::<LogFormat>()?;
        }
        if let Some(file) = lookup("CHUNKBASE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = lookup("CHUNKBASE_METRICS_ENABLED") {
            self.metrics.enabled = parse_bool(&enabled);
        }
        Ok(self)
    }

    /// Store settings for [`ChunkStore::open`](crate::ChunkStore::open).
    #[must_use]
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            database: self.storage.database.clone(),
            table: self.storage.table.clone(),
            schema: self.storage.columns.clone(),
            index: self.storage.index.clone(),
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::operation("serialize_config", e))
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnType, IndexKind};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ChunkbaseConfig::default();
        assert_eq!(config.storage.database, "my_db");
        assert_eq!(config.storage.table, "my_table");
        assert_eq!(config.storage.index.name, "my_index");
        assert_eq!(config.server.port, 7860);
        assert_eq!(
            config.storage.columns.column("vector").unwrap().column_type,
            ColumnType::Vector { dimension: 4 }
        );
    }

    #[test]
    fn test_from_toml_overrides_sections() {
        let config = ChunkbaseConfig::from_toml(
            r#"
            [storage]
            workspace = "/tmp/chunks"
            table = "docs"

            [storage.index]
            name = "docs_text"
            column = "chunk_text"
            kind = "fulltext"

            [[storage.columns]]
            name = "chunk_text"
            type = "varchar"
            default = ""

            [[storage.columns]]
            name = "file_uuid"
            type = "varchar"

            [[storage.columns]]
            name = "filename"
            type = "varchar"

            [[storage.columns]]
            name = "vector"
            type = "vector, 768, float"

            [server]
            port = 9000

            [logging]
            format = "json"

            [metrics]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.workspace, "/tmp/chunks");
        assert_eq!(config.storage.database, "my_db");
        assert_eq!(config.storage.table, "docs");
        assert_eq!(config.storage.index.kind, IndexKind::FullText);
        assert_eq!(
            config.storage.columns.column("vector").unwrap().column_type,
            ColumnType::Vector { dimension: 768 }
        );
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_from_toml_rejects_bad_columns() {
        let result = ChunkbaseConfig::from_toml(
            r#"
            [[storage.columns]]
            name = "_hidden"
            type = "varchar"
            "#,
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(ChunkbaseConfig::from_toml("[storage]\nunknown = 1").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CHUNKBASE_WORKSPACE", ":memory:"),
            ("CHUNKBASE_PORT", "8080"),
            ("CHUNKBASE_LOG_FORMAT", "json"),
            ("CHUNKBASE_METRICS_ENABLED", "yes"),
        ]
        .into_iter()
        .collect();
        let config = ChunkbaseConfig::default()
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.storage.workspace, ":memory:");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_env_override_bad_port() {
        let result = ChunkbaseConfig::default()
            .apply_overrides(|key| (key == "CHUNKBASE_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = ChunkbaseConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[storage.index]"));
        assert_eq!(ChunkbaseConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\n").unwrap();
        let config = ChunkbaseConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(ChunkbaseConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }
}
