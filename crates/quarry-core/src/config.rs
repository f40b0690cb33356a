//! Engine configuration
//!
//! Loaded from TOML. The default location is `<config dir>/quarry/config.toml`;
//! a missing file yields the defaults.

use crate::{ConnectionConfig, QuarryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingSettings,
    pub query: QueryDefaults,
    pub objects: ObjectSettings,
    /// Named connection profiles
    pub connections: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    /// Also write JSON logs to the data directory
    pub json_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json_file: false,
        }
    }
}

/// Defaults for statement execution options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub split: bool,
    pub details: bool,
    pub comments: bool,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            split: true,
            details: false,
            comments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSettings {
    /// Prefix of the temporary names used by recreate plans
    pub temp_prefix: String,
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            temp_prefix: "quarry".to_string(),
        }
    }
}

impl EngineConfig {
    /// `<config dir>/quarry/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("quarry").join("config.toml"))
            .ok_or_else(|| {
                QuarryError::Configuration("Could not determine config directory".into())
            })
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        for (name, connection) in &config.connections {
            connection.validate().map_err(|e| {
                QuarryError::Configuration(format!("connection '{}': {}", name, e))
            })?;
        }
        Ok(config)
    }

    /// Load from `path`; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), connections = config.connections.len(), "loaded configuration");
        Ok(config)
    }

    /// Load from `path` or the default location, falling back to defaults
    /// when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| QuarryError::NotFound(format!("No connection named '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"
[logging]
filter = "info,quarry_query=debug"
json_file = true

[query]
details = true

[objects]
temp_prefix = "tmp"

[connections.local]
driver = "mysql"
host = "127.0.0.1"
port = 3306
user = "root"
schema = "app"
pool_size = 4
"#;

    #[test]
    fn test_parse_full_document() {
        let config = EngineConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.logging.filter, "info,quarry_query=debug");
        assert!(config.logging.json_file);
        assert!(config.query.split);
        assert!(config.query.details);
        assert_eq!(config.objects.temp_prefix, "tmp");

        let local = config.connection("local").unwrap();
        assert_eq!(local.driver, "mysql");
        assert_eq!(local.port, 3306);
        assert_eq!(local.schema.as_deref(), Some("app"));
        assert_eq!(local.pool_size, 4);
        assert_eq!(local.password, None);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.objects.temp_prefix, "quarry");
    }

    #[test]
    fn test_invalid_connection_rejected() {
        let err = EngineConfig::from_toml(
            "[connections.bad]\ndriver = \"mysql\"\nhost = \"h\"\npool_size = 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("connection 'bad'"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = EngineConfig::load_or_default(Some(file.path())).unwrap();
        assert!(config.connections.contains_key("local"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_unknown_connection() {
        let config = EngineConfig::default();
        assert!(matches!(
            config.connection("nope"),
            Err(QuarryError::NotFound(_))
        ));
    }
}
