//! Driver registry for managing available database drivers

use quarry_core::{
    Connection, ConnectionConfig, DatabaseDriver, DialectProfile, QuarryError, Result,
    get_dialect_profile,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available database drivers, keyed by driver id
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "mysql")]
        {
            registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
            registry.register(Arc::new(crate::mysql::MySqlDriver::maria()));
        }

        registry
    }

    /// Register a new driver, replacing one with the same id
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let id = driver.id().to_string();
        tracing::info!(driver = %id, "registering database driver");
        self.drivers.insert(id, driver);
    }

    /// Get a driver by id or by any alias of its dialect (`mariadb`,
    /// `MySQL`, ...)
    pub fn get(&self, code: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(&code.to_ascii_lowercase()).cloned().or_else(|| {
            get_dialect_profile(code).and_then(|profile| self.drivers.get(profile.id).cloned())
        });
        if driver.is_none() {
            tracing::warn!(driver = %code, "driver not found in registry");
        }
        driver
    }

    /// Registered driver ids, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if a driver is registered
    pub fn has(&self, code: &str) -> bool {
        self.drivers.contains_key(&code.to_ascii_lowercase())
    }

    /// Dialect profile of a registered driver
    pub fn dialect_profile(&self, code: &str) -> Option<Arc<DialectProfile>> {
        self.get(code)
            .and_then(|driver| driver.dialect_profile().ok())
    }

    /// Open a connection with the driver named by `config.driver`
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let driver = self.get(&config.driver).ok_or_else(|| {
            QuarryError::NotSupported(format!("No driver registered for '{}'", config.driver))
        })?;
        driver.connect(config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = DriverRegistry::new();
        assert!(registry.list().is_empty());
        assert!(registry.get("mysql").is_none());
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_defaults_resolve_aliases() {
        let registry = DriverRegistry::with_defaults();

        assert_eq!(registry.list(), vec!["maria", "mysql"]);
        assert!(registry.has("MySQL"));
        assert_eq!(registry.get("mariadb").map(|d| d.id()), Some("maria"));
        assert_eq!(
            registry.dialect_profile("maria").map(|p| p.display_name),
            Some("MariaDB")
        );
    }

    #[tokio::test]
    async fn test_connect_unknown_driver() {
        let registry = DriverRegistry::new();
        let config = ConnectionConfig::new("oracle", "localhost");

        let err = registry.connect(&config).await.err();
        assert!(matches!(err, Some(QuarryError::NotSupported(_))));
    }
}
