//! MySQL driver implementation

use async_trait::async_trait;
use quarry_core::{Connection, ConnectionConfig, DatabaseDriver, QuarryError, Result};
use std::sync::Arc;

use crate::MySqlConnection;

/// MySQL and MariaDB database driver
///
/// Both servers speak the same protocol; the two instances differ only in
/// the dialect profile their connections carry.
pub struct MySqlDriver {
    id: &'static str,
    name: &'static str,
}

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self {
            id: "mysql",
            name: "MySQL",
        }
    }

    /// Driver bound to the MariaDB dialect
    pub fn maria() -> Self {
        tracing::debug!("MariaDB driver initialized");
        Self {
            id: "maria",
            name: "MariaDB",
        }
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn dialect_id(&self) -> &'static str {
        self.id
    }

    fn default_port(&self) -> Option<u16> {
        Some(crate::DEFAULT_PORT)
    }

    #[tracing::instrument(skip(self, config), fields(driver = self.id, host = %config.host))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        config.validate()?;
        let profile = self.dialect_profile()?;

        let conn = MySqlConnection::connect(config, profile).await.map_err(|e| {
            tracing::error!(error = %e, "failed to connect to MySQL database");
            match e {
                QuarryError::Server { .. } => e,
                other => QuarryError::Connection(format!(
                    "Failed to connect to {} database: {}",
                    self.name, other
                )),
            }
        })?;

        Ok(Arc::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_identity() {
        let mysql = MySqlDriver::new();
        assert_eq!(mysql.id(), "mysql");
        assert_eq!(mysql.default_port(), Some(3306));
        assert_eq!(mysql.dialect_profile().unwrap().id, "mysql");

        let maria = MySqlDriver::maria();
        assert_eq!(maria.name(), "MariaDB");
        assert_eq!(maria.dialect_profile().unwrap().id, "maria");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = ConnectionConfig::new_mysql("", 3306, "root");
        let err = MySqlDriver::new().connect(&config).await.err().unwrap();
        assert!(matches!(err, QuarryError::Configuration(_)));
    }
}
