//! Database driver trait definition

use crate::{Connection, QuarryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique driver identifier (e.g., "mysql")
    fn id(&self) -> &'static str;

    /// Human-readable driver name
    fn name(&self) -> &'static str;

    /// Driver version
    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Dialect code of the SQL this driver speaks
    fn dialect_id(&self) -> &'static str;

    /// Default connection port
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Get the dialect profile for this driver
    fn dialect_profile(&self) -> Result<Arc<crate::DialectProfile>> {
        crate::dialect_profile(self.dialect_id())
    }

    /// Create a new connection pool
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Connect, run a trivial round trip, and close again
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let connection = self.connect(config).await?;
        let mut session = connection.acquire().await?;
        session.query("SELECT 1").await?;
        drop(session);
        connection.close().await
    }
}

fn default_pool_size() -> usize {
    1
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "mysql", "maria")
    pub driver: String,
    pub host: String,
    /// Port number (0 for the driver default)
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Default schema of new sessions
    #[serde(default)]
    pub schema: Option<String>,
    /// Maximum number of pooled sessions
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str, host: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: host.to_string(),
            port: 0,
            user: None,
            password: None,
            schema: None,
            pool_size: default_pool_size(),
        }
    }

    /// Create a MySQL configuration
    pub fn new_mysql(host: &str, port: u16, user: &str) -> Self {
        Self::new("mysql", host).with_port(port).with_user(user)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Port to dial, falling back to `default` when unset
    pub fn port_or(&self, default: u16) -> u16 {
        if self.port == 0 { default } else { self.port }
    }

    /// Reject configurations no driver can use
    pub fn validate(&self) -> Result<()> {
        if self.driver.trim().is_empty() {
            return Err(QuarryError::Configuration("driver is required".into()));
        }
        if self.host.trim().is_empty() {
            return Err(QuarryError::Configuration("host is required".into()));
        }
        if self.pool_size == 0 {
            return Err(QuarryError::Configuration(
                "pool_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("mysql", "127.0.0.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_fallback() {
        let config = ConnectionConfig::new("mysql", "db.local");
        assert_eq!(config.port_or(3306), 3306);
        assert_eq!(config.with_port(3307).port_or(3306), 3307);
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let config = ConnectionConfig::new_mysql("localhost", 3306, "root").with_pool_size(0);
        assert!(matches!(
            config.validate(),
            Err(QuarryError::Configuration(_))
        ));
        assert!(config.with_pool_size(2).validate().is_ok());
    }
}
