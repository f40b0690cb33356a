//! Connection and session traits

use crate::{RawResult, Result};
use async_trait::async_trait;

/// A pooled connection source for one database server
///
/// Independent callers may hold sessions concurrently up to the pool size.
/// Work that must run in order (a statement batch, a DDL plan) acquires one
/// session and keeps it for the whole sequence.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mysql")
    fn driver_name(&self) -> &str;

    /// Dialect code used to look up the [`crate::DialectProfile`]
    fn dialect_id(&self) -> &'static str;

    /// Take a session out of the pool
    async fn acquire(&self) -> Result<Box<dyn Session>>;

    /// Close the pool; sessions already handed out finish their work first
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// One physical database session
///
/// Statements run one at a time. Returning the session to the pool happens on
/// drop.
#[async_trait]
pub trait Session: Send {
    /// Run a single SQL statement and collect its result
    async fn query(&mut self, sql: &str) -> Result<RawResult>;

    /// Make `schema` the default for following statements
    async fn use_schema(&mut self, schema: &str) -> Result<()>;
}
