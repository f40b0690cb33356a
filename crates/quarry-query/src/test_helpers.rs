//! Test doubles for the execution paths
//!
//! [`MockConnection`] hands out sessions that answer from canned results
//! chosen by SQL substring, and records every statement they receive.

use async_trait::async_trait;
use quarry_core::{
    Connection, ExecReport, FieldDescriptor, KeyUsage, MetadataSource, QuarryError, RawResult,
    Result, Row, Session, Value,
};
use std::sync::Arc;

pub struct MockConnection {
    pub driver: String,
    /// Statements containing this pattern fail with a server error
    pub fail_on: Option<String>,
    /// SQL-pattern-based responses, first match wins
    pub query_responses: Vec<(String, RawResult)>,
    pub sessions_acquired: Arc<parking_lot::Mutex<usize>>,
    /// Log of every statement and schema switch, in order
    pub query_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            driver: "mock".to_string(),
            fail_on: None,
            query_responses: Vec::new(),
            sessions_acquired: Arc::new(parking_lot::Mutex::new(0)),
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure_on(mut self, sql_contains: impl Into<String>) -> Self {
        self.fail_on = Some(sql_contains.into());
        self
    }

    /// Register a response for statements containing `sql_contains`
    pub fn with_query_response(mut self, sql_contains: impl Into<String>, result: RawResult) -> Self {
        self.query_responses.push((sql_contains.into(), result));
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    pub fn sessions_acquired(&self) -> usize {
        *self.sessions_acquired.lock()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn dialect_id(&self) -> &'static str {
        "mysql"
    }

    async fn acquire(&self) -> Result<Box<dyn Session>> {
        *self.sessions_acquired.lock() += 1;
        Ok(Box::new(MockSession {
            fail_on: self.fail_on.clone(),
            query_responses: self.query_responses.clone(),
            query_log: Arc::clone(&self.query_log),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

pub struct MockSession {
    fail_on: Option<String>,
    query_responses: Vec<(String, RawResult)>,
    query_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

#[async_trait]
impl Session for MockSession {
    async fn query(&mut self, sql: &str) -> Result<RawResult> {
        self.query_log.lock().push(sql.to_string());

        if let Some(pattern) = &self.fail_on {
            if sql.contains(pattern.as_str()) {
                return Err(QuarryError::Server {
                    code: 1064,
                    state: "42000".into(),
                    message: "You have an error in your SQL syntax".into(),
                });
            }
        }

        for (pattern, result) in &self.query_responses {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }

        Ok(RawResult::Report(ExecReport::default()))
    }

    async fn use_schema(&mut self, schema: &str) -> Result<()> {
        self.query_log.lock().push(format!("USE {}", schema));
        Ok(())
    }
}

/// Metadata lookups answered from fixed data, logged through the session
pub struct FixedMetadata {
    pub columns: Vec<FieldDescriptor>,
    pub keys: Vec<KeyUsage>,
}

#[async_trait]
impl MetadataSource for FixedMetadata {
    async fn table_columns(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        session
            .query(&format!("-- columns of {}.{}", schema, table))
            .await?;
        Ok(self
            .columns
            .iter()
            .filter(|c| c.table.as_deref() == Some(table))
            .cloned()
            .collect())
    }

    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<KeyUsage>> {
        session
            .query(&format!("-- keys of {}.{}", schema, table))
            .await?;
        Ok(self
            .keys
            .iter()
            .filter(|k| k.table.as_deref() == Some(table))
            .cloned()
            .collect())
    }
}

/// Single-column row set
pub fn rows(column: &str, values: &[i64]) -> RawResult {
    RawResult::Rows {
        fields: Vec::new(),
        rows: values
            .iter()
            .map(|v| Row::new(vec![column.to_string()], vec![Value::Int64(*v)]))
            .collect(),
    }
}
