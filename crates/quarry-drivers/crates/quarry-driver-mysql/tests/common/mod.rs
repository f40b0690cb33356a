//! Scripted MySQL server for client tests
//!
//! Sessions answer by SQL substring, first match wins, and record every
//! statement. Unmatched statements succeed with an empty report.

use async_trait::async_trait;
use quarry_core::{
    Connection, ExecReport, FieldMeta, QuarryError, RawResult, Result, Row, Session, Value,
};
use std::sync::Arc;

pub struct MockConnection {
    responses: Vec<(String, RawResult)>,
    /// Statements containing the pattern fail with the server code
    failure: Option<(String, u16)>,
    sessions: Arc<parking_lot::Mutex<usize>>,
    log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            failure: None,
            sessions: Arc::new(parking_lot::Mutex::new(0)),
            log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn respond(mut self, sql_contains: &str, rows: Vec<Row>) -> Self {
        self.responses.push((
            sql_contains.to_string(),
            RawResult::Rows {
                fields: Vec::new(),
                rows,
            },
        ));
        self
    }

    pub fn respond_raw(mut self, sql_contains: &str, result: RawResult) -> Self {
        self.responses.push((sql_contains.to_string(), result));
        self
    }

    pub fn fail_on(mut self, sql_contains: &str, code: u16) -> Self {
        self.failure = Some((sql_contains.to_string(), code));
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn sessions(&self) -> usize {
        *self.sessions.lock()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    fn dialect_id(&self) -> &'static str {
        "mysql"
    }

    async fn acquire(&self) -> Result<Box<dyn Session>> {
        *self.sessions.lock() += 1;
        Ok(Box::new(MockSession {
            responses: self.responses.clone(),
            failure: self.failure.clone(),
            log: Arc::clone(&self.log),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

struct MockSession {
    responses: Vec<(String, RawResult)>,
    failure: Option<(String, u16)>,
    log: Arc<parking_lot::Mutex<Vec<String>>>,
}

#[async_trait]
impl Session for MockSession {
    async fn query(&mut self, sql: &str) -> Result<RawResult> {
        self.log.lock().push(sql.to_string());

        if let Some((pattern, code)) = &self.failure {
            if sql.contains(pattern.as_str()) {
                return Err(QuarryError::Server {
                    code: *code,
                    state: "42000".into(),
                    message: format!("server rejected statement ({})", code),
                });
            }
        }

        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| RawResult::Report(ExecReport::default())))
    }

    async fn use_schema(&mut self, schema: &str) -> Result<()> {
        self.log.lock().push(format!("USE `{}`", schema));
        Ok(())
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
}

pub fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Field of a result set read from `schema.table`
pub fn table_field(schema: &str, table: &str, name: &str) -> FieldMeta {
    FieldMeta {
        name: name.to_string(),
        alias: name.to_string(),
        org_name: name.to_string(),
        schema: Some(schema.to_string()),
        table_alias: Some(table.to_string()),
        org_table: Some(table.to_string()),
        type_name: "INT".to_string(),
        ..Default::default()
    }
}
