//! Statement execution
//!
//! A [`QueryRunner`] runs a batch on one session taken from the connection
//! pool: optional schema switch, then every statement strictly in order. The
//! first failure aborts the batch; statements that already ran stay applied.

use super::splitter::{split_statements, strip_comments};
use crate::builder::QueryBuilder;
use indexmap::IndexMap;
use quarry_core::{
    Connection, DdlPlan, DialectProfile, FieldDescriptor, MetadataSource, QuarryError,
    QueryDefaults, QueryOutcome, Result, ResultSet, Session,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// Options of one [`QueryRunner::execute`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Schema made the session default before the batch
    pub schema: Option<String>,
    /// Split the text into statements; off for routine and trigger bodies
    pub split: bool,
    /// Merge column descriptors and key usage into each result's fields
    pub details: bool,
    /// Keep comments; when off they are stripped before splitting
    pub comments: bool,
    /// Name result columns `table.column`
    #[serde(default)]
    pub nest: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn with_details(mut self, details: bool) -> Self {
        self.details = details;
        self
    }

    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_nest(mut self, nest: bool) -> Self {
        self.nest = nest;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            schema: None,
            split: true,
            details: false,
            comments: true,
            nest: false,
        }
    }
}

impl From<&QueryDefaults> for QueryOptions {
    fn from(defaults: &QueryDefaults) -> Self {
        Self {
            schema: None,
            split: defaults.split,
            details: defaults.details,
            comments: defaults.comments,
            nest: false,
        }
    }
}

/// Sequential executor bound to one dialect
#[derive(Clone)]
pub struct QueryRunner {
    profile: Arc<DialectProfile>,
    metadata: Option<Arc<dyn MetadataSource>>,
}

impl QueryRunner {
    pub fn new(profile: Arc<DialectProfile>) -> Self {
        Self {
            profile,
            metadata: None,
        }
    }

    /// Source of the column and key lookups used by `details`
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    /// Statements `sql` would run as under `options`
    pub fn statements(&self, sql: &str, options: &QueryOptions) -> Vec<String> {
        let text = if options.comments {
            Cow::Borrowed(sql)
        } else {
            Cow::Owned(strip_comments(sql, &self.profile))
        };

        if options.split {
            split_statements(&text, &self.profile)
        } else {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }

    /// Execute a raw SQL batch
    ///
    /// # Errors
    /// The first failing statement's error, carrying that statement's text.
    #[tracing::instrument(
        skip(self, connection, sql, options),
        fields(sql_preview = %preview(sql), schema = ?options.schema)
    )]
    pub async fn execute(
        &self,
        connection: &dyn Connection,
        sql: &str,
        options: &QueryOptions,
    ) -> Result<QueryOutcome> {
        let statements = self.statements(sql, options);
        if statements.is_empty() {
            return Ok(QueryOutcome::Multiple(Vec::new()));
        }
        let mut session = connection.acquire().await?;

        if let Some(schema) = options.schema.as_deref() {
            session.use_schema(schema).await?;
        }

        let mut results = Vec::with_capacity(statements.len());
        for statement in statements {
            let started = Instant::now();
            let raw = session
                .query(&statement)
                .await
                .map_err(|e| e.with_statement(statement.as_str()))?;
            let duration = started.elapsed();

            tracing::debug!(
                statement = %preview(&statement),
                duration_ms = duration.as_millis() as u64,
                "statement executed"
            );

            let mut result = ResultSet::from_raw(statement, duration, raw);
            if options.details {
                self.enrich(session.as_mut(), &mut result, options.schema.as_deref())
                    .await?;
            }
            if options.nest {
                result.nest_columns();
            }
            results.push(result);
        }

        Ok(QueryOutcome::from_results(results))
    }

    /// Render `query` for this runner's dialect and execute it
    pub async fn run(
        &self,
        connection: &dyn Connection,
        query: &QueryBuilder,
        options: &QueryOptions,
    ) -> Result<QueryOutcome> {
        let sql = query.to_sql(&self.profile)?;
        self.execute(connection, &sql, options).await
    }

    /// Run a DDL plan step by step on one session
    ///
    /// # Errors
    /// `PlanStep` with the 1-based index of the failing step. Earlier steps
    /// stay applied.
    #[tracing::instrument(skip(self, connection, plan), fields(steps = plan.len()))]
    pub async fn execute_plan(
        &self,
        connection: &dyn Connection,
        plan: &DdlPlan,
        schema: Option<&str>,
    ) -> Result<Vec<ResultSet>> {
        let mut session = connection.acquire().await?;
        if let Some(schema) = schema {
            session.use_schema(schema).await?;
        }

        let mut results = Vec::new();
        for (index, step) in plan.steps.iter().enumerate() {
            tracing::info!(step = index + 1, purpose = %step.purpose, "running plan step");

            let statements = if step.split {
                split_statements(&step.sql, &self.profile)
            } else {
                vec![step.sql.trim().to_string()]
            };

            for statement in statements {
                let started = Instant::now();
                let raw = session.query(&statement).await.map_err(|e| {
                    QuarryError::PlanStep {
                        index: index + 1,
                        purpose: step.purpose.clone(),
                        source: Box::new(e.with_statement(statement.as_str())),
                    }
                })?;
                results.push(ResultSet::from_raw(statement, started.elapsed(), raw));
            }
        }

        Ok(results)
    }

    /// Attach column descriptors and key usage per distinct (schema, table).
    ///
    /// Fields without an underlying table inherit the previous field's table.
    async fn enrich(
        &self,
        session: &mut dyn Session,
        result: &mut ResultSet,
        default_schema: Option<&str>,
    ) -> Result<()> {
        let Some(metadata) = self.metadata.as_ref() else {
            return Ok(());
        };

        let mut carried: Option<String> = None;
        let mut targets: Vec<Option<(String, String)>> = Vec::with_capacity(result.fields.len());
        for field in &result.fields {
            if let Some(table) = field.org_table.as_deref().filter(|t| !t.is_empty()) {
                carried = Some(table.to_string());
            }
            let schema = field
                .schema
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(default_schema);
            targets.push(match (schema, carried.as_ref()) {
                (Some(schema), Some(table)) => Some((schema.to_string(), table.clone())),
                _ => None,
            });
        }

        let mut tables: IndexMap<(String, String), Vec<FieldDescriptor>> = IndexMap::new();
        for (schema, table) in targets.iter().flatten() {
            let key = (schema.clone(), table.clone());
            if tables.contains_key(&key) {
                continue;
            }
            let columns = metadata.table_columns(session, schema, table).await?;
            let keys = metadata.key_usage(session, schema, table).await?;
            result.keys.extend(keys);
            tables.insert(key, columns);
        }

        for (field, target) in result.fields.iter_mut().zip(&targets) {
            let Some(columns) = target.as_ref().and_then(|key| tables.get(key)) else {
                continue;
            };
            field.detail = columns.iter().find(|c| c.name == field.org_name).cloned();
        }

        tracing::debug!(tables = tables.len(), "enriched field metadata");
        Ok(())
    }
}

fn preview(sql: &str) -> String {
    sql.chars().take(100).collect()
}
