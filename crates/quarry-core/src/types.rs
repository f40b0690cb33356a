//! Core types for Quarry

use crate::{FieldDescriptor, KeyUsage};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// A database value that can represent any SQL type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit signed integer
    Int8(i8),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer
    UInt64(u64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// UUID
    Uuid(Uuid),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// Time (hour, minute, second, nanosecond)
    Time(NaiveTime),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with timezone (UTC)
    DateTimeUtc(DateTime<Utc>),
    /// JSON value
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            Value::String(s) | Value::Decimal(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(v) => Some(*v),
            Value::String(s) | Value::Decimal(s) => s.trim().parse::<u64>().ok(),
            other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::String(s) | Value::Decimal(s) => s.trim().parse::<f64>().ok(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual form of a scalar value, `None` for NULL and composite values.
    ///
    /// Catalog rows come back as text or numbers depending on the protocol,
    /// so introspection reads every cell through this.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Array(_) => None,
            Value::String(s) | Value::Decimal(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Json(v) => Some(v.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Convert to a plain JSON value for display and export
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::Int8(v) => Json::from(*v),
            Value::Int16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::UInt64(v) => Json::from(*v),
            Value::Float32(v) => Json::from(*v as f64),
            Value::Float64(v) => Json::from(*v),
            Value::Bytes(v) => Json::String(hex::encode_upper(v)),
            Value::Json(v) => v.clone(),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            other => Json::String(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeUtc(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
            Value::Array(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A row from a query result
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    /// Column names
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Text of a named cell; NULL and missing columns are `None`
    pub fn text(&self, name: &str) -> Option<String> {
        self.get_by_name(name).and_then(Value::to_text)
    }

    /// Unsigned number from a named cell
    pub fn u64(&self, name: &str) -> Option<u64> {
        self.get_by_name(name).and_then(Value::as_u64)
    }

    /// Get column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Convert to a HashMap
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Column metadata for one field of a result set, as reported by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Column name as it appears in the result (alias if aliased)
    pub name: String,
    /// Alias given in the query, equal to `name`
    pub alias: String,
    /// Column name in the underlying table
    pub org_name: String,
    /// Schema the column belongs to, when the driver reports one
    pub schema: Option<String>,
    /// Table name as written in the query (possibly an alias)
    pub table_alias: Option<String>,
    /// Underlying table
    pub org_table: Option<String>,
    /// Engine type name, e.g. `VARCHAR`, `LONGTEXT`
    pub type_name: String,
    /// Display length reported by the driver
    pub length: Option<u64>,
    /// Column descriptor merged in by details enrichment
    #[serde(default)]
    pub detail: Option<FieldDescriptor>,
}

/// Acknowledgement of a non-tabular statement (DDL/DML)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecReport {
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
    pub warnings: u16,
    pub info: String,
}

/// What a session returns for a single statement
#[derive(Debug, Clone)]
pub enum RawResult {
    Rows { fields: Vec<FieldMeta>, rows: Vec<Row> },
    Report(ExecReport),
}

impl RawResult {
    /// Rows of a tabular result, empty for reports
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            RawResult::Rows { rows, .. } => rows,
            RawResult::Report(_) => Vec::new(),
        }
    }
}

/// Result record for one executed statement
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    /// Unique result ID
    pub id: Uuid,
    /// The statement that produced this result
    pub statement: String,
    /// Wall-clock time spent in the driver
    pub duration: Duration,
    /// Result rows (empty for non-tabular statements)
    pub rows: Vec<Row>,
    /// Acknowledgement for non-tabular statements
    pub report: Option<ExecReport>,
    /// Field metadata
    pub fields: Vec<FieldMeta>,
    /// Key usage of the tables referenced by `fields`, filled by details enrichment
    pub keys: Vec<KeyUsage>,
}

impl ResultSet {
    /// Build a result record from a raw driver result
    pub fn from_raw(statement: impl Into<String>, duration: Duration, raw: RawResult) -> Self {
        let (rows, report, fields) = match raw {
            RawResult::Rows { fields, rows } => (rows, None, fields),
            RawResult::Report(report) => (Vec::new(), Some(report), Vec::new()),
        };
        Self {
            id: Uuid::new_v4(),
            statement: statement.into(),
            duration,
            rows,
            report,
            fields,
            keys: Vec::new(),
        }
    }

    /// Check if the result has rows
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Rows affected by a non-tabular statement
    pub fn affected_rows(&self) -> u64 {
        self.report.as_ref().map_or(0, |r| r.affected_rows)
    }

    /// Rename every field and row column to `table.column`, so joined tables
    /// with clashing column names stay apart. Fields without a table keep
    /// their name.
    pub fn nest_columns(&mut self) {
        let names: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                match field
                    .table_alias
                    .as_deref()
                    .or(field.org_table.as_deref())
                    .filter(|t| !t.is_empty())
                {
                    Some(table) => format!("{}.{}", table, field.name),
                    None => field.name.clone(),
                }
            })
            .collect();

        for row in &mut self.rows {
            for (column, name) in row.columns.iter_mut().zip(&names) {
                column.clone_from(name);
            }
        }
        for (field, name) in self.fields.iter_mut().zip(names) {
            field.name = name;
        }
    }
}

/// Outcome of executing a batch: one record, or one per statement in order
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Single(ResultSet),
    Multiple(Vec<ResultSet>),
}

impl QueryOutcome {
    pub fn from_results(mut results: Vec<ResultSet>) -> Self {
        if results.len() == 1 {
            QueryOutcome::Single(results.remove(0))
        } else {
            QueryOutcome::Multiple(results)
        }
    }

    /// Flatten into the ordered list of result records
    pub fn into_vec(self) -> Vec<ResultSet> {
        match self {
            QueryOutcome::Single(result) => vec![result],
            QueryOutcome::Multiple(results) => results,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryOutcome::Single(_) => 1,
            QueryOutcome::Multiple(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_text_reads_numbers_and_strings() {
        let row = Row::from_pairs([
            ("Name", Value::from("users")),
            ("Rows", Value::Int64(42)),
            ("Comment", Value::Null),
        ]);

        assert_eq!(row.text("Name").as_deref(), Some("users"));
        assert_eq!(row.text("Rows").as_deref(), Some("42"));
        assert_eq!(row.u64("Rows"), Some(42));
        assert_eq!(row.text("Comment"), None);
        assert_eq!(row.text("Missing"), None);
    }

    #[test]
    fn test_outcome_single_vs_multiple() {
        let make = |sql: &str| {
            ResultSet::from_raw(sql, Duration::ZERO, RawResult::Report(ExecReport::default()))
        };

        assert!(matches!(
            QueryOutcome::from_results(vec![make("SELECT 1")]),
            QueryOutcome::Single(_)
        ));

        let outcome = QueryOutcome::from_results(vec![make("a"), make("b")]);
        assert_eq!(outcome.len(), 2);
        let statements: Vec<_> = outcome.into_vec().into_iter().map(|r| r.statement).collect();
        assert_eq!(statements, vec!["a", "b"]);
    }

    #[test]
    fn test_nest_columns_prefixes_table() {
        let field = |name: &str, alias: Option<&str>, table: Option<&str>| FieldMeta {
            name: name.to_string(),
            table_alias: alias.map(str::to_string),
            org_table: table.map(str::to_string),
            ..Default::default()
        };
        let mut result = ResultSet::from_raw(
            "SELECT o.id, c.id, 1 AS one FROM orders o JOIN customers c",
            Duration::ZERO,
            RawResult::Rows {
                fields: vec![
                    field("id", Some("o"), Some("orders")),
                    field("id", None, Some("customers")),
                    field("one", None, None),
                ],
                rows: vec![Row::new(
                    vec!["id".into(), "id".into(), "one".into()],
                    vec![Value::Int64(1), Value::Int64(2), Value::Int64(1)],
                )],
            },
        );

        result.nest_columns();

        let names: Vec<_> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["o.id", "customers.id", "one"]);
        assert_eq!(result.rows[0].columns(), ["o.id", "customers.id", "one"]);
        assert_eq!(result.rows[0].get_by_name("customers.id"), Some(&Value::Int64(2)));
    }
}
