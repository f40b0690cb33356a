//! MySQL connection implementation

use async_trait::async_trait;
use mysql_async::{
    Column, Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row as MySqlRow,
    consts::{ColumnFlags, ColumnType},
    prelude::*,
};
use quarry_core::{
    Connection, ConnectionConfig, DialectProfile, ExecReport, FieldMeta, QuarryError, RawResult,
    Result, Row, Session, Value,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Character set id the server reports for binary columns
const BINARY_CHARSET: u16 = 63;

/// Pooled MySQL/MariaDB connection
pub struct MySqlConnection {
    pool: Pool,
    driver: String,
    profile: Arc<DialectProfile>,
    closed: AtomicBool,
}

impl MySqlConnection {
    /// Open a pool and verify it with one round trip
    pub async fn connect(config: &ConnectionConfig, profile: Arc<DialectProfile>) -> Result<Self> {
        let port = config.port_or(crate::DEFAULT_PORT);
        tracing::info!(host = %config.host, port = %port, schema = ?config.schema, "connecting to MySQL server");

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(config.host.as_str())
            .tcp_port(port);

        if let Some(schema) = config.schema.as_deref() {
            opts_builder = opts_builder.db_name(Some(schema));
        }
        if let Some(user) = config.user.as_deref() {
            opts_builder = opts_builder.user(Some(user));
        }
        if let Some(password) = config.password.as_deref() {
            opts_builder = opts_builder.pass(Some(password));
        }

        let max = config.pool_size.max(1);
        let constraints = PoolConstraints::new(1, max).ok_or_else(|| {
            QuarryError::Connection(format!(
                "Failed to configure MySQL pool constraints (min=1, max={})",
                max
            ))
        })?;

        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        let opts: Opts = opts_builder.pool_opts(pool_opts).into();

        let pool = Pool::new(opts);
        // fail fast on bad credentials instead of at the first statement
        let conn = pool.get_conn().await.map_err(connection_error)?;
        drop(conn);

        tracing::info!(host = %config.host, port = %port, pool_size = max, "MySQL connection established");
        Ok(Self {
            pool,
            driver: config.driver.clone(),
            profile,
            closed: AtomicBool::new(false),
        })
    }

    pub fn profile(&self) -> &Arc<DialectProfile> {
        &self.profile
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn dialect_id(&self) -> &'static str {
        self.profile.id
    }

    async fn acquire(&self) -> Result<Box<dyn Session>> {
        if self.is_closed() {
            return Err(QuarryError::Connection("connection pool is closed".into()));
        }
        let conn = self.pool.get_conn().await.map_err(connection_error)?;
        Ok(Box::new(MySqlSession {
            conn,
            profile: Arc::clone(&self.profile),
        }))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing MySQL connection pool");
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(connection_error)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// One pooled MySQL session; the connection returns to the pool on drop
pub struct MySqlSession {
    conn: Conn,
    profile: Arc<DialectProfile>,
}

#[async_trait]
impl Session for MySqlSession {
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&mut self, sql: &str) -> Result<RawResult> {
        let mut result = self.conn.query_iter(sql).await.map_err(server_error)?;

        let raw = match result.columns().filter(|columns| !columns.is_empty()) {
            Some(columns) => {
                let names: Vec<String> = columns
                    .iter()
                    .map(|c| c.name_str().into_owned())
                    .collect();
                let mysql_rows: Vec<MySqlRow> = result.collect().await.map_err(server_error)?;
                let rows = mysql_rows
                    .into_iter()
                    .map(|row| convert_row(row, &columns, &names))
                    .collect::<Vec<_>>();

                tracing::debug!(row_count = rows.len(), "query returned rows");
                RawResult::Rows {
                    fields: columns.iter().map(field_meta).collect(),
                    rows,
                }
            }
            None => {
                let report = ExecReport {
                    affected_rows: result.affected_rows(),
                    last_insert_id: result.last_insert_id(),
                    warnings: result.warnings(),
                    info: result.info().into_owned(),
                };
                tracing::debug!(affected_rows = report.affected_rows, "statement executed");
                RawResult::Report(report)
            }
        };

        // CALL statements append a status result set
        result.drop_result().await.map_err(server_error)?;
        Ok(raw)
    }

    async fn use_schema(&mut self, schema: &str) -> Result<()> {
        let sql = self.profile.schema_switch_sql(schema);
        self.conn.query_drop(sql).await.map_err(server_error)
    }
}

fn connection_error(error: mysql_async::Error) -> QuarryError {
    tracing::error!(error = %error, "MySQL connection failure");
    match error {
        mysql_async::Error::Server(_) => server_error(error),
        other => QuarryError::Connection(format!("Failed to connect to MySQL: {}", other)),
    }
}

/// Keep the server's numeric code so callers can branch on it
fn server_error(error: mysql_async::Error) -> QuarryError {
    match error {
        mysql_async::Error::Server(server) => QuarryError::Server {
            code: server.code,
            state: server.state,
            message: server.message,
        },
        mysql_async::Error::Io(io) => QuarryError::Connection(io.to_string()),
        other => QuarryError::Query(other.to_string()),
    }
}

fn convert_row(mut row: MySqlRow, columns: &[Column], names: &[String]) -> Row {
    let values = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value: mysql_async::Value = row.take(idx).unwrap_or(mysql_async::Value::NULL);
            mysql_value_to_value(value, column)
        })
        .collect();
    Row::new(names.to_vec(), values)
}

fn field_meta(column: &Column) -> FieldMeta {
    let name = column.name_str().into_owned();
    FieldMeta {
        alias: name.clone(),
        name,
        org_name: column.org_name_str().into_owned(),
        schema: non_empty(column.schema_str()),
        table_alias: non_empty(column.table_str()),
        org_table: non_empty(column.org_table_str()),
        type_name: column_type_name(column).to_string(),
        length: Some(u64::from(column.column_length())),
        detail: None,
    }
}

fn non_empty(text: Cow<'_, str>) -> Option<String> {
    Some(text.into_owned()).filter(|t| !t.is_empty())
}

/// Engine type name for a result column
pub(crate) fn column_type_name(column: &Column) -> &'static str {
    let binary = column.character_set() == BINARY_CHARSET;
    match column.column_type() {
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => "DECIMAL",
        ColumnType::MYSQL_TYPE_TINY => "TINYINT",
        ColumnType::MYSQL_TYPE_SHORT => "SMALLINT",
        ColumnType::MYSQL_TYPE_INT24 => "MEDIUMINT",
        ColumnType::MYSQL_TYPE_LONG => "INT",
        ColumnType::MYSQL_TYPE_LONGLONG => "BIGINT",
        ColumnType::MYSQL_TYPE_FLOAT => "FLOAT",
        ColumnType::MYSQL_TYPE_DOUBLE => "DOUBLE",
        ColumnType::MYSQL_TYPE_NULL => "NULL",
        ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_TIMESTAMP2 => "TIMESTAMP",
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => "DATE",
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => "TIME",
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_DATETIME2 => "DATETIME",
        ColumnType::MYSQL_TYPE_YEAR => "YEAR",
        ColumnType::MYSQL_TYPE_BIT => "BIT",
        ColumnType::MYSQL_TYPE_JSON => "JSON",
        ColumnType::MYSQL_TYPE_ENUM => "ENUM",
        ColumnType::MYSQL_TYPE_SET => "SET",
        ColumnType::MYSQL_TYPE_GEOMETRY => "GEOMETRY",
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => {
            if binary { "VARBINARY" } else { "VARCHAR" }
        }
        ColumnType::MYSQL_TYPE_STRING => {
            let flags = column.flags();
            if flags.contains(ColumnFlags::ENUM_FLAG) {
                "ENUM"
            } else if flags.contains(ColumnFlags::SET_FLAG) {
                "SET"
            } else if binary {
                "BINARY"
            } else {
                "CHAR"
            }
        }
        ColumnType::MYSQL_TYPE_TINY_BLOB => {
            if binary { "TINYBLOB" } else { "TINYTEXT" }
        }
        ColumnType::MYSQL_TYPE_MEDIUM_BLOB => {
            if binary { "MEDIUMBLOB" } else { "MEDIUMTEXT" }
        }
        ColumnType::MYSQL_TYPE_LONG_BLOB => {
            if binary { "LONGBLOB" } else { "LONGTEXT" }
        }
        ColumnType::MYSQL_TYPE_BLOB => {
            if binary { "BLOB" } else { "TEXT" }
        }
        _ => "UNKNOWN",
    }
}

/// Convert a wire value using its column's type
fn mysql_value_to_value(val: mysql_async::Value, column: &Column) -> Value {
    let col_type = column.column_type();
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => {
            let binary = column.character_set() == BINARY_CHARSET
                && !matches!(
                    col_type,
                    ColumnType::MYSQL_TYPE_TINY
                        | ColumnType::MYSQL_TYPE_SHORT
                        | ColumnType::MYSQL_TYPE_LONG
                        | ColumnType::MYSQL_TYPE_LONGLONG
                        | ColumnType::MYSQL_TYPE_INT24
                        | ColumnType::MYSQL_TYPE_YEAR
                        | ColumnType::MYSQL_TYPE_FLOAT
                        | ColumnType::MYSQL_TYPE_DOUBLE
                        | ColumnType::MYSQL_TYPE_DECIMAL
                        | ColumnType::MYSQL_TYPE_NEWDECIMAL
                        | ColumnType::MYSQL_TYPE_DATE
                        | ColumnType::MYSQL_TYPE_DATETIME
                        | ColumnType::MYSQL_TYPE_TIMESTAMP
                        | ColumnType::MYSQL_TYPE_TIME
                );
            if binary {
                return Value::Bytes(bytes);
            }
            match String::from_utf8(bytes) {
                Ok(s) => match col_type {
                    ColumnType::MYSQL_TYPE_TINY
                    | ColumnType::MYSQL_TYPE_SHORT
                    | ColumnType::MYSQL_TYPE_LONG
                    | ColumnType::MYSQL_TYPE_INT24
                    | ColumnType::MYSQL_TYPE_YEAR => {
                        s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                    }
                    ColumnType::MYSQL_TYPE_LONGLONG => match s.parse::<i64>() {
                        Ok(v) => Value::Int64(v),
                        Err(_) => s.parse::<u64>().map(Value::UInt64).unwrap_or(Value::String(s)),
                    },
                    ColumnType::MYSQL_TYPE_FLOAT => {
                        s.parse::<f32>().map(Value::Float32).unwrap_or(Value::String(s))
                    }
                    ColumnType::MYSQL_TYPE_DOUBLE => {
                        s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                    }
                    // exact decimals stay textual
                    ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                        Value::Decimal(s)
                    }
                    ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&s)
                        .map(Value::Json)
                        .unwrap_or(Value::String(s)),
                    _ => Value::String(s),
                },
                Err(e) => Value::Bytes(e.into_bytes()),
            }
        }
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => {
            if u <= i64::MAX as u64 {
                Value::Int64(u as i64)
            } else {
                Value::UInt64(u)
            }
        }
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if col_type == ColumnType::MYSQL_TYPE_DATE {
                match date {
                    Some(date) => Value::Date(date),
                    None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
                }
            } else {
                match date
                    .and_then(|d| d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro))
                {
                    Some(dt) => Value::DateTime(dt),
                    // zero dates such as 0000-00-00 00:00:00
                    None => Value::String(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, min, sec
                    )),
                }
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}
