//! Catalog row mappers
//!
//! Turn rows of `SHOW ...` statements and `information_schema` tables into
//! descriptors. Mappers are lenient: a missing optional column becomes
//! `None`, a row without its identifying column is skipped.

use indexmap::IndexMap;
use quarry_core::{
    CollationInfo, EngineInfo, ForeignKeyAction, IndexDescriptor, IndexKind, KeyUsage,
    ParameterMode, ProcessInfo, RoutineParameter, RoutineSummary, Row, SchedulerSummary,
    SchemaStructure, SqlSecurity, TableKind, TableSummary, TriggerSummary, UserInfo,
    VariableInfo, VersionInfo,
};

fn yes(row: &Row, column: &str) -> bool {
    row.text(column)
        .is_some_and(|v| v.to_ascii_uppercase().contains("YES"))
}

/// `SHOW TABLE STATUS` row
pub fn table_summary(row: &Row) -> Option<TableSummary> {
    let comment = row.text("Comment");
    Some(TableSummary {
        name: row.text("Name")?,
        kind: if comment.as_deref() == Some("VIEW") {
            TableKind::View
        } else {
            TableKind::Table
        },
        rows: row.u64("Rows"),
        created: row.text("Create_time"),
        updated: row.text("Update_time"),
        engine: row.text("Engine"),
        comment,
        size: row.u64("Data_length").unwrap_or(0) + row.u64("Index_length").unwrap_or(0),
        auto_increment: row.u64("Auto_increment"),
        collation: row.text("Collation"),
    })
}

/// `SHOW INDEXES` rows, one per indexed column, grouped by key name
pub fn indexes(rows: &[Row]) -> Vec<IndexDescriptor> {
    let mut grouped: IndexMap<String, IndexDescriptor> = IndexMap::new();

    for row in rows {
        let (Some(name), Some(column)) = (row.text("Key_name"), row.text("Column_name")) else {
            continue;
        };
        let index_type = row.text("Index_type");
        let entry = grouped.entry(name.clone()).or_insert_with(|| {
            let unique = row.u64("Non_unique") == Some(0);
            let kind = if name == "PRIMARY" {
                IndexKind::Primary
            } else if unique {
                IndexKind::Unique
            } else {
                match index_type.as_deref() {
                    Some("FULLTEXT") => IndexKind::Fulltext,
                    Some("SPATIAL") => IndexKind::Spatial,
                    _ => IndexKind::Plain,
                }
            };
            IndexDescriptor {
                name: name.clone(),
                kind,
                columns: Vec::new(),
                index_type: index_type.clone(),
                cardinality: row.u64("Cardinality"),
                comment: row.text("Index_comment").filter(|c| !c.is_empty()),
            }
        });
        entry.columns.push(column);
    }

    grouped.into_values().collect()
}

/// `KEY_COLUMN_USAGE` rows joined with their `REFERENTIAL_CONSTRAINTS` rules
pub fn key_usage(usage: &[Row], constraints: &[Row]) -> Vec<KeyUsage> {
    usage
        .iter()
        .filter_map(|row| {
            let constraint = row.text("CONSTRAINT_NAME")?;
            let rules = constraints
                .iter()
                .find(|c| c.text("CONSTRAINT_NAME").as_deref() == Some(constraint.as_str()));
            let action = |column: &str| {
                rules
                    .and_then(|r| r.text(column))
                    .map(|rule| ForeignKeyAction::parse(&rule))
                    .unwrap_or_default()
            };

            Some(KeyUsage {
                field: row.text("COLUMN_NAME")?,
                schema: row.text("TABLE_SCHEMA"),
                table: row.text("TABLE_NAME"),
                ref_schema: row.text("REFERENCED_TABLE_SCHEMA"),
                ref_table: row.text("REFERENCED_TABLE_NAME")?,
                ref_field: row.text("REFERENCED_COLUMN_NAME")?,
                position: row.u64("ORDINAL_POSITION").map(|p| p as u32),
                on_update: action("UPDATE_RULE"),
                on_delete: action("DELETE_RULE"),
                constraint,
            })
        })
        .collect()
}

/// `information_schema.PARAMETERS` rows of one routine, in ordinal order.
/// The return value of a function is the row without a mode and is skipped.
pub fn routine_parameters(rows: &[Row]) -> Vec<RoutineParameter> {
    rows.iter()
        .filter_map(|row| {
            let mode = ParameterMode::parse(&row.text("PARAMETER_MODE")?)?;
            let name = row.text("PARAMETER_NAME")?;
            let data_type = row.text("DATA_TYPE").unwrap_or_default();

            let length = match (row.u64("NUMERIC_PRECISION"), row.u64("NUMERIC_SCALE")) {
                (Some(precision), Some(scale)) if scale > 0 => {
                    Some(format!("{},{}", precision, scale))
                }
                (Some(precision), _) => Some(precision.to_string()),
                _ => row
                    .u64("DATETIME_PRECISION")
                    .filter(|p| *p > 0)
                    .or_else(|| row.u64("CHARACTER_MAXIMUM_LENGTH"))
                    .map(|l| l.to_string()),
            };

            let mut parameter = RoutineParameter::new(name, &data_type).with_context(mode);
            parameter.length = length;
            Some(parameter)
        })
        .collect()
}

/// `SHOW PROCEDURE STATUS` / `SHOW FUNCTION STATUS` row
pub fn routine_summary(row: &Row) -> Option<RoutineSummary> {
    Some(RoutineSummary {
        name: row.text("Name")?,
        definer: row.text("Definer"),
        created: row.text("Created"),
        updated: row.text("Modified"),
        comment: row.text("Comment").filter(|c| !c.is_empty()),
        security: match row.text("Security_type").as_deref() {
            Some("INVOKER") => SqlSecurity::Invoker,
            _ => SqlSecurity::Definer,
        },
    })
}

/// `SHOW TRIGGERS` row
pub fn trigger_summary(row: &Row) -> Option<TriggerSummary> {
    Some(TriggerSummary {
        name: row.text("Trigger")?,
        table: row.text("Table").unwrap_or_default(),
        timing: row.text("Timing").unwrap_or_default(),
        event: row.text("Event").unwrap_or_default(),
        definer: row.text("Definer"),
        created: row.text("Created"),
    })
}

/// `information_schema.EVENTS` row
pub fn scheduler_summary(row: &Row) -> Option<SchedulerSummary> {
    let every = match (row.text("INTERVAL_VALUE"), row.text("INTERVAL_FIELD")) {
        (Some(value), Some(field)) => Some(format!("{} {}", value, field)),
        _ => None,
    };
    Some(SchedulerSummary {
        name: row.text("EVENT_NAME")?,
        definer: row.text("DEFINER"),
        execution: row.text("EVENT_TYPE"),
        every,
        starts: row.text("STARTS"),
        ends: row.text("ENDS"),
        enabled: row.text("STATUS").as_deref() == Some("ENABLED"),
    })
}

/// Objects of every listed schema, gathered from the per-server listings.
///
/// `tables` and `triggers` are keyed by schema since the server lists them
/// per schema; routines and events carry their schema in `Db`/`EVENT_SCHEMA`.
pub struct StructureRows<'a> {
    pub databases: &'a [String],
    pub tables: &'a IndexMap<String, Vec<Row>>,
    pub triggers: &'a IndexMap<String, Vec<Row>>,
    pub procedures: &'a [Row],
    pub functions: &'a [Row],
    pub events: &'a [Row],
}

pub fn structure(rows: StructureRows<'_>) -> Vec<SchemaStructure> {
    let in_schema = |row: &&Row, column: &str, schema: &str| {
        row.text(column).as_deref() == Some(schema)
    };

    rows.databases
        .iter()
        .map(|schema| {
            let tables: Vec<TableSummary> = rows
                .tables
                .get(schema)
                .map(|t| t.iter().filter_map(table_summary).collect())
                .unwrap_or_default();

            SchemaStructure {
                name: schema.clone(),
                size: tables.iter().map(|t| t.size).sum(),
                tables,
                functions: rows
                    .functions
                    .iter()
                    .filter(|r| in_schema(r, "Db", schema))
                    .filter_map(routine_summary)
                    .collect(),
                procedures: rows
                    .procedures
                    .iter()
                    .filter(|r| in_schema(r, "Db", schema))
                    .filter_map(routine_summary)
                    .collect(),
                triggers: rows
                    .triggers
                    .get(schema)
                    .map(|t| t.iter().filter_map(trigger_summary).collect())
                    .unwrap_or_default(),
                schedulers: rows
                    .events
                    .iter()
                    .filter(|r| in_schema(r, "EVENT_SCHEMA", schema))
                    .filter_map(scheduler_summary)
                    .collect(),
            }
        })
        .collect()
}

pub fn user(row: &Row) -> Option<UserInfo> {
    Some(UserInfo {
        name: row.text("user")?,
        host: row.text("host").unwrap_or_default(),
        password: row.text("password"),
    })
}

/// `SHOW COLLATION` row
pub fn collation(row: &Row) -> Option<CollationInfo> {
    Some(CollationInfo {
        charset: row.text("Charset")?,
        collation: row.text("Collation")?,
        id: row.u64("Id"),
        is_default: yes(row, "Default"),
        is_compiled: yes(row, "Compiled"),
        sort_len: row.u64("Sortlen"),
    })
}

/// `SHOW VARIABLES` row
pub fn variable(row: &Row) -> Option<VariableInfo> {
    Some(VariableInfo {
        name: row.text("Variable_name")?,
        value: row.text("Value").unwrap_or_default(),
    })
}

/// `SHOW ENGINES` row
pub fn engine(row: &Row) -> Option<EngineInfo> {
    let support = row.text("Support").unwrap_or_default();
    Some(EngineInfo {
        name: row.text("Engine")?,
        is_default: support.contains("DEFAULT"),
        support,
        comment: row.text("Comment"),
        transactions: row.text("Transactions"),
        xa: row.text("XA"),
        savepoints: row.text("Savepoints"),
    })
}

/// Fold the `version*` variables into a version summary
pub fn version(rows: &[Row]) -> VersionInfo {
    rows.iter().fold(VersionInfo::default(), |mut info, row| {
        let value = row.text("Value").unwrap_or_default();
        match row.text("Variable_name").as_deref() {
            Some("version") => {
                info.number = value.split('-').next().unwrap_or_default().to_string();
            }
            Some("version_comment") => info.name = value.replace("(GPL)", "").trim().to_string(),
            Some("version_compile_machine") => info.arch = value,
            Some("version_compile_os") => info.os = value,
            _ => {}
        }
        info
    })
}

/// `information_schema.PROCESSLIST` row
pub fn process(row: &Row) -> Option<ProcessInfo> {
    Some(ProcessInfo {
        id: row.u64("ID")?,
        user: row.text("USER"),
        host: row.text("HOST"),
        database: row.text("DB"),
        command: row.text("COMMAND"),
        time: row.u64("TIME"),
        state: row.text("STATE"),
        info: row.text("INFO"),
    })
}
