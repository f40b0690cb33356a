//! Structural descriptors
//!
//! Normalized read models produced by introspection and consumed by the DDL
//! generators. Field, index and foreign-key descriptors double as the input
//! of table creation and alteration.

use crate::FieldKind;
use serde::{Deserialize, Serialize};

/// A table column, introspected or desired
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    pub name: String,
    /// Type name as written in DDL, upper-cased (e.g. `VARCHAR`)
    pub type_name: String,
    /// Serialization kind resolved from the dialect's type catalog
    pub kind: FieldKind,
    /// The column holds an array of `type_name`
    pub is_array: bool,
    pub schema: Option<String>,
    pub table: Option<String>,
    /// Key membership as reported by the catalog (`pri`, `uni`, `mul`)
    pub key: Option<String>,
    /// Length annotation copied from the engine's CREATE TABLE text
    pub length: Option<String>,
    /// Member list of ENUM/SET types, still quoted: `'a','b'`
    pub enum_values: Option<String>,
    pub num_length: Option<u64>,
    pub num_precision: Option<u64>,
    pub num_scale: Option<u64>,
    pub char_length: Option<u64>,
    pub date_precision: Option<u64>,
    pub nullable: bool,
    pub unsigned: bool,
    pub zerofill: bool,
    /// 1-based ordinal position
    pub order: u32,
    /// Default value as a SQL expression (`'abc'`, `0`, `CURRENT_TIMESTAMP`)
    pub default: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub auto_increment: bool,
    pub on_update: Option<String>,
    pub comment: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.trim().to_ascii_uppercase(),
            kind,
            nullable: true,
            ..Default::default()
        }
    }

    pub fn with_char_length(mut self, length: u64) -> Self {
        self.char_length = Some(length);
        self
    }

    pub fn with_num_length(mut self, length: u64) -> Self {
        self.num_length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u64, scale: Option<u64>) -> Self {
        self.num_precision = Some(precision);
        self.num_scale = scale;
        self
    }

    pub fn with_date_precision(mut self, precision: u64) -> Self {
        self.date_precision = Some(precision);
        self
    }

    pub fn with_enum_values(mut self, values: impl Into<String>) -> Self {
        self.enum_values = Some(values.into());
        self
    }

    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn with_on_update(mut self, expression: impl Into<String>) -> Self {
        self.on_update = Some(expression.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Length argument for DDL, in order of preference: enum/set members,
    /// numeric length (or precision and scale), character length, date
    /// precision.
    pub fn declared_length(&self) -> Option<String> {
        if let Some(values) = self.enum_values.as_ref().filter(|v| !v.is_empty()) {
            return Some(values.clone());
        }
        if let Some(length) = self.num_length {
            return Some(length.to_string());
        }
        if let Some(precision) = self.num_precision {
            return Some(match self.num_scale {
                Some(scale) => format!("{},{}", precision, scale),
                None => precision.to_string(),
            });
        }
        if let Some(length) = self.char_length {
            return Some(length.to_string());
        }
        self.date_precision.map(|p| p.to_string())
    }
}

/// Index kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Primary,
    Unique,
    Fulltext,
    Spatial,
    #[default]
    Plain,
}

impl IndexKind {
    /// Keyword used when declaring the index
    pub fn as_sql(&self) -> &'static str {
        match self {
            IndexKind::Primary => "PRIMARY KEY",
            IndexKind::Unique => "UNIQUE INDEX",
            IndexKind::Fulltext => "FULLTEXT INDEX",
            IndexKind::Spatial => "SPATIAL INDEX",
            IndexKind::Plain => "INDEX",
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, IndexKind::Primary)
    }
}

/// Table index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexDescriptor {
    pub name: String,
    pub kind: IndexKind,
    /// Participating columns in key order
    pub columns: Vec<String>,
    /// Access method (`BTREE`, `HASH`, `FULLTEXT`)
    pub index_type: Option<String>,
    pub cardinality: Option<u64>,
    pub comment: Option<String>,
}

impl IndexDescriptor {
    pub fn new<I, S>(name: impl Into<String>, kind: IndexKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("PRIMARY", IndexKind::Primary, columns)
    }
}

/// Referential action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }

    /// Parse a catalog rule (`CASCADE`, `SET NULL`, ...); unknown rules restrict
    pub fn parse(rule: &str) -> Self {
        match rule.trim().to_ascii_uppercase().as_str() {
            "CASCADE" => ForeignKeyAction::Cascade,
            "SET NULL" => ForeignKeyAction::SetNull,
            "SET DEFAULT" => ForeignKeyAction::SetDefault,
            "NO ACTION" => ForeignKeyAction::NoAction,
            _ => ForeignKeyAction::Restrict,
        }
    }
}

/// Foreign key constraint on one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeyDescriptor {
    pub constraint: String,
    pub field: String,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub ref_schema: Option<String>,
    pub ref_table: String,
    pub ref_field: String,
    /// Ordinal of `field` within the constraint
    pub position: Option<u32>,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

/// Key usage rows attached to result sets are foreign key descriptors
pub type KeyUsage = ForeignKeyDescriptor;

impl ForeignKeyDescriptor {
    pub fn new(
        constraint: impl Into<String>,
        field: impl Into<String>,
        ref_table: impl Into<String>,
        ref_field: impl Into<String>,
    ) -> Self {
        Self {
            constraint: constraint.into(),
            field: field.into(),
            ref_table: ref_table.into(),
            ref_field: ref_field.into(),
            ..Default::default()
        }
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// Security context of views and routines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlSecurity {
    #[default]
    Definer,
    Invoker,
}

impl SqlSecurity {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlSecurity::Definer => "DEFINER",
            SqlSecurity::Invoker => "INVOKER",
        }
    }
}

/// View definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub name: String,
    pub schema: Option<String>,
    /// `UNDEFINED`, `MERGE` or `TEMPTABLE`
    pub algorithm: String,
    pub definer: Option<String>,
    pub security: SqlSecurity,
    /// `CASCADED`, `LOCAL`, or empty when there is no check option
    pub update_option: String,
    pub sql: String,
}

impl ViewDescriptor {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            algorithm: "UNDEFINED".to_string(),
            definer: None,
            security: SqlSecurity::Definer,
            update_option: String::new(),
            sql: sql.into(),
        }
    }
}

/// When a trigger fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerTiming {
    Before,
    After,
}

impl TriggerTiming {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "BEFORE" => Some(TriggerTiming::Before),
            "AFTER" => Some(TriggerTiming::After),
            _ => None,
        }
    }
}

/// Statement kind that fires a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(TriggerEvent::Insert),
            "UPDATE" => Some(TriggerEvent::Update),
            "DELETE" => Some(TriggerEvent::Delete),
            _ => None,
        }
    }
}

/// Row trigger definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub name: String,
    pub schema: Option<String>,
    pub definer: Option<String>,
    pub table: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    /// Trigger body, usually `BEGIN ... END`
    pub sql: String,
}

/// Direction of a procedure parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    #[serde(rename = "INOUT")]
    InOut,
}

impl ParameterMode {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ParameterMode::In => "IN",
            ParameterMode::Out => "OUT",
            ParameterMode::InOut => "INOUT",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "IN" => Some(ParameterMode::In),
            "OUT" => Some(ParameterMode::Out),
            "INOUT" => Some(ParameterMode::InOut),
            _ => None,
        }
    }
}

/// Parameter of a stored procedure or function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineParameter {
    pub name: String,
    pub type_name: String,
    pub length: Option<String>,
    /// Ignored for functions, whose parameters are always input
    pub context: ParameterMode,
}

impl RoutineParameter {
    pub fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.trim().to_ascii_uppercase(),
            length: None,
            context: ParameterMode::In,
        }
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn with_context(mut self, context: ParameterMode) -> Self {
        self.context = context;
        self
    }
}

/// SQL data access characteristic of a routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataAccess {
    #[default]
    ContainsSql,
    NoSql,
    ReadsSqlData,
    ModifiesSqlData,
}

impl DataAccess {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DataAccess::ContainsSql => "CONTAINS SQL",
            DataAccess::NoSql => "NO SQL",
            DataAccess::ReadsSqlData => "READS SQL DATA",
            DataAccess::ModifiesSqlData => "MODIFIES SQL DATA",
        }
    }
}

/// Stored procedure definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineDescriptor {
    pub name: String,
    pub schema: Option<String>,
    pub definer: Option<String>,
    pub sql: String,
    pub parameters: Vec<RoutineParameter>,
    pub comment: String,
    pub security: SqlSecurity,
    pub deterministic: bool,
    pub data_access: DataAccess,
}

impl RoutineDescriptor {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            ..Default::default()
        }
    }
}

/// Stored function definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDescriptor {
    pub name: String,
    pub schema: Option<String>,
    pub definer: Option<String>,
    pub sql: String,
    pub parameters: Vec<RoutineParameter>,
    /// Return type; `None` on a fresh function lets the generator pick a default
    pub returns: Option<String>,
    pub returns_length: Option<u64>,
    pub comment: String,
    pub security: SqlSecurity,
    pub deterministic: bool,
    pub data_access: DataAccess,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Whether a scheduled event is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    #[default]
    Enable,
    Disable,
    DisableOnSlave,
}

impl EventState {
    pub fn as_sql(&self) -> &'static str {
        match self {
            EventState::Enable => "ENABLE",
            EventState::Disable => "DISABLE",
            EventState::DisableOnSlave => "DISABLE ON SLAVE",
        }
    }
}

/// When a scheduled event runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "execution", rename_all = "UPPERCASE")]
pub enum EventSchedule {
    /// Recurring: `EVERY <interval> <unit> [STARTS ..] [ENDS ..]`
    Every {
        interval: String,
        unit: String,
        starts: Option<String>,
        ends: Option<String>,
    },
    /// One-shot: `AT '<timestamp>'`
    Once { at: String },
}

/// Scheduled event definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerDescriptor {
    pub name: String,
    pub schema: Option<String>,
    pub definer: Option<String>,
    pub schedule: EventSchedule,
    /// Keep the event after its last execution
    pub preserve: bool,
    pub state: EventState,
    pub comment: String,
    pub sql: String,
}

/// Whether a table entry is a base table or a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    Table,
    View,
}

/// Table entry of a schema listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSummary {
    pub name: String,
    pub kind: TableKind,
    pub rows: Option<u64>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub engine: Option<String>,
    pub comment: Option<String>,
    /// Data plus index length in bytes
    pub size: u64,
    pub auto_increment: Option<u64>,
    pub collation: Option<String>,
}

/// Procedure or function entry of a schema listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineSummary {
    pub name: String,
    pub definer: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub comment: Option<String>,
    pub security: SqlSecurity,
}

/// Trigger entry of a schema listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSummary {
    pub name: String,
    pub table: String,
    pub timing: String,
    pub event: String,
    pub definer: Option<String>,
    pub created: Option<String>,
}

/// Scheduled event entry of a schema listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSummary {
    pub name: String,
    pub definer: Option<String>,
    /// `RECURRING` or `ONE TIME`
    pub execution: Option<String>,
    pub every: Option<String>,
    pub starts: Option<String>,
    pub ends: Option<String>,
    pub enabled: bool,
}

/// One schema with the objects it contains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaStructure {
    pub name: String,
    /// Sum of table sizes in bytes
    pub size: u64,
    pub tables: Vec<TableSummary>,
    pub functions: Vec<RoutineSummary>,
    pub procedures: Vec<RoutineSummary>,
    pub triggers: Vec<TriggerSummary>,
    pub schedulers: Vec<SchedulerSummary>,
}

/// Server account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub host: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationInfo {
    pub charset: String,
    pub collation: String,
    pub id: Option<u64>,
    pub is_default: bool,
    pub is_compiled: bool,
    pub sort_len: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub value: String,
}

/// Storage engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub support: String,
    pub comment: Option<String>,
    pub transactions: Option<String>,
    pub xa: Option<String>,
    pub savepoints: Option<String>,
    pub is_default: bool,
}

/// Server version summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Product name, e.g. `MySQL Community Server`
    pub name: String,
    /// Version number without distribution suffix
    pub number: String,
    pub arch: String,
    pub os: String,
}

/// Connection thread reported by the process list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: u64,
    pub user: Option<String>,
    pub host: Option<String>,
    pub database: Option<String>,
    pub command: Option<String>,
    pub time: Option<u64>,
    pub state: Option<String>,
    pub info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_length_preference() {
        let enum_field = FieldDescriptor::new("status", "enum", FieldKind::Text)
            .with_enum_values("'a','b'")
            .with_char_length(1);
        assert_eq!(enum_field.declared_length().as_deref(), Some("'a','b'"));

        let varchar = FieldDescriptor::new("name", "varchar", FieldKind::Text).with_char_length(255);
        assert_eq!(varchar.type_name, "VARCHAR");
        assert_eq!(varchar.declared_length().as_deref(), Some("255"));

        let decimal = FieldDescriptor::new("price", "DECIMAL", FieldKind::Numeric)
            .with_precision(10, Some(2))
            .with_char_length(12);
        assert_eq!(decimal.declared_length().as_deref(), Some("10,2"));

        let stamp = FieldDescriptor::new("at", "DATETIME", FieldKind::DateTime).with_date_precision(3);
        assert_eq!(stamp.declared_length().as_deref(), Some("3"));
    }

    #[test]
    fn test_foreign_key_action_parse() {
        assert_eq!(ForeignKeyAction::parse("cascade"), ForeignKeyAction::Cascade);
        assert_eq!(ForeignKeyAction::parse("SET NULL"), ForeignKeyAction::SetNull);
        assert_eq!(ForeignKeyAction::parse("whatever"), ForeignKeyAction::Restrict);
        assert_eq!(ForeignKeyAction::NoAction.as_sql(), "NO ACTION");
    }

    #[test]
    fn test_event_schedule_serde_tag() {
        let every = EventSchedule::Every {
            interval: "1".into(),
            unit: "DAY".into(),
            starts: None,
            ends: None,
        };
        let json = serde_json::to_value(&every).unwrap();
        assert_eq!(json["execution"], "EVERY");
        assert_eq!(json["unit"], "DAY");
    }
}
