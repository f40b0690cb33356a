//! Dialect profile types
//!
//! A [`DialectProfile`] is the data that makes one SQL engine different from
//! another as far as text generation goes: quoting characters, how string
//! literals are escaped, how binary literals are spelled, which types take a
//! length argument, and which DDL grammar variants the engine accepts.
//! Generators look behaviour up here instead of branching on the engine name.

use crate::FieldDescriptor;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Logical type tag that drives value serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Integer and exact numeric types, written unquoted
    Numeric,
    /// Approximate numeric types, coerced to a float before writing
    Floating,
    Date,
    DateTime,
    Text,
    /// Full-text search documents and queries (`tsvector`, `tsquery`)
    TextSearch,
    Bit,
    /// Binary large objects
    Blob,
    Spatial,
    /// Spatial collections (`MULTIPOINT`, `GEOMETRYCOLLECTION`, ...)
    MultiSpatial,
    #[default]
    Generic,
}

impl FieldKind {
    pub fn is_spatial(&self) -> bool {
        matches!(self, FieldKind::Spatial | FieldKind::MultiSpatial)
    }
}

/// One entry in a dialect's type catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeInfo {
    /// Type name as used in DDL (e.g., "VARCHAR")
    pub name: Cow<'static, str>,
    /// Serialization kind of values of this type
    pub kind: FieldKind,
    /// Whether the type takes a `(length)` argument in DDL
    pub accepts_length: bool,
    /// Whether `COLLATE` applies
    pub accepts_collation: bool,
    /// Whether `UNSIGNED` / `ZEROFILL` apply
    pub accepts_zerofill: bool,
}

impl DataTypeInfo {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            accepts_length: false,
            accepts_collation: false,
            accepts_zerofill: false,
        }
    }

    pub fn with_length(mut self) -> Self {
        self.accepts_length = true;
        self
    }

    pub fn with_collation(mut self) -> Self {
        self.accepts_collation = true;
        self
    }

    pub fn with_zerofill(mut self) -> Self {
        self.accepts_zerofill = true;
        self
    }
}

/// Types known to a dialect, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: Vec<DataTypeInfo>,
}

impl TypeCatalog {
    pub fn new(types: Vec<DataTypeInfo>) -> Self {
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&DataTypeInfo> {
        let name = name.trim();
        self.types
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    }

    /// Serialization kind for a type name; unknown types are generic
    pub fn kind_of(&self, name: &str) -> FieldKind {
        self.get(name).map_or(FieldKind::Generic, |info| info.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataTypeInfo> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Character escape table for string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeMap {
    entries: &'static [(char, &'static str)],
}

/// Backslash escaping used by MySQL and MariaDB
pub const BACKSLASH_ESCAPES: EscapeMap = EscapeMap {
    entries: &[
        ('\0', "\\0"),
        ('\u{8}', "\\b"),
        ('\t', "\\t"),
        ('\n', "\\n"),
        ('\r', "\\r"),
        ('\u{1a}', "\\Z"),
        ('"', "\\\""),
        ('\'', "\\'"),
        ('\\', "\\\\"),
    ],
};

/// Standard SQL escaping: only the quote character is doubled
pub const STANDARD_ESCAPES: EscapeMap = EscapeMap {
    entries: &[('\'', "''")],
};

impl EscapeMap {
    pub const fn new(entries: &'static [(char, &'static str)]) -> Self {
        Self { entries }
    }

    fn lookup(&self, ch: char) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, seq)| *seq)
    }

    /// Escape `input` in one forward pass.
    ///
    /// Unescaped runs are copied as whole slices between cursor positions;
    /// the input is borrowed untouched when nothing needs escaping.
    pub fn escape<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut out: Option<String> = None;
        let mut chunk_start = 0;

        for (idx, ch) in input.char_indices() {
            if let Some(seq) = self.lookup(ch) {
                let buf = out.get_or_insert_with(|| String::with_capacity(input.len() + 16));
                buf.push_str(&input[chunk_start..idx]);
                buf.push_str(seq);
                chunk_start = idx + ch.len_utf8();
            }
        }

        match out {
            None => Cow::Borrowed(input),
            Some(mut buf) => {
                buf.push_str(&input[chunk_start..]);
                Cow::Owned(buf)
            }
        }
    }

    /// Reverse [`EscapeMap::escape`]
    pub fn unescape(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut cursor = 0;

        'scan: while cursor < input.len() {
            let rest = &input[cursor..];
            for (ch, seq) in self.entries {
                if rest.starts_with(seq) {
                    out.push(*ch);
                    cursor += seq.len();
                    continue 'scan;
                }
            }
            // cursor always sits on a char boundary
            if let Some(ch) = rest.chars().next() {
                out.push(ch);
                cursor += ch.len_utf8();
            }
        }

        out
    }
}

/// How binary literals are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobLiteral {
    /// `X'0A1B'`
    HexString,
    /// `decode('0A1B', 'hex')`
    DecodeHex,
}

impl BlobLiteral {
    pub fn wrap(&self, hex: &str) -> String {
        match self {
            BlobLiteral::HexString => format!("X'{}'", hex),
            BlobLiteral::DecodeHex => format!("decode('{}', 'hex')", hex),
        }
    }
}

/// How a column is redefined by ALTER TABLE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnChangeStyle {
    /// `CHANGE COLUMN old new <definition>` in one clause
    ChangeColumn,
    /// `ALTER COLUMN` clauses per attribute, `RENAME COLUMN` as its own statement
    AlterColumn,
}

/// How auto-increment columns are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrementStyle {
    /// `AUTO_INCREMENT` after the nullability clause
    Suffix,
    /// `GENERATED BY DEFAULT AS IDENTITY`
    Identity,
}

/// How a primary key is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyDrop {
    /// `DROP PRIMARY KEY`
    Clause,
    /// `DROP CONSTRAINT "<table>_pkey"`
    NamedConstraint,
}

/// How a table is renamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStyle {
    /// `RENAME TABLE a TO b`
    RenameTable,
    /// `ALTER TABLE a RENAME TO b`
    AlterTable,
}

/// How a table is copied without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateStyle {
    /// `CREATE TABLE copy LIKE source`
    Like,
    /// `CREATE TABLE copy (LIKE source INCLUDING ALL)`
    LikeIncludingAll,
}

/// Statement issued to switch the default schema of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSwitch {
    /// `USE `db``
    Use,
    /// `SET search_path TO "schema"`
    SearchPath,
}

/// DDL grammar variants of a dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlSyntax {
    /// Columns can be placed with `AFTER col` / `FIRST`
    pub column_positioning: bool,
    pub column_change: ColumnChangeStyle,
    /// Column and table comments are written inline (`COMMENT '...'`)
    pub inline_comments: bool,
    /// Plain and fulltext indexes can be declared inside CREATE/ALTER TABLE
    pub inline_indexes: bool,
    /// ENGINE / COLLATE / AUTO_INCREMENT table options are supported
    pub table_options: bool,
    /// Column-level `ON UPDATE` expressions are supported
    pub on_update: bool,
    pub auto_increment: AutoIncrementStyle,
    /// Clause used to drop a foreign key constraint
    pub drop_foreign_key: &'static str,
    pub drop_primary_key: PrimaryKeyDrop,
    pub rename_table: RenameStyle,
    pub duplicate_table: DuplicateStyle,
    /// Keyword naming a schema in CREATE/ALTER/DROP (`DATABASE` or `SCHEMA`)
    pub schema_keyword: &'static str,
    /// Schemas carry a default collation that ALTER can change
    pub schema_collation: bool,
    /// Views and stored programs take `DEFINER=` and `SQL SECURITY` clauses
    pub definer_clauses: bool,
    /// MySQL-style triggers, procedures, functions and events with inline bodies
    pub stored_programs: bool,
}

/// Kinds of schema objects the DDL generators know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    View,
    Trigger,
    Routine,
    Function,
    Scheduler,
}

impl ObjectKind {
    /// SQL keyword naming the object kind
    pub fn as_sql(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Routine => "PROCEDURE",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Scheduler => "EVENT",
        }
    }
}

/// Everything the generators need to know about one SQL dialect
#[derive(Debug, Clone)]
pub struct DialectProfile {
    /// Unique identifier (`mysql`, `maria`, `pg`)
    pub id: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    pub identifier_quote: char,
    pub string_quote: char,
    pub escapes: EscapeMap,
    /// Backslash starts an escape sequence inside string literals
    pub backslash_escapes: bool,
    /// `#` starts a line comment
    pub hash_comments: bool,
    /// `--` only starts a comment when whitespace or a control character follows
    pub dash_comment_needs_space: bool,
    pub blob_literal: BlobLiteral,
    pub types: TypeCatalog,
    pub ddl: DdlSyntax,
    /// Object kinds that support an in-place ALTER
    pub in_place_alter: Vec<ObjectKind>,
    pub schema_switch: SchemaSwitch,
}

impl DialectProfile {
    /// Quote an identifier, doubling any embedded quote character
    pub fn quote_identifier(&self, name: &str) -> String {
        let q = self.identifier_quote;
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }

    /// Quote `schema.name`, or just `name` when no schema is given
    pub fn qualified(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) if !schema.is_empty() => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            ),
            _ => self.quote_identifier(name),
        }
    }

    /// Escape and wrap a string literal
    pub fn quote_string(&self, value: &str) -> String {
        let q = self.string_quote;
        format!("{q}{}{q}", self.escapes.escape(value))
    }

    /// The empty string literal
    pub fn empty_string(&self) -> String {
        format!("{q}{q}", q = self.string_quote)
    }

    /// Reverse [`DialectProfile::quote_string`]; `None` if `literal` is not quoted
    pub fn unquote_string(&self, literal: &str) -> Option<String> {
        let q = self.string_quote;
        let inner = literal.strip_prefix(q)?.strip_suffix(q)?;
        Some(self.escapes.unescape(inner))
    }

    pub fn data_type(&self, name: &str) -> Option<&DataTypeInfo> {
        self.types.get(name)
    }

    /// Field descriptor whose kind is resolved from this dialect's catalog
    pub fn field(&self, name: impl Into<String>, type_name: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, type_name, self.types.kind_of(type_name))
    }

    pub fn alters_in_place(&self, kind: ObjectKind) -> bool {
        self.in_place_alter.contains(&kind)
    }

    /// Statement that makes `schema` the session default
    pub fn schema_switch_sql(&self, schema: &str) -> String {
        match self.schema_switch {
            SchemaSwitch::Use => format!("USE {}", self.quote_identifier(schema)),
            SchemaSwitch::SearchPath => {
                format!("SET search_path TO {}", self.quote_identifier(schema))
            }
        }
    }
}
