//! Dialect registry
//!
//! Built-in profiles for the MySQL family and PostgreSQL, registered under
//! their dialect codes plus a few common aliases. Profiles are immutable and
//! shared behind `Arc`.

use crate::{
    AutoIncrementStyle, BACKSLASH_ESCAPES, BlobLiteral, ColumnChangeStyle, DataTypeInfo,
    DdlSyntax, DialectProfile, DuplicateStyle, FieldKind, ObjectKind, PrimaryKeyDrop,
    QuarryError, RenameStyle, Result, STANDARD_ESCAPES, SchemaSwitch, TypeCatalog,
};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Registry of dialect profiles keyed by dialect code
pub struct DialectRegistry {
    profiles: HashMap<&'static str, Arc<DialectProfile>>,
    aliases: HashMap<&'static str, &'static str>,
}

impl DialectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a dialect profile
    pub fn register(&mut self, profile: DialectProfile) {
        self.profiles.insert(profile.id, Arc::new(profile));
    }

    /// Make `alias` resolve to the profile registered as `id`
    pub fn alias(&mut self, alias: &'static str, id: &'static str) {
        self.aliases.insert(alias, id);
    }

    /// Get a dialect profile by code or alias
    pub fn get(&self, code: &str) -> Option<Arc<DialectProfile>> {
        let code = code.trim().to_ascii_lowercase();
        let id = self
            .aliases
            .get(code.as_str())
            .copied()
            .unwrap_or(code.as_str());
        self.profiles.get(id).cloned()
    }

    /// Get all registered dialect codes
    pub fn dialect_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.profiles.keys().copied()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global dialect registry instance with the built-in profiles
pub static DIALECT_REGISTRY: LazyLock<Arc<DialectRegistry>> = LazyLock::new(|| {
    let mut registry = DialectRegistry::new();

    registry.register(mysql_profile());
    registry.register(maria_profile());
    registry.register(postgres_profile());

    registry.alias("mariadb", "maria");
    registry.alias("postgres", "pg");
    registry.alias("postgresql", "pg");

    Arc::new(registry)
});

/// Get a dialect profile by code
pub fn get_dialect_profile(code: &str) -> Option<Arc<DialectProfile>> {
    DIALECT_REGISTRY.get(code)
}

/// Like [`get_dialect_profile`], failing with `NotFound` for unknown codes
pub fn dialect_profile(code: &str) -> Result<Arc<DialectProfile>> {
    get_dialect_profile(code)
        .ok_or_else(|| QuarryError::NotFound(format!("Unknown SQL dialect '{}'", code)))
}

fn mysql_ddl() -> DdlSyntax {
    DdlSyntax {
        column_positioning: true,
        column_change: ColumnChangeStyle::ChangeColumn,
        inline_comments: true,
        inline_indexes: true,
        table_options: true,
        on_update: true,
        auto_increment: AutoIncrementStyle::Suffix,
        drop_foreign_key: "DROP FOREIGN KEY",
        drop_primary_key: PrimaryKeyDrop::Clause,
        rename_table: RenameStyle::RenameTable,
        duplicate_table: DuplicateStyle::Like,
        schema_keyword: "DATABASE",
        schema_collation: true,
        definer_clauses: true,
        stored_programs: true,
    }
}

/// MySQL profile
pub fn mysql_profile() -> DialectProfile {
    DialectProfile {
        id: "mysql",
        display_name: "MySQL",
        identifier_quote: '`',
        string_quote: '\'',
        escapes: BACKSLASH_ESCAPES,
        backslash_escapes: true,
        hash_comments: true,
        dash_comment_needs_space: true,
        blob_literal: BlobLiteral::HexString,
        types: TypeCatalog::new(mysql_data_types()),
        ddl: mysql_ddl(),
        in_place_alter: vec![ObjectKind::Table, ObjectKind::View, ObjectKind::Scheduler],
        schema_switch: SchemaSwitch::Use,
    }
}

/// MariaDB profile, MySQL grammar plus the `INET6`/`UUID` types
pub fn maria_profile() -> DialectProfile {
    let mut types = mysql_data_types();
    types.push(DataTypeInfo::new("INET6", FieldKind::Text));
    types.push(DataTypeInfo::new("UUID", FieldKind::Text));

    DialectProfile {
        id: "maria",
        display_name: "MariaDB",
        types: TypeCatalog::new(types),
        // CREATE OR REPLACE covers stored programs
        in_place_alter: vec![
            ObjectKind::Table,
            ObjectKind::View,
            ObjectKind::Trigger,
            ObjectKind::Routine,
            ObjectKind::Function,
            ObjectKind::Scheduler,
        ],
        ..mysql_profile()
    }
}

/// PostgreSQL profile
pub fn postgres_profile() -> DialectProfile {
    DialectProfile {
        id: "pg",
        display_name: "PostgreSQL",
        identifier_quote: '"',
        string_quote: '\'',
        escapes: STANDARD_ESCAPES,
        backslash_escapes: false,
        hash_comments: false,
        dash_comment_needs_space: false,
        blob_literal: BlobLiteral::DecodeHex,
        types: TypeCatalog::new(postgres_data_types()),
        ddl: DdlSyntax {
            column_positioning: false,
            column_change: ColumnChangeStyle::AlterColumn,
            inline_comments: false,
            inline_indexes: false,
            table_options: false,
            on_update: false,
            auto_increment: AutoIncrementStyle::Identity,
            drop_foreign_key: "DROP CONSTRAINT",
            drop_primary_key: PrimaryKeyDrop::NamedConstraint,
            rename_table: RenameStyle::AlterTable,
            duplicate_table: DuplicateStyle::LikeIncludingAll,
            schema_keyword: "SCHEMA",
            schema_collation: false,
            definer_clauses: false,
            stored_programs: false,
        },
        in_place_alter: vec![ObjectKind::Table],
        schema_switch: SchemaSwitch::SearchPath,
    }
}

fn mysql_data_types() -> Vec<DataTypeInfo> {
    use FieldKind::*;
    vec![
        // Integer display widths are deprecated, so integers take no length
        DataTypeInfo::new("TINYINT", Numeric).with_zerofill(),
        DataTypeInfo::new("SMALLINT", Numeric).with_zerofill(),
        DataTypeInfo::new("MEDIUMINT", Numeric).with_zerofill(),
        DataTypeInfo::new("INT", Numeric).with_zerofill(),
        DataTypeInfo::new("INTEGER", Numeric).with_zerofill(),
        DataTypeInfo::new("BIGINT", Numeric).with_zerofill(),
        DataTypeInfo::new("DECIMAL", Numeric).with_length().with_zerofill(),
        DataTypeInfo::new("NUMERIC", Numeric).with_length().with_zerofill(),
        DataTypeInfo::new("YEAR", Numeric),
        DataTypeInfo::new("BOOLEAN", Numeric),
        DataTypeInfo::new("BOOL", Numeric),
        DataTypeInfo::new("FLOAT", Floating).with_zerofill(),
        DataTypeInfo::new("DOUBLE", Floating).with_zerofill(),
        DataTypeInfo::new("DOUBLE PRECISION", Floating).with_zerofill(),
        DataTypeInfo::new("REAL", Floating).with_zerofill(),
        DataTypeInfo::new("BIT", Bit).with_length(),
        DataTypeInfo::new("CHAR", Text).with_length().with_collation(),
        DataTypeInfo::new("VARCHAR", Text).with_length().with_collation(),
        DataTypeInfo::new("TINYTEXT", Text).with_collation(),
        DataTypeInfo::new("TEXT", Text).with_collation(),
        DataTypeInfo::new("MEDIUMTEXT", Text).with_collation(),
        DataTypeInfo::new("LONGTEXT", Text).with_collation(),
        DataTypeInfo::new("ENUM", Text).with_length().with_collation(),
        DataTypeInfo::new("SET", Text).with_length().with_collation(),
        DataTypeInfo::new("JSON", Generic),
        DataTypeInfo::new("BINARY", Blob).with_length(),
        DataTypeInfo::new("VARBINARY", Blob).with_length(),
        DataTypeInfo::new("TINYBLOB", Blob),
        DataTypeInfo::new("BLOB", Blob),
        DataTypeInfo::new("MEDIUMBLOB", Blob),
        DataTypeInfo::new("LONGBLOB", Blob),
        DataTypeInfo::new("DATE", Date),
        DataTypeInfo::new("TIME", Text).with_length(),
        DataTypeInfo::new("DATETIME", DateTime).with_length(),
        DataTypeInfo::new("TIMESTAMP", DateTime).with_length(),
        DataTypeInfo::new("GEOMETRY", Spatial),
        DataTypeInfo::new("POINT", Spatial),
        DataTypeInfo::new("LINESTRING", Spatial),
        DataTypeInfo::new("POLYGON", Spatial),
        DataTypeInfo::new("MULTIPOINT", MultiSpatial),
        DataTypeInfo::new("MULTILINESTRING", MultiSpatial),
        DataTypeInfo::new("MULTIPOLYGON", MultiSpatial),
        DataTypeInfo::new("GEOMETRYCOLLECTION", MultiSpatial),
    ]
}

fn postgres_data_types() -> Vec<DataTypeInfo> {
    use FieldKind::*;
    vec![
        DataTypeInfo::new("SMALLINT", Numeric),
        DataTypeInfo::new("INTEGER", Numeric),
        DataTypeInfo::new("INT", Numeric),
        DataTypeInfo::new("BIGINT", Numeric),
        DataTypeInfo::new("SMALLSERIAL", Numeric),
        DataTypeInfo::new("SERIAL", Numeric),
        DataTypeInfo::new("BIGSERIAL", Numeric),
        DataTypeInfo::new("NUMERIC", Numeric).with_length(),
        DataTypeInfo::new("DECIMAL", Numeric).with_length(),
        DataTypeInfo::new("OID", Numeric),
        DataTypeInfo::new("REAL", Floating),
        DataTypeInfo::new("DOUBLE PRECISION", Floating),
        DataTypeInfo::new("MONEY", Generic),
        DataTypeInfo::new("BOOLEAN", Generic),
        DataTypeInfo::new("CHARACTER", Text).with_length().with_collation(),
        DataTypeInfo::new("CHAR", Text).with_length().with_collation(),
        DataTypeInfo::new("CHARACTER VARYING", Text).with_length().with_collation(),
        DataTypeInfo::new("VARCHAR", Text).with_length().with_collation(),
        DataTypeInfo::new("TEXT", Text).with_collation(),
        DataTypeInfo::new("CITEXT", Text).with_collation(),
        DataTypeInfo::new("UUID", Text),
        DataTypeInfo::new("INET", Text),
        DataTypeInfo::new("CIDR", Text),
        DataTypeInfo::new("MACADDR", Text),
        DataTypeInfo::new("XML", Text),
        DataTypeInfo::new("JSON", Generic),
        DataTypeInfo::new("JSONB", Generic),
        DataTypeInfo::new("TSVECTOR", TextSearch),
        DataTypeInfo::new("TSQUERY", TextSearch),
        DataTypeInfo::new("BIT", Bit).with_length(),
        DataTypeInfo::new("BIT VARYING", Bit).with_length(),
        DataTypeInfo::new("BYTEA", Blob),
        DataTypeInfo::new("DATE", Date),
        DataTypeInfo::new("TIME", Text).with_length(),
        DataTypeInfo::new("TIME WITH TIME ZONE", Text).with_length(),
        DataTypeInfo::new("INTERVAL", Text).with_length(),
        DataTypeInfo::new("TIMESTAMP", DateTime).with_length(),
        DataTypeInfo::new("TIMESTAMP WITHOUT TIME ZONE", DateTime).with_length(),
        DataTypeInfo::new("TIMESTAMP WITH TIME ZONE", DateTime).with_length(),
        DataTypeInfo::new("TIMESTAMPTZ", DateTime).with_length(),
        DataTypeInfo::new("GEOMETRY", Spatial),
        DataTypeInfo::new("GEOGRAPHY", Spatial),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_aliases() {
        assert_eq!(get_dialect_profile("mysql").map(|p| p.id), Some("mysql"));
        assert_eq!(get_dialect_profile("MariaDB").map(|p| p.id), Some("maria"));
        assert_eq!(get_dialect_profile("postgresql").map(|p| p.id), Some("pg"));
        assert!(get_dialect_profile("oracle").is_none());
        assert!(matches!(
            dialect_profile("oracle"),
            Err(QuarryError::NotFound(_))
        ));
    }

    #[test]
    fn test_quoting_per_dialect() {
        let mysql = mysql_profile();
        let pg = postgres_profile();

        assert_eq!(mysql.qualified(Some("app"), "users"), "`app`.`users`");
        assert_eq!(pg.qualified(None, "users"), "\"users\"");
        assert_eq!(mysql.quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(mysql.quote_string("O'Brien"), "'O\\'Brien'");
        assert_eq!(pg.quote_string("O'Brien"), "'O''Brien'");
        assert_eq!(pg.empty_string(), "''");
    }

    #[test]
    fn test_escape_round_trip() {
        let mysql = mysql_profile();
        let pg = postgres_profile();
        let samples = [
            "plain",
            "it's",
            "back\\slash",
            "line\nbreak\r\n\ttab",
            "nul\0and\u{1a}sub\u{8}",
            "\"quoted\" 'both'",
            "ünïcödé ✓",
            "trailing\\",
        ];

        for sample in samples {
            let quoted = mysql.quote_string(sample);
            assert_eq!(mysql.unquote_string(&quoted).as_deref(), Some(sample));
            let quoted = pg.quote_string(sample);
            assert_eq!(pg.unquote_string(&quoted).as_deref(), Some(sample));
        }
    }

    #[test]
    fn test_escape_borrows_when_clean() {
        let escaped = BACKSLASH_ESCAPES.escape("nothing to do");
        assert!(matches!(escaped, std::borrow::Cow::Borrowed(_)));
        assert_eq!(BACKSLASH_ESCAPES.escape("a\u{1a}b"), "a\\Zb");
    }

    #[test]
    fn test_type_catalog_lookup() {
        let mysql = mysql_profile();
        assert!(mysql.data_type("varchar").is_some_and(|t| t.accepts_length));
        assert!(mysql.data_type("INT").is_some_and(|t| !t.accepts_length));
        assert_eq!(mysql.types.kind_of("multipolygon"), FieldKind::MultiSpatial);
        assert_eq!(mysql.types.kind_of("unknown_type"), FieldKind::Generic);

        let pg = postgres_profile();
        assert_eq!(pg.types.kind_of("tsvector"), FieldKind::TextSearch);
        assert_eq!(pg.blob_literal, BlobLiteral::DecodeHex);
    }

    #[test]
    fn test_schema_switch() {
        assert_eq!(mysql_profile().schema_switch_sql("app"), "USE `app`");
        assert_eq!(
            postgres_profile().schema_switch_sql("public"),
            "SET search_path TO \"public\""
        );
    }
}
