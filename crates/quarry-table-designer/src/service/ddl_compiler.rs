//! DDL compilation for table definitions and diffs
//!
//! Generates CREATE TABLE, ALTER TABLE, duplicate, truncate and DROP TABLE
//! statements. Grammar differences between engines come from the
//! [`DdlSyntax`] table of the dialect profile, never from the engine name.

use crate::models::{
    ColumnChange, Placement, TableDefinition, TableDiff, TableOptions, describe,
};
use quarry_core::{
    AutoIncrementStyle, ColumnChangeStyle, DialectProfile, DuplicateStyle,
    FieldDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexKind, PrimaryKeyDrop,
    QuarryError, RenameStyle, Result,
};

/// Compiler from table definitions and diffs to DDL statements
///
/// Stateless; every statement list is returned in execution order.
pub struct DdlCompiler;

/// Statements that cannot live inside the combined ALTER TABLE, grouped by
/// the order in which they have to run after it
#[derive(Default)]
struct Followups {
    renames: Vec<String>,
    index_drops: Vec<String>,
    index_creates: Vec<String>,
    comments: Vec<String>,
}

impl Followups {
    fn into_statements(self) -> impl Iterator<Item = String> {
        self.renames
            .into_iter()
            .chain(self.index_drops)
            .chain(self.index_creates)
            .chain(self.comments)
    }
}

impl DdlCompiler {
    // --- Column definitions ---

    /// Render one column definition:
    /// `name TYPE(length) [UNSIGNED] [ZEROFILL] NULL|NOT NULL [AUTO_INCREMENT]
    /// [DEFAULT ..] [COMMENT ..] [COLLATE ..] [ON UPDATE ..]`
    pub fn column_definition(field: &FieldDescriptor, dialect: &DialectProfile) -> Result<String> {
        let ddl = &dialect.ddl;
        let mut def = format!(
            "{} {}",
            dialect.quote_identifier(&field.name),
            Self::column_type(field, dialect)?
        );

        let accepts_zerofill = dialect
            .data_type(&field.type_name)
            .is_some_and(|info| info.accepts_zerofill);
        if accepts_zerofill && field.unsigned {
            def.push_str(" UNSIGNED");
        }
        if accepts_zerofill && field.zerofill {
            def.push_str(" ZEROFILL");
        }

        let identity = field.auto_increment && ddl.auto_increment == AutoIncrementStyle::Identity;
        if field.nullable && !identity {
            def.push_str(" NULL");
        } else {
            def.push_str(" NOT NULL");
        }

        if field.auto_increment {
            def.push_str(match ddl.auto_increment {
                AutoIncrementStyle::Suffix => " AUTO_INCREMENT",
                AutoIncrementStyle::Identity => " GENERATED BY DEFAULT AS IDENTITY",
            });
        }

        if let Some(default) = field.default.as_deref().filter(|d| !d.is_empty()) {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }

        if ddl.inline_comments {
            if let Some(comment) = field.comment.as_deref().filter(|c| !c.is_empty()) {
                def.push_str(" COMMENT ");
                def.push_str(&dialect.quote_string(comment));
            }
        }

        let accepts_collation = dialect
            .data_type(&field.type_name)
            .is_some_and(|info| info.accepts_collation);
        if accepts_collation {
            if let Some(collation) = field.collation.as_deref().filter(|c| !c.is_empty()) {
                def.push_str(" COLLATE ");
                def.push_str(collation);
            }
        }

        if ddl.on_update {
            if let Some(on_update) = field.on_update.as_deref().filter(|o| !o.is_empty()) {
                def.push_str(" ON UPDATE ");
                def.push_str(on_update);
            }
        }

        Ok(def)
    }

    /// `TYPE(length)`; the length is only written when the type takes one
    fn column_type(field: &FieldDescriptor, dialect: &DialectProfile) -> Result<String> {
        let info = dialect.data_type(&field.type_name).ok_or_else(|| {
            QuarryError::Schema(format!(
                "Unknown data type '{}' for column '{}' in {}",
                field.type_name, field.name, dialect.display_name
            ))
        })?;

        let mut sql = info.name.to_string();
        if info.accepts_length {
            if let Some(length) = field.declared_length() {
                sql.push('(');
                sql.push_str(&length);
                sql.push(')');
            }
        }
        if field.is_array {
            sql.push_str("[]");
        }
        Ok(sql)
    }

    fn placement(placement: Option<&Placement>, dialect: &DialectProfile) -> String {
        if !dialect.ddl.column_positioning {
            return String::new();
        }
        match placement {
            Some(Placement::First) => " FIRST".to_string(),
            Some(Placement::After(column)) => {
                format!(" AFTER {}", dialect.quote_identifier(column))
            }
            None => String::new(),
        }
    }

    // --- Indexes and foreign keys ---

    fn column_list(columns: &[String], dialect: &DialectProfile) -> String {
        columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Index declaration usable inside CREATE TABLE or after `ADD`, or `None`
    /// when the dialect needs a separate CREATE INDEX statement for it
    fn inline_index(index: &IndexDescriptor, dialect: &DialectProfile) -> Option<String> {
        let columns = Self::column_list(&index.columns, dialect);
        match index.kind {
            IndexKind::Primary => Some(format!("PRIMARY KEY ({})", columns)),
            _ if dialect.ddl.inline_indexes => Some(format!(
                "{} {} ({})",
                index.kind.as_sql(),
                dialect.quote_identifier(&index.name),
                columns
            )),
            IndexKind::Unique => Some(format!(
                "CONSTRAINT {} UNIQUE ({})",
                dialect.quote_identifier(&index.name),
                columns
            )),
            _ => None,
        }
    }

    fn create_index(
        index: &IndexDescriptor,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
    ) -> String {
        format!(
            "CREATE INDEX {} ON {} ({})",
            dialect.quote_identifier(&index.name),
            dialect.qualified(schema, table),
            Self::column_list(&index.columns, dialect)
        )
    }

    /// Drop an index of the given kind, as an ALTER clause or a followup
    fn drop_index(
        name: &str,
        kind: IndexKind,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
        clauses: &mut Vec<String>,
        followups: &mut Followups,
    ) {
        let ddl = &dialect.ddl;
        if kind.is_primary() {
            clauses.push(match ddl.drop_primary_key {
                PrimaryKeyDrop::Clause => "DROP PRIMARY KEY".to_string(),
                PrimaryKeyDrop::NamedConstraint => format!(
                    "DROP CONSTRAINT {}",
                    dialect.quote_identifier(&format!("{}_pkey", table))
                ),
            });
        } else if ddl.inline_indexes {
            clauses.push(format!("DROP INDEX {}", dialect.quote_identifier(name)));
        } else if kind == IndexKind::Unique {
            clauses.push(format!("DROP CONSTRAINT {}", dialect.quote_identifier(name)));
        } else {
            followups.index_drops.push(format!(
                "DROP INDEX IF EXISTS {}",
                dialect.qualified(schema, name)
            ));
        }
    }

    /// Add an index, as an ALTER clause or a followup
    fn add_index(
        index: &IndexDescriptor,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
        clauses: &mut Vec<String>,
        followups: &mut Followups,
    ) {
        match Self::inline_index(index, dialect) {
            Some(declaration) => clauses.push(format!("ADD {}", declaration)),
            None => followups
                .index_creates
                .push(Self::create_index(index, schema, table, dialect)),
        }
    }

    fn foreign_key(fk: &ForeignKeyDescriptor, dialect: &DialectProfile) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            dialect.quote_identifier(&fk.constraint),
            dialect.quote_identifier(&fk.field),
            dialect.qualified(fk.ref_schema.as_deref(), &fk.ref_table),
            dialect.quote_identifier(&fk.ref_field),
            fk.on_update.as_sql(),
            fk.on_delete.as_sql()
        )
    }

    // --- Table options and comments ---

    fn table_options(options: &TableOptions, dialect: &DialectProfile) -> Result<Vec<String>> {
        let ddl = &dialect.ddl;
        let mut parts = Vec::new();

        if ddl.inline_comments {
            if let Some(comment) = &options.comment {
                parts.push(format!("COMMENT={}", dialect.quote_string(comment)));
            }
        }

        if !ddl.table_options {
            if options.engine.is_some()
                || options.collation.is_some()
                || options.auto_increment.is_some()
            {
                return Err(QuarryError::Schema(format!(
                    "{} does not support ENGINE, COLLATE or AUTO_INCREMENT table options",
                    dialect.display_name
                )));
            }
            return Ok(parts);
        }

        if let Some(collation) = &options.collation {
            parts.push(format!("COLLATE={}", dialect.quote_string(collation)));
        }
        if let Some(engine) = &options.engine {
            parts.push(format!("ENGINE={}", engine));
        }
        if let Some(seed) = options.auto_increment {
            parts.push(format!("AUTO_INCREMENT={}", seed));
        }
        Ok(parts)
    }

    fn table_comment(
        options: &TableOptions,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
    ) -> Option<String> {
        if dialect.ddl.inline_comments {
            return None;
        }
        options.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON TABLE {} IS {}",
                dialect.qualified(schema, table),
                dialect.quote_string(comment)
            )
        })
    }

    fn column_comment(
        field: &FieldDescriptor,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
    ) -> Option<String> {
        if dialect.ddl.inline_comments {
            return None;
        }
        field.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                dialect.qualified(schema, table),
                dialect.quote_identifier(&field.name),
                dialect.quote_string(comment)
            )
        })
    }

    // --- CREATE TABLE ---

    /// Compile a CREATE TABLE statement, followed by the index and comment
    /// statements the dialect cannot declare inline
    pub fn compile_create(
        definition: &TableDefinition,
        dialect: &DialectProfile,
    ) -> Result<Vec<String>> {
        let errors = definition.validate();
        if !errors.is_empty() {
            return Err(QuarryError::Schema(describe(&errors)));
        }

        let schema = definition.schema.as_deref();
        let table = definition.name.as_str();
        let mut items = Vec::new();
        let mut followups = Followups::default();

        for field in &definition.fields {
            items.push(Self::column_definition(field, dialect)?);
        }
        for index in &definition.indexes {
            match Self::inline_index(index, dialect) {
                Some(declaration) => items.push(declaration),
                None => followups
                    .index_creates
                    .push(Self::create_index(index, schema, table, dialect)),
            }
        }
        for fk in &definition.foreign_keys {
            items.push(Self::foreign_key(fk, dialect));
        }

        let mut sql = format!(
            "CREATE TABLE {} ({})",
            dialect.qualified(schema, table),
            items.join(", ")
        );
        let options = Self::table_options(&definition.options, dialect)?;
        if !options.is_empty() {
            sql.push(' ');
            sql.push_str(&options.join(", "));
        }

        followups
            .comments
            .extend(Self::table_comment(&definition.options, schema, table, dialect));
        followups.comments.extend(
            definition
                .fields
                .iter()
                .filter_map(|f| Self::column_comment(f, schema, table, dialect)),
        );

        let statements: Vec<String> = std::iter::once(sql)
            .chain(followups.into_statements())
            .collect();
        tracing::debug!(table = %table, statements = statements.len(), "compiled CREATE TABLE");
        Ok(statements)
    }

    // --- ALTER TABLE ---

    /// Validate `diff` against `prior` before compiling it
    pub fn compile_alter_checked(
        diff: &TableDiff,
        prior: &TableDefinition,
        dialect: &DialectProfile,
    ) -> Result<Vec<String>> {
        let errors = diff.validate(prior);
        if !errors.is_empty() {
            return Err(QuarryError::Schema(describe(&errors)));
        }
        Self::compile_alter(diff, dialect)
    }

    /// Compile a diff into one combined ALTER TABLE statement plus followups.
    ///
    /// Clause order: options, column additions, index additions, foreign key
    /// additions, column changes, index changes, foreign key changes, column
    /// deletions, index deletions, foreign key deletions. A table rename is
    /// always the last statement.
    pub fn compile_alter(diff: &TableDiff, dialect: &DialectProfile) -> Result<Vec<String>> {
        if diff.table.trim().is_empty() {
            return Err(QuarryError::Schema("Table name is required".into()));
        }

        let schema = diff.schema.as_deref();
        let table = diff.table.as_str();
        let mut clauses = Self::table_options(&diff.options, dialect)?;
        let mut followups = Followups::default();

        followups
            .comments
            .extend(Self::table_comment(&diff.options, schema, table, dialect));

        // --- Additions ---
        for addition in &diff.columns.additions {
            clauses.push(format!(
                "ADD COLUMN {}{}",
                Self::column_definition(&addition.field, dialect)?,
                Self::placement(addition.placement.as_ref(), dialect)
            ));
            followups
                .comments
                .extend(Self::column_comment(&addition.field, schema, table, dialect));
        }
        for index in &diff.indexes.additions {
            Self::add_index(index, schema, table, dialect, &mut clauses, &mut followups);
        }
        for fk in &diff.foreign_keys.additions {
            clauses.push(format!("ADD {}", Self::foreign_key(fk, dialect)));
        }

        // --- Changes ---
        for change in &diff.columns.changes {
            Self::change_column(change, schema, table, dialect, &mut clauses, &mut followups)?;
        }
        for change in &diff.indexes.changes {
            Self::drop_index(
                &change.old_name,
                change.old_kind,
                schema,
                table,
                dialect,
                &mut clauses,
                &mut followups,
            );
            Self::add_index(
                &change.index,
                schema,
                table,
                dialect,
                &mut clauses,
                &mut followups,
            );
        }
        for change in &diff.foreign_keys.changes {
            clauses.push(format!(
                "{} {}",
                dialect.ddl.drop_foreign_key,
                dialect.quote_identifier(&change.old_constraint)
            ));
            clauses.push(format!("ADD {}", Self::foreign_key(&change.foreign_key, dialect)));
        }

        // --- Deletions ---
        for name in &diff.columns.deletions {
            clauses.push(format!("DROP COLUMN {}", dialect.quote_identifier(name)));
        }
        for index in &diff.indexes.deletions {
            Self::drop_index(
                &index.name,
                index.kind,
                schema,
                table,
                dialect,
                &mut clauses,
                &mut followups,
            );
        }
        for constraint in &diff.foreign_keys.deletions {
            clauses.push(format!(
                "{} {}",
                dialect.ddl.drop_foreign_key,
                dialect.quote_identifier(constraint)
            ));
        }

        let mut statements = Vec::new();
        if !clauses.is_empty() {
            statements.push(format!(
                "ALTER TABLE {} {}",
                dialect.qualified(schema, table),
                clauses.join(", ")
            ));
        }
        statements.extend(followups.into_statements());

        // --- Rename ---
        if let Some(new_name) = diff.rename_to.as_deref().filter(|n| *n != table) {
            statements.push(Self::rename_table(schema, table, new_name, dialect));
        }

        tracing::debug!(table = %table, statements = statements.len(), "compiled ALTER TABLE");
        Ok(statements)
    }

    fn change_column(
        change: &ColumnChange,
        schema: Option<&str>,
        table: &str,
        dialect: &DialectProfile,
        clauses: &mut Vec<String>,
        followups: &mut Followups,
    ) -> Result<()> {
        let field = &change.field;
        match dialect.ddl.column_change {
            ColumnChangeStyle::ChangeColumn => {
                clauses.push(format!(
                    "CHANGE COLUMN {} {}{}",
                    dialect.quote_identifier(&change.original_name),
                    Self::column_definition(field, dialect)?,
                    Self::placement(change.placement.as_ref(), dialect)
                ));
            }
            ColumnChangeStyle::AlterColumn => {
                let column = dialect.quote_identifier(&change.original_name);
                clauses.push(format!(
                    "ALTER COLUMN {} TYPE {}",
                    column,
                    Self::column_type(field, dialect)?
                ));
                clauses.push(format!(
                    "ALTER COLUMN {} {}",
                    column,
                    if field.nullable {
                        "DROP NOT NULL"
                    } else {
                        "SET NOT NULL"
                    }
                ));
                match field.default.as_deref().filter(|d| !d.is_empty()) {
                    Some(default) => {
                        clauses.push(format!("ALTER COLUMN {} SET DEFAULT {}", column, default))
                    }
                    None => clauses.push(format!("ALTER COLUMN {} DROP DEFAULT", column)),
                }
                if change.is_rename() {
                    followups.renames.push(format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        dialect.qualified(schema, table),
                        column,
                        dialect.quote_identifier(&field.name)
                    ));
                }
            }
        }
        followups
            .comments
            .extend(Self::column_comment(field, schema, table, dialect));
        Ok(())
    }

    fn rename_table(
        schema: Option<&str>,
        table: &str,
        new_name: &str,
        dialect: &DialectProfile,
    ) -> String {
        match dialect.ddl.rename_table {
            RenameStyle::RenameTable => format!(
                "RENAME TABLE {} TO {}",
                dialect.qualified(schema, table),
                dialect.qualified(schema, new_name)
            ),
            RenameStyle::AlterTable => format!(
                "ALTER TABLE {} RENAME TO {}",
                dialect.qualified(schema, table),
                dialect.quote_identifier(new_name)
            ),
        }
    }

    // --- Table utilities ---

    /// Copy the structure of `table` into `{table}_copy`
    pub fn compile_duplicate(schema: Option<&str>, table: &str, dialect: &DialectProfile) -> String {
        let source = dialect.qualified(schema, table);
        let copy = dialect.qualified(schema, &format!("{}_copy", table));
        match dialect.ddl.duplicate_table {
            DuplicateStyle::Like => format!("CREATE TABLE {} LIKE {}", copy, source),
            DuplicateStyle::LikeIncludingAll => {
                format!("CREATE TABLE {} (LIKE {} INCLUDING ALL)", copy, source)
            }
        }
    }

    pub fn compile_truncate(schema: Option<&str>, table: &str, dialect: &DialectProfile) -> String {
        format!("TRUNCATE TABLE {}", dialect.qualified(schema, table))
    }

    pub fn compile_drop(schema: Option<&str>, table: &str, dialect: &DialectProfile) -> String {
        format!("DROP TABLE {}", dialect.qualified(schema, table))
    }
}
