//! Table loader for existing table structures
//!
//! Loads a table's columns, indexes, foreign keys and options through
//! schema introspection and assembles them into a [`TableDefinition`], the
//! "before" side of a diff.

use crate::models::{TableDefinition, TableOptions};
use quarry_core::{QuarryError, Result, SchemaIntrospection};

/// Stateless loader of table definitions
pub struct TableLoader;

impl TableLoader {
    /// Load an existing table's structure
    ///
    /// # Errors
    /// Returns `NotFound` if the schema has no table of that name, or the
    /// introspection error of the first failing lookup.
    pub async fn load_table(
        introspection: &dyn SchemaIntrospection,
        schema: &str,
        table: &str,
    ) -> Result<TableDefinition> {
        let summary = introspection
            .tables(schema)
            .await?
            .into_iter()
            .find(|t| t.name == table)
            .ok_or_else(|| {
                QuarryError::NotFound(format!("Table '{}.{}' does not exist", schema, table))
            })?;

        let fields = introspection.table_columns(schema, table).await?;
        let indexes = introspection.table_indexes(schema, table).await?;
        let foreign_keys = introspection.key_usage(schema, Some(table)).await?;

        tracing::debug!(
            schema = %schema,
            table = %table,
            columns = fields.len(),
            indexes = indexes.len(),
            foreign_keys = foreign_keys.len(),
            "loaded table definition"
        );

        Ok(TableDefinition {
            schema: Some(schema.to_string()),
            name: summary.name,
            fields,
            indexes,
            foreign_keys,
            options: TableOptions {
                comment: summary.comment.filter(|c| !c.is_empty()),
                engine: summary.engine,
                collation: summary.collation,
                auto_increment: summary.auto_increment,
            },
        })
    }
}
