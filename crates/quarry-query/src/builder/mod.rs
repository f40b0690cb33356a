//! Query builder
//!
//! An immutable builder over [`QueryAst`]: every call consumes the builder
//! and returns the extended one, so a builder can be cloned to branch and
//! never needs resetting.
//!
//! ```ignore
//! let sql = QueryBuilder::new()
//!     .schema("app")
//!     .select(["id", "name"])
//!     .from("users")
//!     .and_where([("id", "= 1")])
//!     .to_sql(&mysql_profile())?;
//! assert_eq!(sql, "SELECT id, name FROM `app`.`users` WHERE id = 1");
//! ```

mod ast;
mod render;
#[cfg(test)]
mod tests;

pub use ast::{Fragment, QueryAst, reduce};
pub use render::render;

use indexmap::IndexMap;
use quarry_core::{DialectProfile, Result};

/// Chained construction of a [`QueryAst`]
///
/// `select`, `and_where`, `group_by`, `order_by`, `update` and `insert`
/// append. `from`, `into`, `limit` and `offset` replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    ast: QueryAst,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.ast.schema = Some(schema.into());
        self
    }

    pub fn select<I, F>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ast.select.extend(fragments.into_iter().map(Into::into));
        self
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.ast.from = Some(table.into());
        self
    }

    /// Insert target, same slot as [`QueryBuilder::from`]
    pub fn into(self, table: impl Into<String>) -> Self {
        self.from(table)
    }

    /// Mark the statement as a DELETE from `table`
    pub fn delete(mut self, table: impl Into<String>) -> Self {
        self.ast.delete = true;
        self.from(table)
    }

    pub fn and_where<I, F>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ast.filters.extend(conditions.into_iter().map(Into::into));
        self
    }

    pub fn group_by<I, F>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ast.group_by.extend(fragments.into_iter().map(Into::into));
        self
    }

    pub fn order_by<I, F>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ast.order_by.extend(fragments.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    /// Append assignments, e.g. `("name", "= 'x'")`
    pub fn update<I, F>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ast.update.extend(assignments.into_iter().map(Into::into));
        self
    }

    /// Append one row of column name to serialized literal
    pub fn insert<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let row: IndexMap<String, String> = row
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.ast.insert.push(row);
        self
    }

    pub fn ast(&self) -> &QueryAst {
        &self.ast
    }

    pub fn build(self) -> QueryAst {
        self.ast
    }

    /// Render the current AST for `profile`
    pub fn to_sql(&self, profile: &DialectProfile) -> Result<String> {
        render(&self.ast, profile)
    }
}
