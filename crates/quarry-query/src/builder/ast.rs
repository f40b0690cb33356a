//! Query AST
//!
//! A dialect-independent description of one statement. Clause fragments are
//! kept as caller-supplied SQL; only the target table and the insert column
//! names are quoted at render time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One clause entry: raw SQL, or a `column` / `rest` pair that flattens to
/// `"column rest"` (`("id", "= 1")`, `("name", "DESC")`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    Raw(String),
    Pair(String, String),
}

impl Fragment {
    pub fn raw(sql: impl Into<String>) -> Self {
        Fragment::Raw(sql.into())
    }

    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Fragment::Pair(key.into(), value.into())
    }

    /// Clause text of this fragment
    pub fn flatten(&self) -> String {
        match self {
            Fragment::Raw(sql) => sql.clone(),
            Fragment::Pair(key, value) => format!("{} {}", key, value),
        }
    }
}

impl From<&str> for Fragment {
    fn from(sql: &str) -> Self {
        Fragment::Raw(sql.to_string())
    }
}

impl From<String> for Fragment {
    fn from(sql: String) -> Self {
        Fragment::Raw(sql)
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Fragment {
    fn from((key, value): (K, V)) -> Self {
        Fragment::Pair(key.into(), value.into())
    }
}

/// Flatten a mixed fragment list into ordered clause strings, every pair
/// appended in place
pub fn reduce(fragments: &[Fragment]) -> Vec<String> {
    fragments.iter().map(Fragment::flatten).collect()
}

/// Structured, not yet rendered statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAst {
    /// Namespace qualifier of the target
    pub schema: Option<String>,
    pub select: Vec<Fragment>,
    /// Target table, shared by `FROM`, `INTO` and `UPDATE`
    pub from: Option<String>,
    /// Conditions combined with `AND`
    pub filters: Vec<Fragment>,
    pub group_by: Vec<Fragment>,
    pub order_by: Vec<Fragment>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Assignments of an UPDATE
    pub update: Vec<Fragment>,
    /// Rows of an INSERT, column name to SQL literal
    pub insert: Vec<IndexMap<String, String>>,
    pub delete: bool,
}

impl QueryAst {
    pub fn is_update(&self) -> bool {
        !self.update.is_empty()
    }

    pub fn is_insert(&self) -> bool {
        !self.insert.is_empty()
    }

    pub fn is_read(&self) -> bool {
        !self.delete && !self.is_update() && !self.is_insert()
    }
}
