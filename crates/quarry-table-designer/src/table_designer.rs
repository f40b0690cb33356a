//! Table DDL for Quarry
//!
//! Turns table definitions and diffs into ordered DDL statements for any
//! registered dialect.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quarry_core::dialect_profile;
//! use quarry_table_designer::{DdlCompiler, Placement, TableDiff};
//!
//! let mysql = dialect_profile("mysql")?;
//! let diff = TableDiff::new("users")
//!     .add_column(mysql.field("nickname", "VARCHAR").with_char_length(40), Some(Placement::After("name".into())))
//!     .drop_column("legacy");
//! let statements = DdlCompiler::compile_alter(&diff, &mysql)?;
//! ```

pub mod models;
pub mod service;

pub use models::{
    ColumnAddition, ColumnChange, ColumnChanges, ForeignKeyChange, ForeignKeyChanges, IndexChange,
    IndexChanges, Placement, TableDefinition, TableDiff, TableOptions, ValidationError,
};
pub use service::{DdlCompiler, TableLoader};
