//! Models for table DDL
//!
//! Table definitions (CREATE input), diffs (ALTER input) and the options
//! and validation types they share. Column, index and foreign key entries
//! are the descriptors from `quarry-core`.

mod table_definition;
mod table_diff;
mod table_options;
mod validation;

pub(crate) use validation::describe;

pub use table_definition::TableDefinition;
pub use table_diff::{
    ColumnAddition, ColumnChange, ColumnChanges, ForeignKeyChange, ForeignKeyChanges, IndexChange,
    IndexChanges, Placement, TableDiff,
};
pub use table_options::TableOptions;
pub use validation::ValidationError;
