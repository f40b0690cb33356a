//! Table diff model
//!
//! A [`TableDiff`] lists what changes between two versions of a table:
//! additions, changes and deletions for columns, indexes and foreign keys,
//! plus option changes and an optional rename.

use quarry_core::{FieldDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{TableDefinition, TableOptions, ValidationError};

/// Where a new or changed column goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    First,
    After(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAddition {
    pub field: FieldDescriptor,
    /// `None` appends at the end
    pub placement: Option<Placement>,
}

/// Redefinition of an existing column, possibly under a new name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub original_name: String,
    pub field: FieldDescriptor,
    pub placement: Option<Placement>,
}

impl ColumnChange {
    pub fn is_rename(&self) -> bool {
        self.original_name != self.field.name
    }
}

/// Replacement of an existing index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexChange {
    pub old_name: String,
    pub old_kind: IndexKind,
    pub index: IndexDescriptor,
}

/// Replacement of an existing foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyChange {
    pub old_constraint: String,
    pub foreign_key: ForeignKeyDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnChanges {
    pub additions: Vec<ColumnAddition>,
    pub changes: Vec<ColumnChange>,
    /// Names of dropped columns
    pub deletions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexChanges {
    pub additions: Vec<IndexDescriptor>,
    pub changes: Vec<IndexChange>,
    pub deletions: Vec<IndexDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeyChanges {
    pub additions: Vec<ForeignKeyDescriptor>,
    pub changes: Vec<ForeignKeyChange>,
    /// Constraint names of dropped foreign keys
    pub deletions: Vec<String>,
}

/// Changes to apply to an existing table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDiff {
    pub schema: Option<String>,
    /// Current table name
    pub table: String,
    pub rename_to: Option<String>,
    /// Options to change; unset options are left alone
    pub options: TableOptions,
    pub columns: ColumnChanges,
    pub indexes: IndexChanges,
    pub foreign_keys: ForeignKeyChanges,
}

impl TableDiff {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_column(mut self, field: FieldDescriptor, placement: Option<Placement>) -> Self {
        self.columns.additions.push(ColumnAddition { field, placement });
        self
    }

    pub fn change_column(
        mut self,
        original_name: impl Into<String>,
        field: FieldDescriptor,
        placement: Option<Placement>,
    ) -> Self {
        self.columns.changes.push(ColumnChange {
            original_name: original_name.into(),
            field,
            placement,
        });
        self
    }

    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.columns.deletions.push(name.into());
        self
    }

    pub fn add_index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.additions.push(index);
        self
    }

    pub fn change_index(
        mut self,
        old_name: impl Into<String>,
        old_kind: IndexKind,
        index: IndexDescriptor,
    ) -> Self {
        self.indexes.changes.push(IndexChange {
            old_name: old_name.into(),
            old_kind,
            index,
        });
        self
    }

    pub fn drop_index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.deletions.push(index);
        self
    }

    pub fn add_foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.additions.push(foreign_key);
        self
    }

    pub fn change_foreign_key(
        mut self,
        old_constraint: impl Into<String>,
        foreign_key: ForeignKeyDescriptor,
    ) -> Self {
        self.foreign_keys.changes.push(ForeignKeyChange {
            old_constraint: old_constraint.into(),
            foreign_key,
        });
        self
    }

    pub fn drop_foreign_key(mut self, constraint: impl Into<String>) -> Self {
        self.foreign_keys.deletions.push(constraint.into());
        self
    }

    /// True when compiling the diff would produce no statement
    pub fn is_empty(&self) -> bool {
        self.rename_to.is_none()
            && !self.options.has_options()
            && self.columns == ColumnChanges::default()
            && self.indexes == IndexChanges::default()
            && self.foreign_keys == ForeignKeyChanges::default()
    }

    /// Check the diff against the definition it applies to.
    ///
    /// Changed and dropped columns must exist in `prior`; added columns and
    /// new names of renamed columns must not collide with a surviving column.
    pub fn validate(&self, prior: &TableDefinition) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for name in &self.columns.deletions {
            if !prior.has_field(name) {
                errors.push(ValidationError::new(
                    format!("columns.{}", name),
                    "Dropped column does not exist",
                ));
            }
        }
        for change in &self.columns.changes {
            if !prior.has_field(&change.original_name) {
                errors.push(ValidationError::new(
                    format!("columns.{}", change.original_name),
                    "Changed column does not exist",
                ));
            }
        }

        let removed: HashSet<&str> = self
            .columns
            .deletions
            .iter()
            .map(String::as_str)
            .chain(
                self.columns
                    .changes
                    .iter()
                    .filter(|c| c.is_rename())
                    .map(|c| c.original_name.as_str()),
            )
            .collect();
        let mut surviving: HashSet<&str> = prior
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| !removed.contains(name))
            .collect();

        for change in self.columns.changes.iter().filter(|c| c.is_rename()) {
            if !surviving.insert(change.field.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("columns.{}", change.field.name),
                    "Renamed column collides with an existing column",
                ));
            }
        }
        for addition in &self.columns.additions {
            if !surviving.insert(addition.field.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("columns.{}", addition.field.name),
                    "Added column collides with an existing column",
                ));
            }
        }

        for change in &self.indexes.changes {
            if !prior.indexes.iter().any(|i| i.name == change.old_name) {
                errors.push(ValidationError::new(
                    format!("indexes.{}", change.old_name),
                    "Changed index does not exist",
                ));
            }
        }
        for change in &self.foreign_keys.changes {
            if !prior
                .foreign_keys
                .iter()
                .any(|fk| fk.constraint == change.old_constraint)
            {
                errors.push(ValidationError::new(
                    format!("foreign_keys.{}", change.old_constraint),
                    "Changed foreign key does not exist",
                ));
            }
        }

        errors
    }
}
