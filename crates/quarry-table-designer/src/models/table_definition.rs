//! Table definition model

use quarry_core::{FieldDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{TableOptions, ValidationError};

/// Complete definition of a table, the input of CREATE TABLE and the
/// "before" side of a [`crate::TableDiff`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefinition {
    pub schema: Option<String>,
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub options: TableOptions,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Validate the definition
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Table name is required"));
        }

        if self.fields.is_empty() {
            errors.push(ValidationError::new(
                "fields",
                "Table must have at least one column",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                errors.push(ValidationError::new("fields", "Column name is required"));
            } else if !seen.insert(field.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("fields.{}", field.name),
                    "Duplicate column name",
                ));
            }
        }

        let primaries = self
            .indexes
            .iter()
            .filter(|i| i.kind == IndexKind::Primary)
            .count();
        if primaries > 1 {
            errors.push(ValidationError::new(
                "indexes",
                "Table can only have one primary key",
            ));
        }

        for index in &self.indexes {
            if index.columns.is_empty() {
                errors.push(ValidationError::new(
                    format!("indexes.{}", index.name),
                    "Index must cover at least one column",
                ));
            }
            for column in &index.columns {
                if !self.has_field(column) {
                    errors.push(ValidationError::new(
                        format!("indexes.{}", index.name),
                        format!("Unknown column '{}'", column),
                    ));
                }
            }
        }

        for fk in &self.foreign_keys {
            if !self.has_field(&fk.field) {
                errors.push(ValidationError::new(
                    format!("foreign_keys.{}", fk.constraint),
                    format!("Unknown column '{}'", fk.field),
                ));
            }
        }

        errors
    }
}
