//! Introspection traits
//!
//! [`MetadataSource`] answers the column and key lookups used to enrich
//! result sets. It runs on a session the caller already holds, so enriching a
//! batch never needs a second pooled session.
//!
//! [`SchemaIntrospection`] is the read-only object inspection surface of a
//! database client. Definitions whose required parts cannot be extracted come
//! back as `None` rather than as errors.

use crate::{
    FieldDescriptor, FunctionDescriptor, IndexDescriptor, KeyUsage, Result, RoutineDescriptor,
    SchedulerDescriptor, SchemaStructure, Session, TableSummary, TriggerDescriptor,
    ViewDescriptor,
};
use async_trait::async_trait;

/// Column and key metadata looked up through an existing session
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn table_columns(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldDescriptor>>;

    /// Foreign keys declared on `table`
    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<KeyUsage>>;
}

/// Schema introspection operations
#[async_trait]
pub trait SchemaIntrospection: Send + Sync {
    /// List schema names
    async fn schemas(&self) -> Result<Vec<String>>;

    /// Objects of each schema in `schemas`
    async fn structure(&self, schemas: &[String]) -> Result<Vec<SchemaStructure>>;

    /// Tables and views of one schema
    async fn tables(&self, schema: &str) -> Result<Vec<TableSummary>>;

    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<FieldDescriptor>>;

    async fn table_indexes(&self, schema: &str, table: &str) -> Result<Vec<IndexDescriptor>>;

    /// Foreign keys of one table, or of the whole schema when `table` is `None`
    async fn key_usage(&self, schema: &str, table: Option<&str>) -> Result<Vec<KeyUsage>>;

    async fn view(&self, schema: &str, name: &str) -> Result<Option<ViewDescriptor>>;

    async fn trigger(&self, schema: &str, name: &str) -> Result<Option<TriggerDescriptor>>;

    async fn routine(&self, schema: &str, name: &str) -> Result<Option<RoutineDescriptor>>;

    async fn function(&self, schema: &str, name: &str) -> Result<Option<FunctionDescriptor>>;

    async fn scheduler(&self, schema: &str, name: &str) -> Result<Option<SchedulerDescriptor>>;
}
