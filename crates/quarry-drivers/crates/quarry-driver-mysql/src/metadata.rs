//! Result-set enrichment lookups

use crate::lookup;
use async_trait::async_trait;
use quarry_core::{DialectProfile, FieldDescriptor, KeyUsage, MetadataSource, Result, Session};
use std::sync::Arc;

/// [`MetadataSource`] backed by `information_schema`
pub struct MySqlMetadata {
    profile: Arc<DialectProfile>,
}

impl MySqlMetadata {
    pub fn new(profile: Arc<DialectProfile>) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl MetadataSource for MySqlMetadata {
    async fn table_columns(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        lookup::table_columns(&self.profile, session, schema, table).await
    }

    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<KeyUsage>> {
        lookup::key_usage(&self.profile, session, schema, Some(table)).await
    }
}
