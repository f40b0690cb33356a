//! Catalog statements and the lookups shared by the client and the
//! result-set metadata source
//!
//! Every lookup runs on a session the caller already holds.

use crate::introspection::{catalog, column_from_catalog, merge_declared, parse_create_table};
use quarry_core::{DialectProfile, FieldDescriptor, KeyUsage, Result, Row, Session};

pub(crate) async fn fetch(session: &mut dyn Session, sql: &str) -> Result<Vec<Row>> {
    Ok(session.query(sql).await?.into_rows())
}

pub(crate) async fn fetch_one(session: &mut dyn Session, sql: &str) -> Result<Option<Row>> {
    Ok(fetch(session, sql).await?.into_iter().next())
}

pub(crate) fn columns_sql(profile: &DialectProfile, schema: &str, table: &str) -> String {
    format!(
        "SELECT * FROM `information_schema`.`COLUMNS` WHERE `TABLE_SCHEMA` = {} AND `TABLE_NAME` = {} ORDER BY `ORDINAL_POSITION`",
        profile.quote_string(schema),
        profile.quote_string(table)
    )
}

pub(crate) fn key_usage_sql(profile: &DialectProfile, schema: &str, table: Option<&str>) -> String {
    let mut sql = format!(
        "SELECT * FROM `information_schema`.`KEY_COLUMN_USAGE` WHERE `TABLE_SCHEMA` = {}",
        profile.quote_string(schema)
    );
    if let Some(table) = table {
        sql.push_str(&format!(" AND `TABLE_NAME` = {}", profile.quote_string(table)));
    }
    sql.push_str(" AND `REFERENCED_TABLE_NAME` IS NOT NULL");
    sql
}

pub(crate) fn referential_constraints_sql(
    profile: &DialectProfile,
    schema: &str,
    table: Option<&str>,
) -> String {
    let mut sql = format!(
        "SELECT * FROM `information_schema`.`REFERENTIAL_CONSTRAINTS` WHERE `CONSTRAINT_SCHEMA` = {}",
        profile.quote_string(schema)
    );
    if let Some(table) = table {
        sql.push_str(&format!(" AND `TABLE_NAME` = {}", profile.quote_string(table)));
    }
    sql
}

/// Catalog columns overlaid with the declared text of `SHOW CREATE TABLE`
pub(crate) async fn table_columns(
    profile: &DialectProfile,
    session: &mut dyn Session,
    schema: &str,
    table: &str,
) -> Result<Vec<FieldDescriptor>> {
    let fields: Vec<FieldDescriptor> = fetch(session, &columns_sql(profile, schema, table))
        .await?
        .iter()
        .filter_map(|row| column_from_catalog(profile, row))
        .collect();

    let show_create = format!("SHOW CREATE TABLE {}", profile.qualified(Some(schema), table));
    let declared = match fetch_one(session, &show_create).await {
        Ok(row) => row
            .and_then(|r| r.text("Create Table"))
            .map(|text| parse_create_table(&text))
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(schema = %schema, table = %table, error = %e, "could not read table definition, keeping catalog columns");
            Default::default()
        }
    };

    Ok(merge_declared(profile, fields, &declared))
}

pub(crate) async fn key_usage(
    profile: &DialectProfile,
    session: &mut dyn Session,
    schema: &str,
    table: Option<&str>,
) -> Result<Vec<KeyUsage>> {
    let usage = fetch(session, &key_usage_sql(profile, schema, table)).await?;
    if usage.is_empty() {
        return Ok(Vec::new());
    }
    let constraints = fetch(session, &referential_constraints_sql(profile, schema, table)).await?;
    Ok(catalog::key_usage(&usage, &constraints))
}
