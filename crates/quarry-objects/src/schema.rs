//! Schema (database) DDL
//!
//! MySQL calls schemas databases and gives them a default collation;
//! PostgreSQL schemas have neither.

use crate::common::check_collation;
use quarry_core::{DialectProfile, QuarryError, Result};

pub struct SchemaManager<'a> {
    profile: &'a DialectProfile,
}

impl<'a> SchemaManager<'a> {
    pub fn new(profile: &'a DialectProfile) -> Self {
        Self { profile }
    }

    pub fn build_create_schema(&self, name: &str, collation: Option<&str>) -> Result<String> {
        if name.trim().is_empty() {
            return Err(QuarryError::Schema("schema name cannot be empty".into()));
        }
        let mut sql = format!(
            "CREATE {} {}",
            self.profile.ddl.schema_keyword,
            self.profile.quote_identifier(name)
        );
        if let Some(collation) = collation.filter(|c| !c.is_empty()) {
            sql.push_str(&self.collate_clause(collation)?);
        }
        Ok(sql)
    }

    /// Only the default collation can change
    pub fn build_alter_schema(&self, name: &str, collation: &str) -> Result<String> {
        Ok(format!(
            "ALTER {} {}{}",
            self.profile.ddl.schema_keyword,
            self.profile.quote_identifier(name),
            self.collate_clause(collation)?
        ))
    }

    pub fn build_drop_schema(&self, name: &str) -> String {
        format!(
            "DROP {} {}",
            self.profile.ddl.schema_keyword,
            self.profile.quote_identifier(name)
        )
    }

    fn collate_clause(&self, collation: &str) -> Result<String> {
        if !self.profile.ddl.schema_collation {
            return Err(QuarryError::NotSupported(format!(
                "{} schemas have no default collation",
                self.profile.display_name
            )));
        }
        Ok(format!(" COLLATE {}", check_collation(collation)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_core::{mysql_profile, postgres_profile};

    #[test]
    fn test_mysql_databases() {
        let mysql = mysql_profile();
        let manager = SchemaManager::new(&mysql);

        assert_eq!(
            manager.build_create_schema("app", Some("utf8mb4_bin")).unwrap(),
            "CREATE DATABASE `app` COLLATE utf8mb4_bin"
        );
        assert_eq!(
            manager.build_create_schema("app", None).unwrap(),
            "CREATE DATABASE `app`"
        );
        assert_eq!(
            manager.build_alter_schema("app", "latin1_swedish_ci").unwrap(),
            "ALTER DATABASE `app` COLLATE latin1_swedish_ci"
        );
        assert_eq!(manager.build_drop_schema("app"), "DROP DATABASE `app`");
        assert!(manager.build_alter_schema("app", "bad name").is_err());
    }

    #[test]
    fn test_postgres_schemas() {
        let pg = postgres_profile();
        let manager = SchemaManager::new(&pg);

        assert_eq!(
            manager.build_create_schema("reporting", None).unwrap(),
            "CREATE SCHEMA \"reporting\""
        );
        assert_eq!(manager.build_drop_schema("reporting"), "DROP SCHEMA \"reporting\"");
        assert!(matches!(
            manager.build_create_schema("reporting", Some("C")),
            Err(QuarryError::NotSupported(_))
        ));
        assert!(matches!(
            manager.build_create_schema(" ", None),
            Err(QuarryError::Schema(_))
        ));
    }
}
