//! Quarry Core - shared abstractions of the Quarry database engine
//!
//! This crate provides the traits and types that every other Quarry crate
//! depends on:
//!
//! - `DatabaseDriver`, `Connection`, `Session` - the driver seam
//! - `MetadataSource`, `SchemaIntrospection` - metadata lookups
//! - `DialectProfile` and the dialect registry - per-engine quoting, escaping,
//!   type catalogs and DDL grammar
//! - Structural descriptors (fields, indexes, foreign keys, views, ...)
//! - `Value`, `Row`, `ResultSet` and `QueryOutcome`
//! - `DdlPlan` for multi-statement replacements
//! - `EngineConfig`, the TOML configuration

pub mod config;
mod connection;
mod dialect;
pub mod dialects;
mod driver;
mod error;
mod introspection;
mod plan;
mod schema;
mod types;

pub use config::{EngineConfig, LoggingSettings, ObjectSettings, QueryDefaults};
pub use connection::*;
pub use dialect::*;
pub use dialects::{
    DIALECT_REGISTRY, DialectRegistry, dialect_profile, get_dialect_profile, maria_profile,
    mysql_profile, postgres_profile,
};
pub use driver::*;
pub use error::*;
pub use introspection::*;
pub use plan::*;
pub use schema::*;
pub use types::*;
