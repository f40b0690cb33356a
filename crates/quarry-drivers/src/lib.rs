//! Quarry Drivers - Database driver implementations
//!
//! This crate collects the concrete drivers behind the traits defined in
//! `quarry-core` and resolves them by id.

#[cfg(feature = "mysql")]
pub use quarry_driver_mysql as mysql;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from quarry-core
pub use quarry_core::{
    Connection, ConnectionConfig, DatabaseDriver, DialectProfile, QuarryError, QueryOutcome,
    Result, ResultSet, Row, SchemaIntrospection, Session, Value,
};
