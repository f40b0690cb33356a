//! Quarry Query - SQL generation and execution
//!
//! This crate turns values and query descriptions into dialect-correct SQL
//! and runs SQL batches against a driver connection:
//!
//! - [`serializer`] - typed values to SQL literals
//! - [`builder`] - immutable query builder and the dialect renderer
//! - [`batch`] - statement splitting and the sequential [`QueryRunner`]

pub mod batch;
pub mod builder;
pub mod serializer;
#[cfg(test)]
mod test_helpers;

pub use batch::{QueryOptions, QueryRunner, split_statements, strip_comments};
pub use builder::{Fragment, QueryAst, QueryBuilder, render};
pub use serializer::{
    PATTERN_ESCAPES, ValueSerializer, escape_pattern_literal, json_to_sql_insert, serialize_value,
};
