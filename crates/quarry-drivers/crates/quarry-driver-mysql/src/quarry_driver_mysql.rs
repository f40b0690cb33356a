//! MySQL/MariaDB driver implementation
//!
//! Connections come from a `mysql_async` pool. [`MySqlClient`] layers the
//! object managers, the table compiler and catalog introspection over a
//! connection; [`introspection`] holds the pure parsers for the server's
//! `SHOW` and `information_schema` output.

mod client;
mod connection;
mod driver;
pub mod introspection;
mod lookup;
mod metadata;

pub use client::MySqlClient;
pub use connection::{MySqlConnection, MySqlSession};
pub use driver::MySqlDriver;
pub use metadata::MySqlMetadata;

/// Port used when the configuration leaves it unset
pub const DEFAULT_PORT: u16 = 3306;
