//! Stored procedure DDL generation

mod manager;


pub use manager::*;
