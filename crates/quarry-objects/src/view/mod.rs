//! View DDL generation
//!
//! CREATE, ALTER (in place or through a recreate plan) and DROP for views.

mod manager;


pub use manager::*;
