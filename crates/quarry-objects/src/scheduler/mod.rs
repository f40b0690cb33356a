//! Scheduled event DDL generation

mod manager;


pub use manager::*;
