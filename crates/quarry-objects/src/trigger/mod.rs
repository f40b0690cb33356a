//! Trigger DDL generation

mod manager;

#[cfg(test)]
mod tests;

pub use manager::*;
