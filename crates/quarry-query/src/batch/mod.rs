//! Statement splitting and batch execution

mod runner;
mod splitter;
#[cfg(test)]
mod tests;

pub use runner::{QueryOptions, QueryRunner};
pub use splitter::{split_statements, strip_comments};
