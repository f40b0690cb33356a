//! Introspection parsing
//!
//! Everything here is pure: functions take rows the server already returned
//! and produce descriptors. The SQL that fetches those rows lives in
//! [`crate::MySqlClient`].

pub mod catalog;
mod columns;
mod objects;
pub mod rules;


pub use columns::{DeclaredColumn, column_from_catalog, merge_declared, parse_create_table};
pub use objects::{parse_event, parse_function, parse_routine, parse_trigger, parse_view};
pub use rules::{EVENT_RULES, FUNCTION_RULES, ROUTINE_RULES, Rule, RuleSet, TRIGGER_RULES, VIEW_RULES};
