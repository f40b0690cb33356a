//! Object DDL generation
//!
//! Builders for schemas, views, triggers, stored procedures, stored
//! functions and scheduled events. Each manager borrows a
//! [`DialectProfile`](quarry_core::DialectProfile) and renders statements for
//! that dialect. Changing an object yields a [`DdlPlan`](quarry_core::DdlPlan):
//! a single in-place statement where the dialect allows it, otherwise the
//! temporary-copy recreate sequence.
//!
//! Stored programs only exist on dialects whose profile enables them; the
//! other dialects get `NotSupported`.

mod common;
pub mod function;
pub mod routine;
pub mod scheduler;
pub mod schema;
pub mod trigger;
pub mod view;

pub use common::{check_collation, definer_clause, temp_name};
pub use function::FunctionManager;
pub use routine::RoutineManager;
pub use scheduler::SchedulerManager;
pub use schema::SchemaManager;
pub use trigger::TriggerManager;
pub use view::ViewManager;
