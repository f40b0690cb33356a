//! Service layer for table DDL
//!
//! Provides DDL compilation and table loading.

mod ddl_compiler;
mod table_loader;

pub use ddl_compiler::DdlCompiler;
pub use table_loader::TableLoader;
