//! Migration compilation.
//!
//! A [`MigrationCompiler`] turns one [`TableEntry`](crate::model::TableEntry)
//! into two reversible programs: one that creates the table with its indexes,
//! functions and triggers, and one that adds its foreign keys. Every construct
//! is a [`Fragment`](source::Fragment) rendered through a [`SourceWriter`](source::SourceWriter).

pub mod clause;
pub mod compiler;
pub mod program;
pub mod source;

pub use compiler::{CompiledTable, MigrationCompiler};
pub use program::MigrationProgram;
