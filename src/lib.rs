//! # Reflux
//!
//! Reverse-engineering compiler from database catalog facts to reversible
//! Sequelize migration programs.
//!
//! A run has three phases:
//!
//! 1. [`assemble`]: raw catalog rows ([`catalog::CatalogSnapshot`]) become a
//!    [`TableData`], with local problems recorded as [`Diagnostic`]s.
//! 2. [`migration`] and [`association`]: each table compiles into a
//!    migration-create program, a migration-constraints program and an
//!    association block. [`pool::CompilePool`] runs the per-table work in parallel.
//! 3. [`writer`]: the programs are ordered and written out.
//!
//! ```no_run
//! use reflux::{Assembler, CatalogSnapshot, CompileOptions, CompilePool, MigrationCompiler};
//! use reflux::writer::{write_all, FileWriter};
//!
//! # fn main() -> reflux::Result<()> {
//! let options = CompileOptions::load()?;
//! let json = std::fs::read_to_string("catalog.json")
//!     .map_err(|e| reflux::RefluxError::io("catalog.json", e))?;
//! let snapshot = CatalogSnapshot::from_json(&json)?;
//! let data = Assembler::from_options(&options).assemble(&snapshot);
//!
//! let compiler = MigrationCompiler::new(&options, data.dialect);
//! let compiled = CompilePool::from_options(&options)
//!     .compile_all(&compiler, &data)
//!     .into_iter()
//!     .collect::<reflux::Result<Vec<_>>>()?;
//!
//! let mut writer = FileWriter::new(&options.output_dir);
//! write_all(&mut writer, &compiled, options.base_timestamp())?;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod association;
pub mod catalog;
pub mod config;
pub mod error;
pub mod migration;
pub mod model;
pub mod naming;
pub mod pool;
pub mod translate;
pub mod writer;

pub use assemble::Assembler;
pub use association::{compile_associations, AssociationBlock, AssociationCompiler};
pub use catalog::{CatalogSnapshot, Dialect, TableCatalog};
pub use config::CompileOptions;
pub use error::{Diagnostic, DiagnosticKind, RefluxError, Result};
pub use migration::{CompiledTable, MigrationCompiler, MigrationProgram};
pub use model::{QualifiedName, TableData, TableEntry};
pub use pool::CompilePool;
