//! Persisting compiled migrations.
//!
//! The compiler only produces text. A [`MigrationWriter`] decides where that
//! text goes: [`FileWriter`] writes `.js` files into a directory and
//! [`MemoryWriter`] keeps them in a map for tests and dry runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::error::{RefluxError, Result};
use crate::migration::CompiledTable;
use crate::model::QualifiedName;

/// Suffix of migration-constraints file names.
pub const CONSTRAINTS_SUFFIX: &str = "-foreign-keys";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// migration-create
    Create,
    /// migration-constraints
    Constraints,
}

/// One file to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub table: QualifiedName,
    pub kind: UnitKind,
    /// Ordering key, prefixed to the file name
    pub sequence: u64,
    pub file_name: String,
    pub contents: String,
}

impl MigrationUnit {
    /// `{sequence}-{file_name}.js`, with the constraints suffix where it applies.
    pub fn name(&self) -> String {
        match self.kind {
            UnitKind::Create => format!("{}-{}.js", self.sequence, self.file_name),
            UnitKind::Constraints => {
                format!("{}-{}{}.js", self.sequence, self.file_name, CONSTRAINTS_SUFFIX)
            }
        }
    }
}

/// What was written for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub name: String,
    /// Location on disk, for writers that have one
    pub path: Option<PathBuf>,
    /// Hex SHA-256 of the contents
    pub checksum: String,
}

/// Destination of compiled migration units.
pub trait MigrationWriter {
    fn write(&mut self, unit: &MigrationUnit) -> Result<WrittenFile>;
}

/// Hex SHA-256 of `contents`.
pub fn checksum(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Order compiled tables into units.
///
/// Every create unit comes first, one per table in catalog order, then the
/// constraint units of the tables that have foreign keys. The sequence starts
/// at `base` and grows by one per unit across both passes.
pub fn plan(tables: &[CompiledTable], base: u64) -> Result<Vec<MigrationUnit>> {
    let mut units = Vec::with_capacity(tables.len() * 2);
    let mut sequence = base;
    for table in tables {
        units.push(MigrationUnit {
            table: table.table.clone(),
            kind: UnitKind::Create,
            sequence,
            file_name: table.file_name.clone(),
            contents: table.create.to_module()?,
        });
        sequence += 1;
    }
    for table in tables.iter().filter(|t| !t.constraints.forward.is_empty()) {
        units.push(MigrationUnit {
            table: table.table.clone(),
            kind: UnitKind::Constraints,
            sequence,
            file_name: table.file_name.clone(),
            contents: table.constraints.to_module()?,
        });
        sequence += 1;
    }
    Ok(units)
}

/// Plan and write every unit. Stops at the first failed write; files already
/// written stay where they are.
pub fn write_all(
    writer: &mut dyn MigrationWriter,
    tables: &[CompiledTable],
    base: u64,
) -> Result<Vec<WrittenFile>> {
    let units = plan(tables, base)?;
    let mut written = Vec::with_capacity(units.len());
    for unit in &units {
        let file = writer.write(unit)?;
        log::debug!(
            "Wrote {} ({})",
            file.name,
            file.checksum.get(..12).unwrap_or(&file.checksum)
        );
        written.push(file);
    }
    log::info!("Wrote {} migration files", written.len());
    Ok(written)
}

/// Writes units as files in one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileWriter {
    dir: PathBuf,
}

impl FileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileWriter { dir: dir.into() }
    }

    /// Write an arbitrary named file next to the migrations.
    pub fn write_named(&mut self, name: &str, contents: &str) -> Result<WrittenFile> {
        fs::create_dir_all(&self.dir).map_err(|e| RefluxError::io(&self.dir, e))?;
        let path = self.dir.join(name);
        fs::write(&path, contents).map_err(|e| RefluxError::Write {
            name: name.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(WrittenFile {
            name: name.to_string(),
            path: Some(path),
            checksum: checksum(contents),
        })
    }
}

impl MigrationWriter for FileWriter {
    fn write(&mut self, unit: &MigrationUnit) -> Result<WrittenFile> {
        self.write_named(&unit.name(), &unit.contents)
    }
}

/// Keeps written units in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    files: BTreeMap<String, String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl MigrationWriter for MemoryWriter {
    fn write(&mut self, unit: &MigrationUnit) -> Result<WrittenFile> {
        let name = unit.name();
        let checksum = checksum(&unit.contents);
        self.files.insert(name.clone(), unit.contents.clone());
        Ok(WrittenFile {
            name,
            path: None,
            checksum,
        })
    }
}
