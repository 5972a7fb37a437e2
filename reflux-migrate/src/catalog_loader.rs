//! Catalog snapshot loading.
//!
//! A snapshot path is either one JSON file holding a whole
//! [`CatalogSnapshot`], or a directory of JSON files. Files in a directory are
//! read in name order and may each hold a whole snapshot or a single
//! [`TableCatalog`]; single tables take the configured dialect.

use std::fs;
use std::path::{Path, PathBuf};

use reflux::{CatalogSnapshot, Dialect, TableCatalog};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("catalog path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is a {found} snapshot but earlier files are {expected}")]
    MixedDialects {
        path: PathBuf,
        expected: Dialect,
        found: Dialect,
    },
}

/// Load a snapshot from a file or a directory of files.
pub fn load_snapshot(path: &Path, dialect: Dialect) -> Result<CatalogSnapshot, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return read_snapshot_file(path, dialect);
    }

    let mut snapshot: Option<CatalogSnapshot> = None;
    for file in json_files(path)? {
        let part = read_snapshot_file(&file, dialect)?;
        match &mut snapshot {
            None => snapshot = Some(part),
            Some(merged) if merged.dialect == part.dialect => merged.tables.extend(part.tables),
            Some(merged) => {
                return Err(LoaderError::MixedDialects {
                    path: file,
                    expected: merged.dialect,
                    found: part.dialect,
                })
            }
        }
    }
    let snapshot = snapshot.unwrap_or_else(|| CatalogSnapshot {
        dialect,
        tables: Vec::new(),
    });
    log::info!(
        "Loaded {} tables ({}) from {}",
        snapshot.tables.len(),
        snapshot.dialect,
        path.display()
    );
    Ok(snapshot)
}

/// `.json` files directly inside `dir`, sorted by name.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let read_err = |source| LoaderError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_snapshot_file(path: &Path, dialect: Dialect) -> Result<CatalogSnapshot, LoaderError> {
    let content = fs::read_to_string(path).map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_json::from_str(&content).map_err(parse_err)?;

    if value.get("tables").is_some() {
        serde_json::from_value(value).map_err(parse_err)
    } else {
        let table: TableCatalog = serde_json::from_value(value).map_err(parse_err)?;
        log::debug!("Read table {} from {}", table.name, path.display());
        Ok(CatalogSnapshot {
            dialect,
            tables: vec![table],
        })
    }
}
