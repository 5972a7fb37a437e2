//! Tests for catalog_loader module

use std::fs;

use reflux::Dialect;
use reflux_migrate::catalog_loader::{load_snapshot, LoaderError};
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "dialect": "mysql",
    "tables": [
        { "name": "customers", "columns": [{ "name": "id", "data_type": "int" }] },
        { "name": "orders", "columns": [{ "name": "id", "data_type": "int" }] }
    ]
}"#;

#[test]
fn test_load_missing_path() {
    let result = load_snapshot(std::path::Path::new("/nonexistent/catalog.json"), Dialect::Postgres);
    match result {
        Err(LoaderError::NotFound(path)) => assert!(path.ends_with("catalog.json")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_load_snapshot_file_keeps_its_dialect() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.json");
    fs::write(&path, SNAPSHOT).unwrap();

    let snapshot = load_snapshot(&path, Dialect::Postgres).unwrap();
    assert_eq!(snapshot.dialect, Dialect::Mysql);
    assert_eq!(snapshot.tables.len(), 2);
    assert_eq!(snapshot.tables[1].name, "orders");
}

#[test]
fn test_load_directory_of_table_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("02_orders.json"),
        r#"{ "schema": "public", "name": "orders", "columns": [] }"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("01_customers.json"),
        r#"{ "schema": "public", "name": "customers", "columns": [] }"#,
    )
    .unwrap();
    fs::write(temp_dir.path().join("README.md"), "not a table").unwrap();

    let snapshot = load_snapshot(temp_dir.path(), Dialect::Mssql).unwrap();
    assert_eq!(snapshot.dialect, Dialect::Mssql);
    let names: Vec<&str> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "orders"]);
}

#[test]
fn test_load_directory_rejects_mixed_dialects() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.json"), SNAPSHOT).unwrap();
    fs::write(
        temp_dir.path().join("b.json"),
        r#"{ "dialect": "sqlite", "tables": [] }"#,
    )
    .unwrap();

    let err = load_snapshot(temp_dir.path(), Dialect::Postgres).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::MixedDialects {
            expected: Dialect::Mysql,
            found: Dialect::Sqlite,
            ..
        }
    ));
}

#[test]
fn test_load_invalid_json_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = load_snapshot(&path, Dialect::Postgres).unwrap_err();
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_load_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot = load_snapshot(temp_dir.path(), Dialect::Sqlite).unwrap();
    assert_eq!(snapshot.dialect, Dialect::Sqlite);
    assert!(snapshot.tables.is_empty());
}

#[test]
fn test_load_directory_merges_snapshot_files() {
    use reflux::{CatalogSnapshot, TableCatalog};

    let temp_dir = TempDir::new().unwrap();
    for (file, table) in [("a.json", "customers"), ("b.json", "orders")] {
        let snapshot = CatalogSnapshot {
            dialect: Dialect::Sqlite,
            tables: vec![TableCatalog::new(None, table)],
        };
        fs::write(temp_dir.path().join(file), snapshot.to_json().unwrap()).unwrap();
    }

    let snapshot = load_snapshot(temp_dir.path(), Dialect::Postgres).unwrap();
    assert_eq!(snapshot.dialect, Dialect::Sqlite);
    let names: Vec<&str> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "orders"]);
}
