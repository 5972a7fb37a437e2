//! Raw catalog facts.
//!
//! These rows mirror what the per-dialect metadata queries return. They are
//! consumed as-is by the assembler; every field a query might omit is optional
//! so that malformed rows can be reported instead of rejected wholesale.

pub mod dialect;

pub use dialect::{ConstraintClass, Dialect};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tables that catalog listings report but that never take part in migrations.
pub const IGNORED_TABLES: &[&str] = &["spatial_ref_sys", "SequelizeMeta"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRow {
    pub name: String,
    /// Native type as reported, e.g. `character varying(255)`, `ARRAY`, `USER-DEFINED`
    pub data_type: String,
    pub udt_name: Option<String>,
    /// Element type of `ARRAY` columns
    pub element_type: Option<String>,
    /// Labels of enum columns and enum arrays
    pub enum_values: Option<Vec<String>>,
    /// Subtype of geometry/geography columns, e.g. `POINT`
    pub spatial_type: Option<String>,
    pub srid: Option<i32>,
    pub numeric_precision: Option<u32>,
    pub numeric_scale: Option<u32>,
    pub allow_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Engine-specific extra text (`auto_increment` on MySQL)
    pub extra: Option<String>,
    /// Identity generation mode (`ALWAYS` / `BY DEFAULT`)
    pub generation: Option<String>,
    pub comment: Option<String>,
}

impl Default for ColumnRow {
    fn default() -> Self {
        ColumnRow {
            name: String::new(),
            data_type: String::new(),
            udt_name: None,
            element_type: None,
            enum_values: None,
            spatial_type: None,
            srid: None,
            numeric_precision: None,
            numeric_scale: None,
            allow_null: true,
            default_value: None,
            primary_key: false,
            auto_increment: false,
            extra: None,
            generation: None,
            comment: None,
        }
    }
}

/// One row of the constraint listing: a (constraint, column) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintRow {
    pub constraint_name: Option<String>,
    pub constraint_type: Option<String>,
    pub source_schema: Option<String>,
    pub source_table: Option<String>,
    pub source_column: Option<String>,
    pub target_schema: Option<String>,
    pub target_table: Option<String>,
    pub target_column: Option<String>,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
    /// Column default of the source column
    pub extra: Option<String>,
    /// Identity generation mode of the source column
    pub generation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexFieldRow {
    pub attribute: Option<String>,
    pub collate: Option<String>,
    pub length: Option<u32>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRow {
    pub name: Option<String>,
    pub unique: bool,
    pub primary: bool,
    /// `UNIQUE`, `FULLTEXT` or `SPATIAL`
    pub index_type: Option<String>,
    /// `BTREE`, `HASH`, `GIN`, ...
    pub method: Option<String>,
    pub fields: Vec<IndexFieldRow>,
}

/// One row of the trigger listing joined with its executed function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerRow {
    pub trigger_name: Option<String>,
    pub action_timing: Option<String>,
    pub event_manipulation: Option<String>,
    pub action_condition: Option<String>,
    pub action_orientation: Option<String>,
    pub action_statement: Option<String>,
    pub event_object_schema: Option<String>,
    pub event_object_table: Option<String>,
    pub function_name: Option<String>,
    pub argument_types: Option<String>,
    pub result_type: Option<String>,
    pub language: Option<String>,
    pub source: Option<String>,
    pub definition: Option<String>,
    pub volatility: Option<String>,
    pub leakproof: bool,
    pub strict: bool,
    pub security_definer: bool,
    pub cost: Option<f64>,
}

/// Catalog facts for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCatalog {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnRow>,
    pub constraints: Vec<ConstraintRow>,
    pub indexes: Vec<IndexRow>,
    pub triggers: Vec<TriggerRow>,
}

impl TableCatalog {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        TableCatalog {
            schema: schema.map(str::to_string),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn is_ignored(&self) -> bool {
        IGNORED_TABLES.contains(&self.name.as_str())
    }
}

/// A complete catalog read, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub dialect: Dialect,
    pub tables: Vec<TableCatalog>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
