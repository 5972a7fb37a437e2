//! The assembled relational model.
//!
//! [`TableData`] is the aggregate root handed from the assembler to both
//! compilers. It is built once per run and only read afterwards.

pub mod column;
pub mod constraint;
pub mod index;
pub mod relation;
pub mod trigger;

pub use column::{ArrayElement, ColumnDescriptor, ColumnShape, Unique};
pub use constraint::{
    ColumnRef, ConstraintKind, ForeignKeySpec, ForeignTarget, IdentityGeneration,
    ReferentialAction,
};
pub use index::{IndexField, IndexSpec, SortOrder};
pub use relation::{Junction, Relation, RelationKind};
pub use trigger::{
    FunctionArgument, FunctionSpec, Orientation, TriggerEvent, TriggerSpec, TriggerTiming,
    Volatility,
};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Dialect;
use crate::error::Diagnostic;

/// A table identifier, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub table: String,
}

impl QualifiedName {
    pub fn new(schema: Option<&str>, table: &str) -> Self {
        QualifiedName {
            schema: schema.filter(|s| !s.is_empty()).map(str::to_string),
            table: table.to_string(),
        }
    }

    /// Parse `schema.table` or a bare `table`.
    pub fn parse(value: &str) -> Self {
        match value.split_once('.') {
            Some((schema, table)) => QualifiedName::new(Some(schema), table),
            None => QualifiedName::new(None, value),
        }
    }

    /// Same table name, ignoring the schema when either side lacks one.
    pub fn matches(&self, other: &QualifiedName) -> bool {
        self.table == other.table
            && match (&self.schema, &other.schema) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => f.write_str(&self.table),
        }
    }
}

/// Everything known about one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub name: QualifiedName,
    /// Columns in catalog order
    pub columns: Vec<ColumnDescriptor>,
    /// One entry per (column, constraint) pair
    pub constraints: Vec<ForeignKeySpec>,
    pub indexes: Vec<IndexSpec>,
    pub triggers: Vec<TriggerSpec>,
    pub is_junction: bool,
}

impl TableEntry {
    pub fn new(name: QualifiedName) -> Self {
        TableEntry {
            name,
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
            triggers: Vec::new(),
            is_junction: false,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Constraint specs that involve `column`.
    pub fn constraints_for<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = &'a ForeignKeySpec> + 'a {
        self.constraints.iter().filter(move |c| c.source.column == column)
    }

    /// Constraint specs of kind FOREIGN KEY, in catalog order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeySpec> {
        self.constraints.iter().filter(|c| c.kind.is_foreign_key())
    }

    pub fn has_triggers(&self) -> bool {
        !self.triggers.is_empty()
    }

    /// Functions executed by this table's triggers, deduplicated by signature,
    /// in order of first use.
    pub fn functions(&self) -> Vec<&FunctionSpec> {
        let mut functions: Vec<&FunctionSpec> = Vec::new();
        for trigger in &self.triggers {
            if !functions.iter().any(|f| f.same_signature(&trigger.function)) {
                functions.push(&trigger.function);
            }
        }
        functions
    }
}

/// The assembled model for one compilation run.
#[derive(Debug, Clone)]
pub struct TableData {
    pub dialect: Dialect,
    tables: Vec<TableEntry>,
    positions: HashMap<QualifiedName, usize>,
    pub relations: Vec<Relation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TableData {
    pub fn new(
        dialect: Dialect,
        tables: Vec<TableEntry>,
        relations: Vec<Relation>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let positions = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        TableData {
            dialect,
            tables,
            positions,
            relations,
            diagnostics,
        }
    }

    /// Tables in catalog order
    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&TableEntry> {
        self.positions.get(name).map(|&i| &self.tables[i])
    }

    /// Relations declared on `table` (the side that owns the association call).
    pub fn relations_of<'a>(
        &'a self,
        table: &'a QualifiedName,
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.owner() == table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
