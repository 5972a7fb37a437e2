//! Per-table migration compilation.

use std::collections::BTreeMap;

use crate::catalog::Dialect;
use crate::config::CompileOptions;
use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::migration::clause::{
    table_reference, ColumnClause, ConstraintClause, CreateTable, DropFunction, DropTable,
    DropTrigger, FunctionClause, IndexClause, RemoveConstraint, TableOptionsClause,
    TriggerStatement,
};
use crate::migration::program::{MigrationProgram, ProgramBuilder};
use crate::migration::source::js_string;
use crate::model::{ColumnDescriptor, FunctionSpec, QualifiedName, TableEntry};
use crate::naming::{camel_case, recase};
use crate::translate::{normalize, translate, PortableType};

/// Everything produced for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTable {
    pub table: QualifiedName,
    /// Base file name, before the sequence prefix
    pub file_name: String,
    /// The migration-create program
    pub create: MigrationProgram,
    /// The migration-constraints program
    pub constraints: MigrationProgram,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles [`TableEntry`] values into migration programs.
#[derive(Debug, Clone)]
pub struct MigrationCompiler<'a> {
    options: &'a CompileOptions,
    dialect: Dialect,
    unit: String,
}

impl<'a> MigrationCompiler<'a> {
    pub fn new(options: &'a CompileOptions, dialect: Dialect) -> Self {
        MigrationCompiler {
            options,
            dialect,
            unit: options.indent_unit(),
        }
    }

    pub fn file_name(&self, table: &TableEntry) -> String {
        recase(self.options.case_file, &table.name.table, false)
    }

    /// Both programs plus diagnostics for one table.
    pub fn compile(&self, table: &TableEntry) -> Result<CompiledTable> {
        Ok(CompiledTable {
            table: table.name.clone(),
            file_name: self.file_name(table),
            create: self.compile_table(table)?,
            constraints: self.compile_constraints(table)?,
            diagnostics: self.diagnose(table),
        })
    }

    /// Columns whose native type resolves to no portable type.
    pub fn diagnose(&self, table: &TableEntry) -> Vec<Diagnostic> {
        table
            .columns
            .iter()
            .filter(|c| column_type(c).is_unknown())
            .map(|c| {
                Diagnostic::new(
                    &table.name,
                    Some(&c.name),
                    DiagnosticKind::UnresolvedType {
                        native_type: c.native_type.clone(),
                    },
                )
            })
            .collect()
    }

    /// Create the table, its indexes, functions and triggers; undo in reverse.
    pub fn compile_table(&self, table: &TableEntry) -> Result<MigrationProgram> {
        let reference = table_reference(&table.name, self.dialect);

        let mut forward = ProgramBuilder::new(&self.unit);
        forward.push(&CreateTable {
            table: table.name.table.clone(),
            columns: self
                .emitted_columns(table)
                .map(|c| self.column_clause(table, c))
                .collect(),
            options: self.table_options(table),
        })?;

        if !self.options.no_indexes {
            for index in table.indexes.iter().filter(|i| !i.is_implied()) {
                forward.push(&IndexClause {
                    table: reference.clone(),
                    index,
                })?;
            }
        }

        let mut created: Vec<&FunctionSpec> = Vec::new();
        for trigger in &table.triggers {
            if !created.iter().any(|f| f.same_signature(&trigger.function)) {
                forward.push(&FunctionClause::for_function(
                    &trigger.function,
                    self.options.function_query,
                ))?;
                created.push(&trigger.function);
            }
            forward.push(&TriggerStatement(trigger))?;
        }

        let mut reverse = ProgramBuilder::new(&self.unit);
        for trigger in &table.triggers {
            reverse.push(&DropTrigger(trigger))?;
        }
        for function in table.functions() {
            reverse.push(&DropFunction(function))?;
        }
        reverse.push(&DropTable { table: reference })?;

        Ok(MigrationProgram::new(
            &self.unit,
            forward.finish(),
            reverse.finish(),
        ))
    }

    /// Add each named foreign key of the table; undo by removing them.
    pub fn compile_constraints(&self, table: &TableEntry) -> Result<MigrationProgram> {
        let reference = table_reference(&table.name, self.dialect);
        let clauses = self.constraint_clauses(table, &reference);

        let mut forward = ProgramBuilder::new(&self.unit);
        let mut reverse = ProgramBuilder::new(&self.unit);
        for clause in &clauses {
            forward.push(clause)?;
            reverse.push(&RemoveConstraint {
                table: reference.clone(),
                name: clause.name.clone(),
            })?;
        }
        Ok(MigrationProgram::new(
            &self.unit,
            forward.finish(),
            reverse.finish(),
        ))
    }

    fn constraint_clauses(&self, table: &TableEntry, reference: &str) -> Vec<ConstraintClause> {
        let mut clauses: Vec<ConstraintClause> = Vec::new();
        let mut skipped: Vec<&str> = Vec::new();
        for fk in table.foreign_keys() {
            let Some(target) = fk.target() else {
                continue;
            };
            if self.is_excluded(&fk.source.column) {
                skipped.push(&fk.constraint_name);
                continue;
            }
            if let Some(existing) = clauses.iter_mut().find(|c| c.name == fk.constraint_name) {
                existing.fields.push(fk.source.column.clone());
                existing.target_fields.push(target.column.clone());
                continue;
            }
            clauses.push(ConstraintClause {
                table: reference.to_string(),
                name: fk.constraint_name.clone(),
                fields: vec![fk.source.column.clone()],
                references: self.referenced_table(&table.name, &target.table),
                target_fields: vec![target.column.clone()],
                on_delete: fk.on_delete,
                on_update: fk.on_update,
                deferrable: fk.deferrable,
                initially_deferred: fk.initially_deferred,
            });
        }
        // a constraint is all-or-nothing
        clauses.retain(|c| !skipped.contains(&c.name.as_str()));
        clauses
    }

    /// Referenced table, schema-qualified only when it lives in another schema.
    fn referenced_table(&self, source: &QualifiedName, target: &QualifiedName) -> String {
        match &target.schema {
            Some(schema)
                if self.dialect.has_schema() && source.schema.as_deref() != Some(schema) =>
            {
                format!(
                    "{{ tableName: {}, schema: {} }}",
                    js_string(&target.table),
                    js_string(schema)
                )
            }
            _ => js_string(&target.table),
        }
    }

    fn column_clause(&self, table: &TableEntry, column: &ColumnDescriptor) -> ColumnClause {
        let ty = column_type(column);
        let default_value = column
            .default_value
            .as_deref()
            .and_then(|raw| normalize(raw, &ty, self.dialect, column.auto_increment));
        let identity = column.auto_increment
            && self.dialect.supports_identity_generation()
            && table
                .constraints_for(&column.name)
                .any(|c| c.is_primary_key() && c.generation.is_some());

        ColumnClause {
            property: recase(self.options.case_prop, &column.name, false),
            field: column.name.clone(),
            data_type: ty,
            allow_null: column.allow_null,
            default_value,
            primary_key: column.primary_key,
            auto_increment: column.auto_increment,
            identity,
            unique: column.unique.clone(),
            comment: column.comment.clone(),
        }
    }

    fn table_options(&self, table: &TableEntry) -> TableOptionsClause {
        let additional = &self.options.additional;
        let per_table = self.options.table_options_for(&table.name);

        let schema = per_table
            .and_then(|t| t.schema.clone())
            .or_else(|| table.name.schema.clone())
            .filter(|_| self.dialect.has_schema());

        let timestamps = additional.timestamps == Some(true)
            || table.columns.iter().any(|c| self.is_timestamp_field(&c.name));
        let paranoid = additional.paranoid == Some(true)
            || table.columns.iter().any(|c| self.is_paranoid_field(&c.name));

        let mut passthrough: BTreeMap<_, _> = additional.extra.clone();
        if let Some(per_table) = per_table {
            passthrough.extend(per_table.extra.clone());
        }

        TableOptionsClause {
            schema,
            has_trigger: table.has_triggers(),
            timestamps,
            paranoid,
            name: additional.name.then(|| table.name.table.clone()),
            passthrough,
        }
    }

    fn emitted_columns<'t>(
        &'t self,
        table: &'t TableEntry,
    ) -> impl Iterator<Item = &'t ColumnDescriptor> + 't {
        table.columns.iter().filter(move |c| !self.is_excluded(&c.name))
    }

    /// Skipped columns and auto-managed timestamp columns are never emitted.
    fn is_excluded(&self, column: &str) -> bool {
        self.options.is_skipped(column)
            || self.is_timestamp_field(column)
            || self.is_paranoid_field(column)
    }

    fn is_timestamp_field(&self, column: &str) -> bool {
        let additional = &self.options.additional;
        if additional.timestamps == Some(false) {
            return false;
        }
        let camel = camel_case(column);
        matches_field(&additional.created_at, column, &camel, "createdAt")
            || matches_field(&additional.updated_at, column, &camel, "updatedAt")
    }

    fn is_paranoid_field(&self, column: &str) -> bool {
        let additional = &self.options.additional;
        if additional.timestamps == Some(false) || additional.paranoid == Some(false) {
            return false;
        }
        matches_field(&additional.deleted_at, column, &camel_case(column), "deletedAt")
    }
}

/// An explicit override must match exactly; otherwise the camel-cased name must.
fn matches_field(override_name: &Option<String>, column: &str, camel: &str, default: &str) -> bool {
    match override_name {
        Some(name) => name == column,
        None => camel == default,
    }
}

fn column_type(column: &ColumnDescriptor) -> PortableType {
    translate(&column.native_type, None, &column.shape)
}
