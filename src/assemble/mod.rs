//! Relational model assembler.
//!
//! Turns raw catalog rows into [`TableData`]. Rows missing a field the model
//! needs are skipped with a [`Diagnostic`]; the rest of the table is still
//! assembled.

pub mod policy;
pub mod relations;

pub use policy::{
    primary_key_policy, IdColumnPolicy, InfixJunctionPolicy, JunctionPolicy, NoPromotion,
    PrimaryKeyPolicy,
};
pub use relations::{infer_relations, ModelNaming};

use crate::catalog::{
    CatalogSnapshot, ColumnRow, ConstraintClass, ConstraintRow, Dialect, IndexRow, TableCatalog,
    TriggerRow,
};
use crate::config::CompileOptions;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::model::trigger::{action_executes, parse_arguments};
use crate::model::{
    ArrayElement, ColumnDescriptor, ColumnRef, ColumnShape, ConstraintKind, ForeignKeySpec,
    ForeignTarget, FunctionSpec, IdentityGeneration, IndexField, IndexSpec, Orientation,
    QualifiedName, ReferentialAction, SortOrder, TableData, TableEntry, TriggerEvent, TriggerSpec,
    TriggerTiming, Unique, Volatility,
};

/// Builds [`TableData`] from a catalog snapshot.
pub struct Assembler {
    primary_key: Box<dyn PrimaryKeyPolicy>,
    junction: Box<dyn JunctionPolicy>,
    naming: ModelNaming,
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler {
            primary_key: Box::new(IdColumnPolicy),
            junction: Box::new(InfixJunctionPolicy::default()),
            naming: ModelNaming::default(),
        }
    }
}

impl Assembler {
    pub fn from_options(options: &CompileOptions) -> Self {
        Assembler {
            primary_key: primary_key_policy(&options.primary_key),
            junction: Box::new(InfixJunctionPolicy::from(&options.junction)),
            naming: ModelNaming {
                case: options.case_model,
                singularize: options.singularize,
            },
        }
    }

    pub fn with_primary_key_policy(mut self, policy: impl PrimaryKeyPolicy + 'static) -> Self {
        self.primary_key = Box::new(policy);
        self
    }

    pub fn with_junction_policy(mut self, policy: impl JunctionPolicy + 'static) -> Self {
        self.junction = Box::new(policy);
        self
    }

    pub fn with_naming(mut self, naming: ModelNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Assemble every table of the snapshot, then infer relations across them.
    pub fn assemble(&self, snapshot: &CatalogSnapshot) -> TableData {
        let mut diagnostics = Vec::new();
        let tables: Vec<TableEntry> = snapshot
            .tables
            .iter()
            .filter(|t| !t.is_ignored())
            .map(|t| self.assemble_table(snapshot.dialect, t, &mut diagnostics))
            .collect();

        let relations = infer_relations(&tables, self.junction.as_ref(), &self.naming);
        log::info!(
            "assembled {} tables, {} relations, {} diagnostics",
            tables.len(),
            relations.len(),
            diagnostics.len()
        );
        TableData::new(snapshot.dialect, tables, relations, diagnostics)
    }

    /// Assemble one table, appending any diagnostics.
    pub fn assemble_table(
        &self,
        dialect: Dialect,
        catalog: &TableCatalog,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TableEntry {
        let name = QualifiedName::new(catalog.schema.as_deref(), &catalog.name);
        let mut entry = TableEntry::new(name.clone());

        entry.columns = catalog
            .columns
            .iter()
            .map(|row| column_descriptor(dialect, row))
            .collect();

        for row in &catalog.constraints {
            match constraint_spec(dialect, &name, row) {
                Ok(spec) => {
                    apply_constraint(dialect, &mut entry, &spec, row);
                    entry.constraints.push(spec);
                }
                Err(reason) => diagnostics.push(Diagnostic::new(
                    &name,
                    row.source_column.as_deref(),
                    DiagnosticKind::MalformedConstraint { reason },
                )),
            }
        }

        for row in &catalog.indexes {
            match index_spec(row) {
                Ok(index) => entry.indexes.push(index),
                Err(reason) => diagnostics.push(Diagnostic::new(
                    &name,
                    None,
                    DiagnosticKind::MalformedIndex { reason },
                )),
            }
        }

        entry.triggers = merge_triggers(&name, &catalog.triggers, diagnostics);

        if !entry.columns.iter().any(|c| c.primary_key) {
            if let Some(column) = self.primary_key.infer(&entry) {
                log::debug!("{}: promoting '{}' to primary key", name, column);
                if let Some(c) = entry.columns.iter_mut().find(|c| c.name == column) {
                    c.primary_key = true;
                }
            }
        }

        entry.is_junction = self.junction.is_junction(&entry);
        entry
    }
}

/// Column descriptor with its shape resolved from the row's element, enum
/// and spatial fields.
fn column_descriptor(dialect: Dialect, row: &ColumnRow) -> ColumnDescriptor {
    let data_type = row.data_type.trim().to_lowercase();
    let labels = row.enum_values.clone().filter(|v| !v.is_empty());

    let (native, shape) = if data_type == "array" {
        let element = match (&labels, row.element_type.as_deref()) {
            (Some(labels), _) => ArrayElement::Enum(labels.clone()),
            (None, Some(element)) if !element.eq_ignore_ascii_case("user-defined") => {
                ArrayElement::Native(element.to_lowercase())
            }
            _ => ArrayElement::Native(
                row.udt_name
                    .as_deref()
                    .map(|u| u.trim_start_matches('_').to_lowercase())
                    .unwrap_or_default(),
            ),
        };
        ("array".to_string(), ColumnShape::Array(element))
    } else if let Some(labels) = labels {
        ("enum".to_string(), ColumnShape::Enum(labels))
    } else if data_type == "user-defined" {
        let udt = row.udt_name.as_deref().unwrap_or("user-defined").to_lowercase();
        let shape = spatial_shape(&udt, row);
        (udt, shape)
    } else {
        let shape = spatial_shape(&data_type, row);
        (fold_precision(&data_type, row), shape)
    };

    ColumnDescriptor {
        name: row.name.clone(),
        native_type: native,
        shape,
        allow_null: row.allow_null && !row.primary_key,
        default_value: row.default_value.clone(),
        primary_key: row.primary_key,
        unique: Unique::No,
        auto_increment: dialect.is_serial_column(row),
        comment: row.comment.clone(),
    }
}

fn spatial_shape(native: &str, row: &ColumnRow) -> ColumnShape {
    let spatial = native.starts_with("geometry") || native.starts_with("geography");
    let subtype = match (spatial, row.spatial_type.as_deref(), row.srid) {
        (true, Some(kind), Some(srid)) => Some(format!("'{}', {}", kind.to_uppercase(), srid)),
        (true, Some(kind), None) => Some(format!("'{}'", kind.to_uppercase())),
        _ => None,
    };
    ColumnShape::Plain { subtype }
}

/// `numeric` + precision 10 / scale 2 becomes `numeric(10,2)`.
fn fold_precision(native: &str, row: &ColumnRow) -> String {
    let is_decimal = native.starts_with("numeric") || native.starts_with("decimal");
    match (is_decimal && !native.contains('('), row.numeric_precision) {
        (true, Some(precision)) => match row.numeric_scale {
            Some(scale) => format!("{}({},{})", native, precision, scale),
            None => format!("{}({})", native, precision),
        },
        _ => native.to_string(),
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing {}", field))
}

fn constraint_spec(
    dialect: Dialect,
    table: &QualifiedName,
    row: &ConstraintRow,
) -> Result<ForeignKeySpec, String> {
    let class = dialect.classify(row).ok_or_else(|| {
        format!(
            "unrecognised constraint type '{}'",
            row.constraint_type.as_deref().unwrap_or("")
        )
    })?;
    let column = required(&row.source_column, "source_column")?;
    let constraint_name = required(&row.constraint_name, "constraint_name")?;

    let kind = match class {
        ConstraintClass::PrimaryKey => ConstraintKind::PrimaryKey,
        ConstraintClass::Unique => ConstraintKind::Unique,
        ConstraintClass::ForeignKey => {
            let target_table = required(&row.target_table, "target_table")?;
            let target_column = required(&row.target_column, "target_column")?;
            ConstraintKind::ForeignKey(ForeignTarget {
                table: QualifiedName::new(row.target_schema.as_deref(), target_table),
                column: target_column.to_string(),
            })
        }
    };

    let source_table = match row.source_table.as_deref().filter(|t| !t.is_empty()) {
        Some(source) => QualifiedName::new(
            row.source_schema.as_deref().or(table.schema.as_deref()),
            source,
        ),
        None => table.clone(),
    };

    Ok(ForeignKeySpec {
        constraint_name: constraint_name.to_string(),
        kind,
        source: ColumnRef {
            table: source_table,
            column: column.to_string(),
        },
        on_update: row.on_update.as_deref().and_then(ReferentialAction::parse),
        on_delete: row.on_delete.as_deref().and_then(ReferentialAction::parse),
        deferrable: row.is_deferrable,
        initially_deferred: row.initially_deferred,
        generation: row.generation.as_deref().and_then(IdentityGeneration::parse),
    })
}

/// Fold a constraint into the attributes of the column it covers.
fn apply_constraint(
    dialect: Dialect,
    entry: &mut TableEntry,
    spec: &ForeignKeySpec,
    row: &ConstraintRow,
) {
    let Some(column) = entry
        .columns
        .iter_mut()
        .find(|c| c.name == spec.source.column)
    else {
        return;
    };
    match spec.kind {
        ConstraintKind::PrimaryKey => {
            column.primary_key = true;
            column.allow_null = false;
        }
        ConstraintKind::Unique => {
            column.unique = Unique::Named(spec.constraint_name.clone());
        }
        ConstraintKind::ForeignKey(_) => {}
    }
    if dialect.is_serial_key(row) {
        column.auto_increment = true;
    }
}

fn index_spec(row: &IndexRow) -> Result<IndexSpec, String> {
    let name = required(&row.name, "index name")?;
    if row.fields.is_empty() {
        return Err(format!("index '{}' has no fields", name));
    }
    let fields = row
        .fields
        .iter()
        .map(|f| {
            let column = required(&f.attribute, "index field attribute")
                .map_err(|e| format!("index '{}': {}", name, e))?;
            Ok(IndexField {
                column: column.to_string(),
                collate: f.collate.clone().filter(|c| !c.is_empty()),
                length: f.length,
                order: f.order.as_deref().map(SortOrder::parse).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(IndexSpec {
        name: name.to_string(),
        unique: row.unique,
        primary: row.primary,
        index_type: row.index_type.clone().filter(|t| !t.is_empty()),
        method: row.method.clone().filter(|m| !m.is_empty()),
        fields,
    })
}

/// Merge per-event trigger rows into one trigger each, in order of first appearance.
fn merge_triggers(
    table: &QualifiedName,
    rows: &[TriggerRow],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<TriggerSpec> {
    let mut triggers: Vec<TriggerSpec> = Vec::new();
    for row in rows {
        let trigger = match trigger_spec(table, row) {
            Ok(trigger) => trigger,
            Err(kind) => {
                diagnostics.push(Diagnostic::new(table, None, kind));
                continue;
            }
        };
        match triggers.iter_mut().find(|t| t.name == trigger.name) {
            Some(existing) => {
                for event in trigger.events {
                    if !existing.events.contains(&event) {
                        existing.events.push(event);
                    }
                }
            }
            None => triggers.push(trigger),
        }
    }
    triggers
}

fn trigger_spec(table: &QualifiedName, row: &TriggerRow) -> Result<TriggerSpec, DiagnosticKind> {
    let malformed = |reason: String| DiagnosticKind::MalformedTrigger { reason };

    let name = required(&row.trigger_name, "trigger_name").map_err(malformed)?;
    let timing_text = required(&row.action_timing, "action_timing").map_err(malformed)?;
    let timing = TriggerTiming::parse(timing_text)
        .ok_or_else(|| malformed(format!("{}: unknown timing '{}'", name, timing_text)))?;
    let event_text = required(&row.event_manipulation, "event_manipulation").map_err(malformed)?;
    let events = event_text
        .split(" OR ")
        .map(|e| {
            TriggerEvent::parse(e)
                .ok_or_else(|| malformed(format!("{}: unknown event '{}'", name, e.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let action = required(&row.action_statement, "action_statement").map_err(malformed)?;
    let function_name = required(&row.function_name, "function_name").map_err(malformed)?;

    if !action_executes(action, function_name) {
        return Err(DiagnosticKind::UnmatchedTriggerFunction {
            trigger: name.to_string(),
            function: function_name.to_string(),
        });
    }

    let signature = row.argument_types.clone().unwrap_or_default();
    let function = FunctionSpec {
        name: function_name.to_string(),
        arguments: parse_arguments(&signature),
        signature,
        return_type: row
            .result_type
            .clone()
            .unwrap_or_else(|| "trigger".to_string()),
        language: row
            .language
            .clone()
            .unwrap_or_else(|| "plpgsql".to_string()),
        body: row.source.clone().unwrap_or_default(),
        definition: row.definition.clone().filter(|d| !d.trim().is_empty()),
        volatility: row.volatility.as_deref().and_then(Volatility::parse),
        leakproof: row.leakproof,
        strict: row.strict,
        security_definer: row.security_definer,
        cost: row.cost,
    };

    let event_table = match row.event_object_table.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => QualifiedName::new(
            row.event_object_schema.as_deref().or(table.schema.as_deref()),
            t,
        ),
        None => table.clone(),
    };

    Ok(TriggerSpec {
        name: name.to_string(),
        timing,
        events,
        orientation: row
            .action_orientation
            .as_deref()
            .map(Orientation::parse)
            .unwrap_or_default(),
        condition: row.action_condition.clone().filter(|c| !c.trim().is_empty()),
        table: event_table,
        action: action.to_string(),
        function,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IndexFieldRow;
    use crate::model::RelationKind;

    fn column(name: &str, data_type: &str) -> ColumnRow {
        ColumnRow {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    fn constraint(name: &str, kind: &str, column: &str) -> ConstraintRow {
        ConstraintRow {
            constraint_name: Some(name.into()),
            constraint_type: Some(kind.into()),
            source_schema: Some("public".into()),
            source_table: Some("orders".into()),
            source_column: Some(column.into()),
            ..Default::default()
        }
    }

    fn foreign_key(name: &str, column: &str, target: &str) -> ConstraintRow {
        ConstraintRow {
            target_schema: Some("public".into()),
            target_table: Some(target.into()),
            target_column: Some("id".into()),
            on_delete: Some("CASCADE".into()),
            ..constraint(name, "FOREIGN KEY", column)
        }
    }

    fn trigger(event: &str) -> TriggerRow {
        TriggerRow {
            trigger_name: Some("orders_touch".into()),
            action_timing: Some("BEFORE".into()),
            event_manipulation: Some(event.into()),
            action_orientation: Some("ROW".into()),
            action_statement: Some("EXECUTE FUNCTION touch()".into()),
            function_name: Some("touch".into()),
            source: Some("BEGIN NEW.updated_at := now(); RETURN NEW; END;".into()),
            ..Default::default()
        }
    }

    fn snapshot(tables: Vec<TableCatalog>) -> CatalogSnapshot {
        CatalogSnapshot {
            dialect: Dialect::Postgres,
            tables,
        }
    }

    fn orders() -> TableCatalog {
        let mut orders = TableCatalog::new(Some("public"), "orders");
        orders.columns = vec![
            ColumnRow {
                allow_null: false,
                default_value: Some("nextval('orders_id_seq'::regclass)".into()),
                ..column("id", "integer")
            },
            column("customer_id", "integer"),
            ColumnRow {
                numeric_precision: Some(10),
                numeric_scale: Some(2),
                ..column("total", "numeric")
            },
        ];
        orders.constraints = vec![
            constraint("orders_pkey", "PRIMARY KEY", "id"),
            foreign_key("orders_customer_id_fkey", "customer_id", "customers"),
        ];
        orders
    }

    #[test]
    fn test_assemble_columns_and_constraints() {
        let data = Assembler::default().assemble(&snapshot(vec![orders()]));
        let table = data
            .get(&QualifiedName::new(Some("public"), "orders"))
            .unwrap();

        let id = table.column("id").unwrap();
        assert!(id.primary_key);
        assert!(id.auto_increment);
        assert_eq!(table.column("total").unwrap().native_type, "numeric(10,2)");

        let fks: Vec<_> = table.foreign_keys().collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(fks[0].target().unwrap().table.table, "customers");
        assert!(data.diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_foreign_key_is_skipped_with_diagnostic() {
        let mut orders = orders();
        orders.constraints.push(ConstraintRow {
            target_table: None,
            ..foreign_key("orders_broken_fkey", "customer_id", "customers")
        });
        let data = Assembler::default().assemble(&snapshot(vec![orders]));
        let table = &data.tables()[0];
        assert_eq!(table.foreign_keys().count(), 1);
        assert_eq!(data.diagnostics.len(), 1);
        assert!(matches!(
            data.diagnostics[0].kind,
            DiagnosticKind::MalformedConstraint { .. }
        ));
        assert_eq!(data.diagnostics[0].column.as_deref(), Some("customer_id"));
    }

    #[test]
    fn test_id_column_is_promoted_without_primary_key() {
        let mut legacy = TableCatalog::new(Some("public"), "legacy");
        legacy.columns = vec![column("Id", "integer"), column("label", "text")];

        let data = Assembler::default().assemble(&snapshot(vec![legacy.clone()]));
        assert!(data.tables()[0].column("Id").unwrap().primary_key);

        let data = Assembler::default()
            .with_primary_key_policy(NoPromotion)
            .assemble(&snapshot(vec![legacy]));
        assert!(!data.tables()[0].column("Id").unwrap().primary_key);
    }

    #[test]
    fn test_trigger_rows_merge_events() {
        let mut orders = orders();
        orders.triggers = vec![trigger("INSERT"), trigger("UPDATE"), trigger("INSERT")];
        let data = Assembler::default().assemble(&snapshot(vec![orders]));
        let triggers = &data.tables()[0].triggers;
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].events, vec![TriggerEvent::Insert, TriggerEvent::Update]);
        assert_eq!(triggers[0].timing, TriggerTiming::Before);
        assert_eq!(triggers[0].function.name, "touch");
        assert_eq!(triggers[0].table.to_string(), "public.orders");
    }

    #[test]
    fn test_trigger_with_other_function_is_reported() {
        let mut orders = orders();
        orders.triggers = vec![TriggerRow {
            action_statement: Some("EXECUTE FUNCTION something_else()".into()),
            ..trigger("INSERT")
        }];
        let data = Assembler::default().assemble(&snapshot(vec![orders]));
        assert!(data.tables()[0].triggers.is_empty());
        assert!(matches!(
            data.diagnostics[0].kind,
            DiagnosticKind::UnmatchedTriggerFunction { .. }
        ));
    }

    #[test]
    fn test_column_shapes() {
        let mut shapes = TableCatalog::new(Some("public"), "shapes");
        shapes.columns = vec![
            ColumnRow {
                element_type: Some("integer".into()),
                ..column("scores", "ARRAY")
            },
            ColumnRow {
                element_type: Some("USER-DEFINED".into()),
                enum_values: Some(vec!["a".into(), "b".into()]),
                ..column("moods", "ARRAY")
            },
            ColumnRow {
                udt_name: Some("mood".into()),
                enum_values: Some(vec!["happy".into(), "sad".into()]),
                ..column("mood", "USER-DEFINED")
            },
            ColumnRow {
                udt_name: Some("geometry".into()),
                spatial_type: Some("point".into()),
                srid: Some(4326),
                ..column("location", "USER-DEFINED")
            },
        ];
        let data = Assembler::default().assemble(&snapshot(vec![shapes]));
        let table = &data.tables()[0];
        assert_eq!(
            table.columns[0].shape,
            ColumnShape::Array(ArrayElement::Native("integer".into()))
        );
        assert_eq!(
            table.columns[1].shape,
            ColumnShape::Array(ArrayElement::Enum(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            table.columns[2].shape,
            ColumnShape::Enum(vec!["happy".into(), "sad".into()])
        );
        assert_eq!(table.columns[3].native_type, "geometry");
        assert_eq!(
            table.columns[3].shape,
            ColumnShape::Plain {
                subtype: Some("'POINT', 4326".into())
            }
        );
    }

    #[test]
    fn test_indexes_and_malformed_index() {
        let mut orders = orders();
        orders.indexes = vec![
            IndexRow {
                name: Some("orders_total_idx".into()),
                method: Some("BTREE".into()),
                fields: vec![IndexFieldRow {
                    attribute: Some("total".into()),
                    order: Some("DESC".into()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            IndexRow {
                name: Some("orders_empty_idx".into()),
                ..Default::default()
            },
        ];
        let data = Assembler::default().assemble(&snapshot(vec![orders]));
        let indexes = &data.tables()[0].indexes;
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].fields[0].order, SortOrder::Desc);
        assert!(matches!(
            data.diagnostics[0].kind,
            DiagnosticKind::MalformedIndex { .. }
        ));
    }

    #[test]
    fn test_ignored_tables_and_relations() {
        let customers = TableCatalog::new(Some("public"), "customers");
        let meta = TableCatalog::new(None, "SequelizeMeta");
        let data = Assembler::default().assemble(&snapshot(vec![customers, orders(), meta]));
        assert_eq!(data.len(), 2);
        let kinds: Vec<RelationKind> = data.relations.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RelationKind::BelongsTo, RelationKind::HasMany]);
        let customers = QualifiedName::new(Some("public"), "customers");
        assert_eq!(data.relations_of(&customers).count(), 1);
    }
}
