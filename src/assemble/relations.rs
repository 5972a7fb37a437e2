//! Association inference from the foreign-key set.

use crate::assemble::policy::JunctionPolicy;
use crate::model::{ForeignKeySpec, Junction, QualifiedName, Relation, RelationKind, TableEntry};
use crate::naming::{recase, Case};

/// Derives model names from table names.
#[derive(Debug, Clone, Copy)]
pub struct ModelNaming {
    pub case: Case,
    pub singularize: bool,
}

impl ModelNaming {
    pub fn model_name(&self, table: &QualifiedName) -> String {
        recase(self.case, &table.table, self.singularize)
    }
}

impl Default for ModelNaming {
    fn default() -> Self {
        ModelNaming {
            case: Case::Original,
            singularize: false,
        }
    }
}

/// Infer every relation, in catalog order.
///
/// Each foreign key of an ordinary table yields a `belongsTo` on the
/// referencing table and a `hasOne`/`hasMany` on the referenced one. Junction
/// keys are paired instead, yielding one `belongsToMany` on each referenced
/// table per pair; any other foreign key of a junction table is treated as ordinary.
pub fn infer_relations(
    tables: &[TableEntry],
    junction: &dyn JunctionPolicy,
    naming: &ModelNaming,
) -> Vec<Relation> {
    let mut relations = Vec::new();
    for table in tables {
        let junction_keys = if table.is_junction {
            junction.junction_keys(table)
        } else {
            Vec::new()
        };

        for fk in table.foreign_keys() {
            if junction_keys
                .iter()
                .any(|k| k.source.column == fk.source.column)
            {
                continue;
            }
            push_one_to_many(&mut relations, table, fk, naming);
        }

        for (i, left) in junction_keys.iter().enumerate() {
            for right in &junction_keys[i + 1..] {
                push_many_to_many(&mut relations, table, left, right, naming);
                push_many_to_many(&mut relations, table, right, left, naming);
            }
        }
    }
    log::debug!("inferred {} relations", relations.len());
    relations
}

fn push_one_to_many(
    relations: &mut Vec<Relation>,
    table: &TableEntry,
    fk: &ForeignKeySpec,
    naming: &ModelNaming,
) {
    let Some(target) = fk.target() else {
        return;
    };
    let is_one = table.column(&fk.source.column).map_or(false, |c| {
        c.primary_key || c.unique.is_unique()
    });

    let belongs_to = Relation {
        kind: RelationKind::BelongsTo,
        parent_table: target.table.clone(),
        parent_model: naming.model_name(&target.table),
        child_table: table.name.clone(),
        child_model: naming.model_name(&table.name),
        foreign_key: fk.source.column.clone(),
        target_key: target.column.clone(),
        through: None,
    };
    let has = Relation {
        kind: if is_one {
            RelationKind::HasOne
        } else {
            RelationKind::HasMany
        },
        ..belongs_to.clone()
    };
    relations.push(belongs_to);
    relations.push(has);
}

/// `belongsToMany` declared on the table `own` references, reaching the table `other` references.
fn push_many_to_many(
    relations: &mut Vec<Relation>,
    table: &TableEntry,
    own: &ForeignKeySpec,
    other: &ForeignKeySpec,
    naming: &ModelNaming,
) {
    let (Some(own_target), Some(other_target)) = (own.target(), other.target()) else {
        return;
    };
    relations.push(Relation {
        kind: RelationKind::BelongsToMany,
        parent_table: own_target.table.clone(),
        parent_model: naming.model_name(&own_target.table),
        child_table: other_target.table.clone(),
        child_model: naming.model_name(&other_target.table),
        foreign_key: own.source.column.clone(),
        target_key: own_target.column.clone(),
        through: Some(Junction {
            table: table.name.clone(),
            other_key: other.source.column.clone(),
        }),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::policy::InfixJunctionPolicy;
    use crate::model::{ColumnDescriptor, ColumnRef, ConstraintKind, ForeignTarget, Unique};

    fn fk(table: &QualifiedName, column: &str, target: &str) -> ForeignKeySpec {
        ForeignKeySpec {
            constraint_name: format!("{}_{}_fkey", table.table, column),
            kind: ConstraintKind::ForeignKey(ForeignTarget {
                table: QualifiedName::new(Some("public"), target),
                column: "id".into(),
            }),
            source: ColumnRef {
                table: table.clone(),
                column: column.into(),
            },
            on_update: None,
            on_delete: None,
            deferrable: false,
            initially_deferred: false,
            generation: None,
        }
    }

    fn table(name: &str, fks: &[(&str, &str)], junction: bool) -> TableEntry {
        let qualified = QualifiedName::new(Some("public"), name);
        let mut entry = TableEntry::new(qualified.clone());
        entry.is_junction = junction;
        for (column, target) in fks {
            entry.columns.push(ColumnDescriptor::new(column, "integer"));
            entry.constraints.push(fk(&qualified, column, target));
        }
        entry
    }

    #[test]
    fn test_foreign_key_yields_belongs_to_and_has_many() {
        let tables = vec![
            table("customers", &[], false),
            table("orders", &[("customer_id", "customers")], false),
        ];
        let relations =
            infer_relations(&tables, &InfixJunctionPolicy::default(), &ModelNaming::default());
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].kind, RelationKind::BelongsTo);
        assert_eq!(relations[0].owner().table, "orders");
        assert_eq!(relations[0].parent_model, "customers");
        assert_eq!(relations[1].kind, RelationKind::HasMany);
        assert_eq!(relations[1].owner().table, "customers");
        assert_eq!(relations[1].foreign_key, "customer_id");
    }

    #[test]
    fn test_unique_foreign_key_yields_has_one() {
        let mut profiles = table("profiles", &[("user_id", "users")], false);
        profiles.columns[0].unique = Unique::Named("profiles_user_id_key".into());
        let relations = infer_relations(
            &[profiles],
            &InfixJunctionPolicy::default(),
            &ModelNaming::default(),
        );
        assert_eq!(relations[1].kind, RelationKind::HasOne);
    }

    #[test]
    fn test_junction_yields_one_belongs_to_many_per_side() {
        let tables = vec![
            table("users", &[], false),
            table("roles", &[], false),
            table(
                "users_x_roles",
                &[("user_id", "users"), ("role_id", "roles"), ("created_by", "users")],
                true,
            ),
        ];
        let naming = ModelNaming {
            case: Case::Pascal,
            singularize: true,
        };
        let relations = infer_relations(&tables, &InfixJunctionPolicy::default(), &naming);

        let many: Vec<&Relation> = relations.iter().filter(|r| r.is_many_to_many()).collect();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].owner().table, "users");
        assert_eq!(many[0].child_model, "Role");
        assert_eq!(many[0].foreign_key, "user_id");
        assert_eq!(many[0].through.as_ref().unwrap().other_key, "role_id");
        assert_eq!(many[1].owner().table, "roles");
        assert_eq!(many[1].child_model, "User");

        // the audit column is still an ordinary reference
        let ordinary: Vec<&Relation> = relations.iter().filter(|r| !r.is_many_to_many()).collect();
        assert_eq!(ordinary.len(), 2);
        assert!(ordinary.iter().all(|r| r.foreign_key == "created_by"));
    }
}
