//! Association compilation.
//!
//! Turns the relations inferred by the assembler into one
//! `Model.associate = (models) => { ... };` block per table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write};

use crate::config::CompileOptions;
use crate::error::{RefluxError, Result};
use crate::migration::source::{js_string, Fragment, SourceWriter};
use crate::model::{QualifiedName, Relation, RelationKind, TableData, TableEntry};
use crate::naming::{camel_case, pluralize, recase, singularize, strip_id_suffix};

/// The association block of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationBlock {
    pub table: QualifiedName,
    pub model: String,
    /// Models this block refers to, keyed by their table. Never contains the
    /// table itself.
    pub needed: BTreeMap<QualifiedName, BTreeSet<String>>,
    /// Number of association calls in `source`
    pub calls: usize,
    pub source: String,
}

impl AssociationBlock {
    pub fn is_empty(&self) -> bool {
        self.calls == 0
    }
}

/// One association call on the owning model.
#[derive(Debug, Clone)]
pub struct AssociationCall<'a> {
    pub model: &'a str,
    pub relation: &'a Relation,
    pub alias: Option<String>,
}

impl AssociationCall<'_> {
    fn options(&self) -> Vec<(&'static str, String)> {
        let relation = self.relation;
        let mut options = Vec::new();
        match relation.kind {
            RelationKind::BelongsTo => {
                options.push(("foreignKey", js_string(&relation.foreign_key)));
                options.push(("targetKey", js_string(&relation.target_key)));
            }
            RelationKind::HasOne | RelationKind::HasMany => {
                options.push(("foreignKey", js_string(&relation.foreign_key)));
                options.push(("sourceKey", js_string(&relation.target_key)));
            }
            RelationKind::BelongsToMany => {
                if let Some(junction) = &relation.through {
                    options.push(("through", js_string(&junction.table.table)));
                    options.push(("foreignKey", js_string(&relation.foreign_key)));
                    options.push(("otherKey", js_string(&junction.other_key)));
                }
            }
        }
        if let Some(alias) = &self.alias {
            options.push(("as", js_string(alias)));
        }
        options
    }

    fn lines(&self) -> Vec<(usize, String)> {
        let mut lines = vec![(
            0,
            format!(
                "{}.{}(models.{}, {{",
                self.model,
                self.relation.kind.method(),
                self.relation.other_model()
            ),
        )];
        lines.extend(
            self.options()
                .into_iter()
                .map(|(key, value)| (1, format!("{}: {},", key, value))),
        );
        lines.push((0, "});".to_string()));
        lines
    }

    /// A call naming an empty model would not parse, so it is kept as a comment.
    fn is_commented(&self) -> bool {
        self.model.is_empty() || self.relation.other_model().is_empty()
    }
}

impl Fragment for AssociationCall<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        let commented = self.is_commented();
        for (offset, line) in self.lines() {
            if commented {
                w.write_raw(&format!("// {}\n", line));
            } else {
                writeln!(w.at(depth + offset), "{}", line)?;
            }
        }
        Ok(())
    }
}

/// Compiles the association blocks of a [`TableData`].
#[derive(Debug, Clone)]
pub struct AssociationCompiler<'a> {
    options: &'a CompileOptions,
    unit: String,
}

impl<'a> AssociationCompiler<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        AssociationCompiler {
            options,
            unit: options.indent_unit(),
        }
    }

    pub fn model_name(&self, table: &QualifiedName) -> String {
        recase(self.options.case_model, &table.table, self.options.singularize)
    }

    /// The block for `table`, which must belong to `data`.
    pub fn compile_table(&self, data: &TableData, table: &TableEntry) -> Result<AssociationBlock> {
        let model = self.model_name(&table.name);
        let relations: Vec<&Relation> = data.relations_of(&table.name).collect();

        let mut w = SourceWriter::new(&self.unit);
        writeln!(w.at(0), "{}.associate = (models) => {{", model)?;
        let mut needed: BTreeMap<QualifiedName, BTreeSet<String>> = BTreeMap::new();
        for relation in &relations {
            let call = AssociationCall {
                model: &model,
                relation,
                alias: alias(relation, &relations),
            };
            call.render(&mut w, 1)?;
            needed
                .entry(relation.other().clone())
                .or_default()
                .insert(relation.other_model().to_string());
        }
        writeln!(w.at(0), "}};")?;
        needed.remove(&table.name);

        Ok(AssociationBlock {
            table: table.name.clone(),
            model,
            needed,
            calls: relations.len(),
            source: w.finish(),
        })
    }

    /// One block per table, in catalog order.
    pub fn compile_all(&self, data: &TableData) -> Result<Vec<AssociationBlock>> {
        data.tables()
            .iter()
            .map(|table| self.compile_table(data, table))
            .collect()
    }

    pub fn compile_named(&self, data: &TableData, name: &QualifiedName) -> Result<AssociationBlock> {
        let table = data
            .get(name)
            .ok_or_else(|| RefluxError::UnknownTable(name.clone()))?;
        self.compile_table(data, table)
    }
}

/// All association blocks of the tables that have any, separated by blank lines.
pub fn compile_associations(data: &TableData, options: &CompileOptions) -> Result<String> {
    let blocks = AssociationCompiler::new(options).compile_all(data)?;
    let sources: Vec<String> = blocks
        .into_iter()
        .filter(|b| !b.is_empty())
        .map(|b| b.source)
        .collect();
    log::debug!("Compiled {} association blocks", sources.len());
    Ok(sources.join("\n"))
}

/// `as` option of a call.
///
/// belongsTo is always aliased after its foreign key and belongsToMany after
/// the far model. hasOne/hasMany are only aliased when the owner has several
/// of them towards the same table.
fn alias(relation: &Relation, siblings: &[&Relation]) -> Option<String> {
    let key = strip_id_suffix(&camel_case(&relation.foreign_key));
    match relation.kind {
        RelationKind::BelongsTo => Some(belongs_to_alias(relation, key)),
        RelationKind::BelongsToMany => Some(camel_case(&pluralize(relation.other_model()))),
        RelationKind::HasOne | RelationKind::HasMany => {
            let parallel = siblings
                .iter()
                .filter(|s| !s.is_many_to_many() && s.kind != RelationKind::BelongsTo)
                .filter(|s| s.other() == relation.other())
                .count();
            if parallel < 2 {
                return None;
            }
            let target = singularize(relation.other_model());
            let target = if relation.kind == RelationKind::HasMany {
                pluralize(&target)
            } else {
                target
            };
            Some(camel_case(&format!("{}_{}", key, target)))
        }
    }
}

/// The foreign-key alias, unless it would shadow the key attribute itself.
fn belongs_to_alias(relation: &Relation, key: String) -> String {
    if key != relation.foreign_key {
        return key;
    }
    let target = camel_case(&singularize(&relation.parent_model));
    if target != relation.foreign_key {
        return target;
    }
    camel_case(&format!("{}_record", target))
}
