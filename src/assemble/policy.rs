//! Pluggable naming heuristics used by the assembler.
//!
//! Both primary-key promotion and junction detection depend on the naming
//! habits of the source schema, so each is a trait with a configurable default.

use crate::config::{JunctionConfig, PrimaryKeyConfig};
use crate::model::{ForeignKeySpec, TableEntry};

/// Picks a primary-key column for tables that declare none.
pub trait PrimaryKeyPolicy: Send + Sync {
    /// Column to promote, or `None` to leave the table without a primary key.
    fn infer(&self, table: &TableEntry) -> Option<String>;
}

/// Promotes a column named `id` (any case).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdColumnPolicy;

impl PrimaryKeyPolicy for IdColumnPolicy {
    fn infer(&self, table: &TableEntry) -> Option<String> {
        table
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case("id"))
            .map(|c| c.name.clone())
    }
}

/// Never promotes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPromotion;

impl PrimaryKeyPolicy for NoPromotion {
    fn infer(&self, _table: &TableEntry) -> Option<String> {
        None
    }
}

/// The policy selected by `primary_key.promote_id`.
pub fn primary_key_policy(config: &PrimaryKeyConfig) -> Box<dyn PrimaryKeyPolicy> {
    if config.promote_id {
        Box::new(IdColumnPolicy)
    } else {
        Box::new(NoPromotion)
    }
}

/// Decides which tables realize many-to-many relations.
pub trait JunctionPolicy: Send + Sync {
    /// Foreign keys that take part in junction pairing, in catalog order.
    fn junction_keys<'a>(&self, table: &'a TableEntry) -> Vec<&'a ForeignKeySpec>;

    fn is_junction(&self, table: &TableEntry) -> bool;
}

/// Junction tables are named `<left><infix><right>` and carry at least
/// `min_foreign_keys` outward foreign keys outside the excluded columns.
#[derive(Debug, Clone)]
pub struct InfixJunctionPolicy {
    infix: String,
    min_foreign_keys: usize,
    excluded_columns: Vec<String>,
}

impl InfixJunctionPolicy {
    pub fn new(infix: &str, min_foreign_keys: usize, excluded_columns: Vec<String>) -> Self {
        InfixJunctionPolicy {
            infix: infix.to_lowercase(),
            min_foreign_keys,
            excluded_columns,
        }
    }

    fn name_matches(&self, table: &str) -> bool {
        if self.infix.is_empty() {
            return false;
        }
        let table = table.to_lowercase();
        table.match_indices(&self.infix).any(|(pos, _)| {
            pos > 0 && pos + self.infix.len() < table.len()
        })
    }

    fn is_excluded(&self, column: &str) -> bool {
        self.excluded_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column))
    }
}

impl Default for InfixJunctionPolicy {
    fn default() -> Self {
        InfixJunctionPolicy::from(&JunctionConfig::default())
    }
}

impl From<&JunctionConfig> for InfixJunctionPolicy {
    fn from(config: &JunctionConfig) -> Self {
        InfixJunctionPolicy::new(
            &config.infix,
            config.min_foreign_keys,
            config.excluded_columns.clone(),
        )
    }
}

impl JunctionPolicy for InfixJunctionPolicy {
    fn junction_keys<'a>(&self, table: &'a TableEntry) -> Vec<&'a ForeignKeySpec> {
        let mut keys: Vec<&ForeignKeySpec> = Vec::new();
        for fk in table.foreign_keys() {
            if self.is_excluded(&fk.source.column) {
                continue;
            }
            if keys.iter().any(|k| k.source.column == fk.source.column) {
                continue;
            }
            keys.push(fk);
        }
        keys
    }

    fn is_junction(&self, table: &TableEntry) -> bool {
        self.name_matches(&table.name.table)
            && self.junction_keys(table).len() >= self.min_foreign_keys.max(2)
    }
}
