//! Inferred associations.

use std::fmt;

use crate::model::QualifiedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl RelationKind {
    /// Association method name on the model.
    pub fn method(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongsTo",
            RelationKind::HasOne => "hasOne",
            RelationKind::HasMany => "hasMany",
            RelationKind::BelongsToMany => "belongsToMany",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// The through-table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub table: QualifiedName,
    /// Junction column referencing the other side
    pub other_key: String,
}

/// One association between two tables.
///
/// `parent` is always the referenced side and `child` the referencing side,
/// except for `BelongsToMany` where `parent` is the table declaring the
/// association and `child` the table reached through the junction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub parent_table: QualifiedName,
    pub parent_model: String,
    pub child_table: QualifiedName,
    pub child_model: String,
    /// Column on the child (or junction) table holding the reference
    pub foreign_key: String,
    /// Referenced column on the parent table
    pub target_key: String,
    pub through: Option<Junction>,
}

impl Relation {
    /// The table whose model declares this association.
    pub fn owner(&self) -> &QualifiedName {
        match self.kind {
            RelationKind::BelongsTo => &self.child_table,
            _ => &self.parent_table,
        }
    }

    /// The table on the far side of the association.
    pub fn other(&self) -> &QualifiedName {
        match self.kind {
            RelationKind::BelongsTo => &self.parent_table,
            _ => &self.child_table,
        }
    }

    /// Model name of the far side.
    pub fn other_model(&self) -> &str {
        match self.kind {
            RelationKind::BelongsTo => &self.parent_model,
            _ => &self.child_model,
        }
    }

    pub fn is_many_to_many(&self) -> bool {
        self.kind == RelationKind::BelongsToMany
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(kind: RelationKind) -> Relation {
        Relation {
            kind,
            parent_table: QualifiedName::new(Some("public"), "customers"),
            parent_model: "customers".into(),
            child_table: QualifiedName::new(Some("public"), "orders"),
            child_model: "orders".into(),
            foreign_key: "customer_id".into(),
            target_key: "id".into(),
            through: None,
        }
    }

    #[test]
    fn test_belongs_to_is_owned_by_child() {
        let rel = relation(RelationKind::BelongsTo);
        assert_eq!(rel.owner().table, "orders");
        assert_eq!(rel.other().table, "customers");
        assert_eq!(rel.other_model(), "customers");
    }

    #[test]
    fn test_has_many_is_owned_by_parent() {
        let rel = relation(RelationKind::HasMany);
        assert_eq!(rel.owner().table, "customers");
        assert_eq!(rel.other_model(), "orders");
        assert!(!rel.is_many_to_many());
        assert_eq!(rel.kind.to_string(), "hasMany");
    }
}
