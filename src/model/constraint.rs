//! Constraint specs.
//!
//! A [`ForeignKeySpec`] exists for every (column, constraint) pair, whatever the
//! constraint kind. The referenced side only exists for FOREIGN KEY specs, which
//! [`ConstraintKind::ForeignKey`] enforces by carrying it.

use std::fmt;

use crate::model::QualifiedName;

/// A column of a specific table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: QualifiedName,
    pub column: String,
}

/// Referenced side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignTarget {
    pub table: QualifiedName,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey(ForeignTarget),
}

impl ConstraintKind {
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, ConstraintKind::ForeignKey(_))
    }

    pub fn target(&self) -> Option<&ForeignTarget> {
        match self {
            ConstraintKind::ForeignKey(target) => Some(target),
            _ => None,
        }
    }
}

/// ON UPDATE / ON DELETE behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    /// Parse catalog text; anything unrecognised means "unspecified".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().replace('_', " ").as_str() {
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            "NO ACTION" => Some(ReferentialAction::NoAction),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Identity generation mode of an identity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

impl IdentityGeneration {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ALWAYS" => Some(IdentityGeneration::Always),
            "BY DEFAULT" => Some(IdentityGeneration::ByDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub constraint_name: String,
    pub kind: ConstraintKind,
    pub source: ColumnRef,
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub generation: Option<IdentityGeneration>,
}

impl ForeignKeySpec {
    pub fn target(&self) -> Option<&ForeignTarget> {
        self.kind.target()
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey)
    }
}
