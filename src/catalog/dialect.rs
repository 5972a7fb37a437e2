//! Per-engine classification predicates over raw catalog rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{ColumnRow, ConstraintRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "postgresql")]
    Postgres,
    Mysql,
    Mariadb,
    Mssql,
    Sqlite,
}

/// Constraint kind decided from raw constraint-type text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintClass {
    PrimaryKey,
    Unique,
    ForeignKey,
}

impl Dialect {
    /// Whether tables live in named schemas.
    pub fn has_schema(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Mssql)
    }

    /// Whether identity columns carry an explicit ALWAYS / BY DEFAULT mode.
    pub fn supports_identity_generation(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Classify a constraint row. Rows without usable type text are
    /// foreign keys only when they carry a referenced table (SQLite pragma rows).
    pub fn classify(&self, row: &ConstraintRow) -> Option<ConstraintClass> {
        let raw = row.constraint_type.as_deref().unwrap_or("").trim();
        let class = match (self, raw.to_uppercase().as_str()) {
            (_, "PRIMARY KEY") | (Dialect::Postgres, "P") => Some(ConstraintClass::PrimaryKey),
            (_, "UNIQUE") | (Dialect::Postgres, "U") => Some(ConstraintClass::Unique),
            (_, "FOREIGN KEY") | (Dialect::Postgres, "F") => Some(ConstraintClass::ForeignKey),
            _ => None,
        };
        class.or_else(|| match self {
            Dialect::Sqlite if raw.is_empty() && row.target_table.is_some() => {
                Some(ConstraintClass::ForeignKey)
            }
            _ => None,
        })
    }

    pub fn is_foreign_key(&self, row: &ConstraintRow) -> bool {
        self.classify(row) == Some(ConstraintClass::ForeignKey)
    }

    pub fn is_unique(&self, row: &ConstraintRow) -> bool {
        self.classify(row) == Some(ConstraintClass::Unique)
    }

    pub fn is_primary_key(&self, row: &ConstraintRow) -> bool {
        self.classify(row) == Some(ConstraintClass::PrimaryKey)
    }

    /// Whether a constraint row describes a database-generated key.
    pub fn is_serial_key(&self, row: &ConstraintRow) -> bool {
        match self {
            Dialect::Postgres => {
                is_sequence_default(row.extra.as_deref()) || is_identity(row.generation.as_deref())
            }
            Dialect::Mysql | Dialect::Mariadb => is_auto_increment_extra(row.extra.as_deref()),
            Dialect::Mssql | Dialect::Sqlite => false,
        }
    }

    /// Whether a column row describes a database-generated column.
    pub fn is_serial_column(&self, row: &ColumnRow) -> bool {
        if row.auto_increment {
            return true;
        }
        match self {
            Dialect::Postgres => {
                is_sequence_default(row.default_value.as_deref())
                    || is_identity(row.generation.as_deref())
            }
            Dialect::Mysql | Dialect::Mariadb => is_auto_increment_extra(row.extra.as_deref()),
            Dialect::Mssql | Dialect::Sqlite => false,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Mariadb => "mariadb",
            Dialect::Mssql => "mssql",
            Dialect::Sqlite => "sqlite",
        })
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "mariadb" => Ok(Dialect::Mariadb),
            "mssql" => Ok(Dialect::Mssql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}

/// `nextval('orders_id_seq'::regclass)`
fn is_sequence_default(value: Option<&str>) -> bool {
    value.map_or(false, |v| {
        v.starts_with("nextval") && v.contains("_seq") && v.contains("::regclass")
    })
}

fn is_identity(generation: Option<&str>) -> bool {
    generation.map_or(false, |g| {
        let g = g.trim().to_uppercase();
        g == "ALWAYS" || g == "BY DEFAULT"
    })
}

fn is_auto_increment_extra(extra: Option<&str>) -> bool {
    extra.map_or(false, |e| e.to_lowercase().contains("auto_increment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(kind: &str) -> ConstraintRow {
        ConstraintRow {
            constraint_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_constraint_text() {
        let pg = Dialect::Postgres;
        assert!(pg.is_primary_key(&constraint("PRIMARY KEY")));
        assert!(pg.is_unique(&constraint("unique")));
        assert!(pg.is_foreign_key(&constraint("FOREIGN KEY")));
        assert!(pg.is_foreign_key(&constraint("f")));
        assert!(!Dialect::Mysql.is_foreign_key(&constraint("f")));
        assert_eq!(pg.classify(&constraint("CHECK")), None);
    }

    #[test]
    fn test_sqlite_rows_without_type_are_foreign_keys() {
        let row = ConstraintRow {
            target_table: Some("customers".into()),
            ..Default::default()
        };
        assert!(Dialect::Sqlite.is_foreign_key(&row));
        assert!(!Dialect::Postgres.is_foreign_key(&row));
    }

    #[test]
    fn test_postgres_serial_detection() {
        let mut row = ConstraintRow {
            extra: Some("nextval('orders_id_seq'::regclass)".into()),
            ..Default::default()
        };
        assert!(Dialect::Postgres.is_serial_key(&row));
        row.extra = Some("0".into());
        assert!(!Dialect::Postgres.is_serial_key(&row));
        row.generation = Some("BY DEFAULT".into());
        assert!(Dialect::Postgres.is_serial_key(&row));
    }

    #[test]
    fn test_serial_column_detection() {
        let mysql = ColumnRow {
            extra: Some("auto_increment".into()),
            ..Default::default()
        };
        assert!(Dialect::Mysql.is_serial_column(&mysql));
        assert!(!Dialect::Postgres.is_serial_column(&mysql));

        let flagged = ColumnRow {
            auto_increment: true,
            ..Default::default()
        };
        assert!(Dialect::Mssql.is_serial_column(&flagged));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("mssql".parse::<Dialect>(), Ok(Dialect::Mssql));
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Mariadb.to_string().parse::<Dialect>(), Ok(Dialect::Mariadb));
    }

    #[test]
    fn test_dialect_capabilities() {
        assert!(Dialect::Postgres.has_schema());
        assert!(Dialect::Mssql.has_schema());
        assert!(!Dialect::Mysql.has_schema());
        assert!(Dialect::Postgres.supports_identity_generation());
        assert!(!Dialect::Mssql.supports_identity_generation());
    }
}
