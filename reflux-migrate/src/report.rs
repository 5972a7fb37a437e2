//! Diagnostic summaries for the `check` command.

use std::collections::BTreeMap;

use reflux::{Diagnostic, DiagnosticKind, QualifiedName};

/// Diagnostics grouped by table, in table order.
#[derive(Debug, Default)]
pub struct DiagnosticReport<'a> {
    by_table: BTreeMap<&'a QualifiedName, Vec<&'a Diagnostic>>,
    unresolved: usize,
    malformed: usize,
}

impl<'a> DiagnosticReport<'a> {
    pub fn new(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Self {
        let mut report = DiagnosticReport::default();
        for diagnostic in diagnostics {
            match diagnostic.kind {
                DiagnosticKind::UnresolvedType { .. } => report.unresolved += 1,
                _ => report.malformed += 1,
            }
            report
                .by_table
                .entry(&diagnostic.table)
                .or_default()
                .push(diagnostic);
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.by_table.is_empty()
    }

    /// Columns whose type would be emitted as a bare native string
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Rows skipped during assembly
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn tables(&self) -> impl Iterator<Item = (&'a QualifiedName, &[&'a Diagnostic])> + '_ {
        self.by_table.iter().map(|(table, list)| (*table, list.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_by_kind() {
        let orders = QualifiedName::new(Some("public"), "orders");
        let users = QualifiedName::new(Some("public"), "users");
        let diagnostics = vec![
            Diagnostic::new(
                &users,
                Some("shape"),
                DiagnosticKind::UnresolvedType {
                    native_type: "polygon".into(),
                },
            ),
            Diagnostic::new(
                &orders,
                None,
                DiagnosticKind::MalformedConstraint {
                    reason: "missing constraint_name".into(),
                },
            ),
            Diagnostic::new(
                &orders,
                Some("id"),
                DiagnosticKind::UnresolvedType {
                    native_type: "tsvector".into(),
                },
            ),
        ];

        let report = DiagnosticReport::new(&diagnostics);
        assert!(!report.is_clean());
        assert_eq!(report.unresolved(), 2);
        assert_eq!(report.malformed(), 1);
        let tables: Vec<_> = report.tables().map(|(t, d)| (t.table.clone(), d.len())).collect();
        assert_eq!(tables, vec![("orders".to_string(), 2), ("users".to_string(), 1)]);
    }

    #[test]
    fn test_empty_report_is_clean() {
        assert!(DiagnosticReport::new(&Vec::<Diagnostic>::new()).is_clean());
    }
}
