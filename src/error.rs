//! Error and diagnostic types.
//!
//! [`RefluxError`] covers failures that abort an operation (configuration, I/O,
//! snapshot decoding, writing). Problems local to a single column, constraint
//! or trigger are reported as [`Diagnostic`] values instead and never abort a run.

use std::fmt;
use std::path::PathBuf;

use crate::model::QualifiedName;

/// Errors returned by the compiler and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RefluxError {
    /// Configuration could not be loaded or deserialized
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Filesystem failure on a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog snapshot could not be decoded
    #[error("invalid catalog snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A table was requested that the assembled model does not contain
    #[error("unknown table: {0}")]
    UnknownTable(QualifiedName),

    /// The writer failed to persist a migration unit
    #[error("failed to write migration '{name}': {reason}")]
    Write { name: String, reason: String },

    /// Generated source could not be formatted
    #[error("failed to render migration source: {0}")]
    Render(#[from] std::fmt::Error),

    /// A compile worker died before reporting its result
    #[error("compile worker failed: {0}")]
    Worker(String),
}

impl RefluxError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RefluxError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RefluxError>;

/// What went wrong in a recoverable, locally-scoped problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A native type matched no translation rule
    UnresolvedType { native_type: String },
    /// A constraint row was missing a required field
    MalformedConstraint { reason: String },
    /// An index row was missing a required field
    MalformedIndex { reason: String },
    /// A trigger row was missing a required field
    MalformedTrigger { reason: String },
    /// The trigger's action does not execute the function reported with it
    UnmatchedTriggerFunction { trigger: String, function: String },
}

/// An attributable, non-fatal problem found while assembling or compiling a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub table: QualifiedName,
    pub column: Option<String>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(table: &QualifiedName, column: Option<&str>, kind: DiagnosticKind) -> Self {
        let diagnostic = Diagnostic {
            table: table.clone(),
            column: column.map(str::to_string),
            kind,
        };
        log::warn!("{}", diagnostic);
        diagnostic
    }

    pub fn is_unresolved_type(&self) -> bool {
        matches!(self.kind, DiagnosticKind::UnresolvedType { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{}.{}: ", self.table, column)?,
            None => write!(f, "{}: ", self.table)?,
        }
        match &self.kind {
            DiagnosticKind::UnresolvedType { native_type } => {
                write!(f, "unresolved native type '{}'", native_type)
            }
            DiagnosticKind::MalformedConstraint { reason } => {
                write!(f, "skipped malformed constraint row ({})", reason)
            }
            DiagnosticKind::MalformedIndex { reason } => {
                write!(f, "skipped malformed index row ({})", reason)
            }
            DiagnosticKind::MalformedTrigger { reason } => {
                write!(f, "skipped malformed trigger row ({})", reason)
            }
            DiagnosticKind::UnmatchedTriggerFunction { trigger, function } => write!(
                f,
                "trigger '{}' does not execute its reported function '{}'",
                trigger, function
            ),
        }
    }
}
