//! Compiler configuration.
//!
//! [`CompileOptions`] loads from `config/reflux.toml` (optional) and environment
//! variables prefixed with `REFLUX` using `__` as the separator, e.g.
//! `REFLUX__COMPILE__INDENTATION=4`. All settings live under the `compile` key.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::catalog::Dialect;
use crate::model::QualifiedName;
use crate::naming::Case;

pub const DEFAULT_CONFIG_FILE: &str = "config/reflux.toml";
pub const ENV_PREFIX: &str = "REFLUX";
const SECTION: &str = "compile";

/// A passthrough table option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Table options applied to every table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalOptions {
    /// `None` auto-detects timestamp columns; `Some(false)` keeps them as plain columns
    #[serde(default)]
    pub timestamps: Option<bool>,
    #[serde(default)]
    pub paranoid: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    /// Emit `name: { singular, plural }`
    #[serde(default)]
    pub name: bool,
    /// Merged verbatim into the table options
    #[serde(flatten)]
    pub extra: BTreeMap<String, OptionValue>,
}

/// Options for one table, merged over [`AdditionalOptions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, OptionValue>,
}

/// Junction-table detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionConfig {
    #[serde(default = "default_junction_infix")]
    pub infix: String,
    #[serde(default = "default_min_foreign_keys")]
    pub min_foreign_keys: usize,
    #[serde(default = "default_excluded_columns")]
    pub excluded_columns: Vec<String>,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        JunctionConfig {
            infix: default_junction_infix(),
            min_foreign_keys: default_min_foreign_keys(),
            excluded_columns: default_excluded_columns(),
        }
    }
}

/// Primary-key inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyConfig {
    /// Promote a column named `id` when no primary key is declared
    #[serde(default = "default_true")]
    pub promote_id: bool,
}

impl Default for PrimaryKeyConfig {
    fn default() -> Self {
        PrimaryKeyConfig { promote_id: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    #[serde(default)]
    pub dialect: Dialect,
    /// Indent with spaces (`true`) or tabs
    #[serde(default = "default_true")]
    pub spaces: bool,
    #[serde(default = "default_indentation")]
    pub indentation: usize,
    #[serde(default)]
    pub case_model: Case,
    #[serde(default)]
    pub case_prop: Case,
    #[serde(default)]
    pub case_file: Case,
    #[serde(default)]
    pub singularize: bool,
    #[serde(default)]
    pub skip_fields: Vec<String>,
    #[serde(default)]
    pub additional: AdditionalOptions,
    #[serde(default)]
    pub table_options: BTreeMap<String, TableOptions>,
    /// Emit the catalog's function definition instead of a reconstructed declaration
    #[serde(default)]
    pub function_query: bool,
    #[serde(default)]
    pub no_indexes: bool,
    #[serde(default)]
    pub primary_key: PrimaryKeyConfig,
    #[serde(default)]
    pub junction: JunctionConfig,
    /// `YYYYMMDDHHMMSS` base of the ordering sequence
    #[serde(default)]
    pub migration_timestamp: Option<u64>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_true() -> bool {
    true
}

fn default_indentation() -> usize {
    2
}

fn default_output_dir() -> String {
    "migrations".to_string()
}

fn default_junction_infix() -> String {
    "_x_".to_string()
}

fn default_min_foreign_keys() -> usize {
    2
}

fn default_excluded_columns() -> Vec<String> {
    [
        "created_by",
        "deleted_by",
        "updated_by",
        "primary_customer",
        "secondary_customer",
        "tertiary_customer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            dialect: Dialect::default(),
            spaces: true,
            indentation: default_indentation(),
            case_model: Case::default(),
            case_prop: Case::default(),
            case_file: Case::default(),
            singularize: false,
            skip_fields: Vec::new(),
            additional: AdditionalOptions::default(),
            table_options: BTreeMap::new(),
            function_query: false,
            no_indexes: false,
            primary_key: PrimaryKeyConfig::default(),
            junction: JunctionConfig::default(),
            migration_timestamp: None,
            workers: None,
            output_dir: default_output_dir(),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("compile.skip_fields")
        .with_list_parse_key("compile.junction.excluded_columns")
}

impl CompileOptions {
    /// Load from `config/reflux.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false)
    }

    /// Load from `path` plus env vars. A missing file is an error only when `required`.
    pub fn load_from(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) if required => return Err(err),
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<CompileOptions>(SECTION) {
            Ok(options) => Ok(options),
            Err(ConfigError::NotFound(_)) => Ok(CompileOptions::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Compile options could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    /// One level of indentation.
    pub fn indent_unit(&self) -> String {
        if self.spaces {
            " ".repeat(self.indentation)
        } else {
            "\t".to_string()
        }
    }

    /// Base of the migration ordering sequence: the configured timestamp when it
    /// has exactly 14 digits, otherwise the current UTC time.
    pub fn base_timestamp(&self) -> u64 {
        match self.migration_timestamp {
            Some(ts) if ts.to_string().len() == 14 => ts,
            _ => Utc::now()
                .format("%Y%m%d%H%M%S")
                .to_string()
                .parse()
                .unwrap_or(0),
        }
    }

    /// Per-table options, looked up as `schema.table` then `table`.
    pub fn table_options_for(&self, table: &QualifiedName) -> Option<&TableOptions> {
        self.table_options
            .get(&table.to_string())
            .or_else(|| self.table_options.get(&table.table))
    }

    pub fn is_skipped(&self, column: &str) -> bool {
        self.skip_fields.iter().any(|f| f == column)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.dialect, Dialect::Postgres);
        assert_eq!(options.indent_unit(), "  ");
        assert_eq!(options.junction.infix, "_x_");
        assert_eq!(options.junction.min_foreign_keys, 2);
        assert!(options.junction.excluded_columns.contains(&"created_by".to_string()));
        assert!(options.primary_key.promote_id);
        assert_eq!(options.output_dir, "migrations");
    }

    #[test]
    fn test_tab_indentation() {
        let options = CompileOptions {
            spaces: false,
            ..Default::default()
        };
        assert_eq!(options.indent_unit(), "\t");
    }

    #[test]
    fn test_base_timestamp_requires_fourteen_digits() {
        let options = CompileOptions {
            migration_timestamp: Some(20240102030405),
            ..Default::default()
        };
        assert_eq!(options.base_timestamp(), 20240102030405);

        let short = CompileOptions {
            migration_timestamp: Some(2024),
            ..Default::default()
        };
        assert_eq!(short.base_timestamp().to_string().len(), 14);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reflux.toml");
        fs::write(
            &path,
            r#"
[compile]
dialect = "mysql"
indentation = 4
case_model = "p"
case_file = "k"
singularize = true
skip_fields = ["legacy_flag"]

[compile.additional]
timestamps = false
underscored = true
comment = "generated"

[compile.table_options.orders]
schema = "sales"
engine = "InnoDB"

[compile.junction]
infix = "_to_"
"#,
        )
        .unwrap();

        let options = CompileOptions::load_from(&path, true).unwrap();
        assert_eq!(options.dialect, Dialect::Mysql);
        assert_eq!(options.indentation, 4);
        assert_eq!(options.case_model, Case::Pascal);
        assert_eq!(options.case_file, Case::Kebab);
        assert!(options.singularize);
        assert!(options.is_skipped("legacy_flag"));
        assert_eq!(options.additional.timestamps, Some(false));
        assert_eq!(
            options.additional.extra.get("underscored"),
            Some(&OptionValue::Bool(true))
        );
        assert_eq!(
            options.additional.extra.get("comment"),
            Some(&OptionValue::Text("generated".into()))
        );
        let orders = options
            .table_options_for(&QualifiedName::new(Some("public"), "orders"))
            .unwrap();
        assert_eq!(orders.schema.as_deref(), Some("sales"));
        assert_eq!(orders.extra.get("engine"), Some(&OptionValue::Text("InnoDB".into())));
        assert_eq!(options.junction.infix, "_to_");
        assert_eq!(options.junction.min_foreign_keys, 2);
    }

    #[test]
    fn test_missing_required_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = CompileOptions::load_from(&dir.path().join("absent.toml"), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = CompileOptions::load_from(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(options.indentation, 2);
    }
}
