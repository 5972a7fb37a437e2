//! Migration fragments: one type per emitted construct.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::catalog::Dialect;
use crate::config::OptionValue;
use crate::migration::source::{
    escape_special, escape_template, js_string, quote_name, Fragment, SourceWriter,
};
use crate::model::{
    FunctionArgument, FunctionSpec, IndexSpec, Orientation, QualifiedName, ReferentialAction,
    SortOrder, TriggerSpec, Unique,
};
use crate::translate::{IntWidth, PortableDefault, PortableType, Precision};

const DATA_TYPES: &str = "Sequelize.DataTypes";

fn precision_suffix(precision: &Option<Precision>) -> String {
    match precision {
        Some(Precision {
            precision,
            scale: Some(scale),
        }) => format!("({},{})", precision, scale),
        Some(Precision {
            precision,
            scale: None,
        }) => format!("({})", precision),
        None => String::new(),
    }
}

fn length_suffix(length: &Option<u32>) -> String {
    length.map(|l| format!("({})", l)).unwrap_or_default()
}

/// Data type expression, e.g. `Sequelize.DataTypes.STRING(255)`.
pub fn data_type(ty: &PortableType) -> String {
    match ty {
        PortableType::Boolean => format!("{}.BOOLEAN", DATA_TYPES),
        PortableType::Integer {
            width,
            unsigned,
            zerofill,
        } => {
            let name = match width {
                IntWidth::Tiny => "TINYINT",
                IntWidth::Small => "SMALLINT",
                IntWidth::Medium => "MEDIUMINT",
                IntWidth::Regular => "INTEGER",
                IntWidth::Big => "BIGINT",
            };
            let mut out = format!("{}.{}", DATA_TYPES, name);
            if *unsigned {
                out.push_str(".UNSIGNED");
            }
            if *zerofill {
                out.push_str(".ZEROFILL");
            }
            out
        }
        PortableType::String { length } => format!("{}.STRING{}", DATA_TYPES, length_suffix(length)),
        PortableType::Char { length } => format!("{}.CHAR{}", DATA_TYPES, length_suffix(length)),
        PortableType::Text { length } => format!("{}.TEXT{}", DATA_TYPES, length_suffix(length)),
        PortableType::Real => format!("{}.REAL", DATA_TYPES),
        PortableType::Float { precision } => {
            format!("{}.FLOAT{}", DATA_TYPES, precision_suffix(precision))
        }
        PortableType::Double { precision } => {
            format!("{}.DOUBLE{}", DATA_TYPES, precision_suffix(precision))
        }
        PortableType::Decimal { precision } => {
            format!("{}.DECIMAL{}", DATA_TYPES, precision_suffix(precision))
        }
        PortableType::Date => format!("{}.DATEONLY", DATA_TYPES),
        PortableType::DateTime { precision } => {
            format!("{}.DATE{}", DATA_TYPES, length_suffix(precision))
        }
        PortableType::Time => format!("{}.TIME", DATA_TYPES),
        PortableType::Uuid => format!("{}.UUID", DATA_TYPES),
        PortableType::Json => format!("{}.JSON", DATA_TYPES),
        PortableType::Jsonb => format!("{}.JSONB", DATA_TYPES),
        PortableType::Blob => format!("{}.BLOB", DATA_TYPES),
        PortableType::Geometry { subtype } => match subtype {
            Some(subtype) => format!("{}.GEOMETRY({})", DATA_TYPES, subtype),
            None => format!("{}.GEOMETRY", DATA_TYPES),
        },
        PortableType::Geography { subtype } => match subtype {
            Some(subtype) => format!("{}.GEOGRAPHY({})", DATA_TYPES, subtype),
            None => format!("{}.GEOGRAPHY", DATA_TYPES),
        },
        PortableType::Range(inner) => format!("{}.RANGE({})", DATA_TYPES, data_type(inner)),
        PortableType::Array(inner) => format!("{}.ARRAY({})", DATA_TYPES, data_type(inner)),
        PortableType::Enum(labels) => {
            let labels: Vec<String> = labels.iter().map(|l| js_string(l)).collect();
            format!("{}.ENUM({})", DATA_TYPES, labels.join(", "))
        }
        PortableType::Hstore => format!("{}.HSTORE", DATA_TYPES),
        PortableType::Inet => format!("{}.INET", DATA_TYPES),
        PortableType::Cidr => format!("{}.CIDR", DATA_TYPES),
        PortableType::Macaddr => format!("{}.MACADDR", DATA_TYPES),
        PortableType::Unknown(native) => js_string(native),
    }
}

/// Default value expression.
pub fn default_expression(value: &PortableDefault) -> String {
    match value {
        PortableDefault::Boolean(b) => b.to_string(),
        PortableDefault::List { items, quoted } => {
            let items: Vec<String> = items
                .iter()
                .map(|item| {
                    if *quoted {
                        format!("\"{}\"", escape_special(item))
                    } else {
                        item.clone()
                    }
                })
                .collect();
            format!("[{}]", items.join(","))
        }
        PortableDefault::Json(json) => json.clone(),
        PortableDefault::UuidV4 => format!("{}.UUIDV4", DATA_TYPES),
        PortableDefault::FunctionCall(name) => format!("Sequelize.Sequelize.fn({})", js_string(name)),
        PortableDefault::Number(number) => number.clone(),
        PortableDefault::RuntimeLiteral(expr) => {
            format!("Sequelize.Sequelize.literal({})", js_string(expr))
        }
        PortableDefault::Text(text) => js_string(text),
    }
}

/// Table argument of query-interface calls: the bare name, or
/// `{ tableName, schema }` when the dialect has schemas.
pub fn table_reference(table: &QualifiedName, dialect: Dialect) -> String {
    match (&table.schema, dialect.has_schema()) {
        (Some(schema), true) => format!(
            "{{ tableName: {}, schema: {} }}",
            js_string(&table.table),
            js_string(schema)
        ),
        _ => js_string(&table.table),
    }
}

/// One attribute of a `createTable` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnClause {
    /// Property name after case conversion
    pub property: String,
    /// Column name, emitted as `field` when it differs from the property
    pub field: String,
    pub data_type: PortableType,
    pub allow_null: bool,
    pub default_value: Option<PortableDefault>,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Generated identity column with an explicit generation mode
    pub identity: bool,
    pub unique: Unique,
    pub comment: Option<String>,
}

impl Fragment for ColumnClause {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(w.at(depth), "{}: {{", quote_name(&self.property))?;
        let attr = depth + 1;
        writeln!(w.at(attr), "type: {},", data_type(&self.data_type))?;
        writeln!(w.at(attr), "allowNull: {},", self.allow_null)?;
        if let Some(value) = &self.default_value {
            writeln!(w.at(attr), "defaultValue: {},", default_expression(value))?;
        }
        if self.primary_key {
            writeln!(w.at(attr), "primaryKey: true,")?;
        }
        if self.auto_increment {
            writeln!(w.at(attr), "autoIncrement: true,")?;
            if self.identity {
                writeln!(w.at(attr), "autoIncrementIdentity: true,")?;
            }
        }
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.is_empty()) {
            writeln!(w.at(attr), "comment: {},", js_string(comment))?;
        }
        match &self.unique {
            Unique::No => {}
            Unique::Yes => writeln!(w.at(attr), "unique: true,")?,
            Unique::Named(name) => writeln!(w.at(attr), "unique: {},", js_string(name))?,
        }
        if self.field != self.property {
            writeln!(w.at(attr), "field: {},", js_string(&self.field))?;
        }
        writeln!(w.at(depth), "}},")
    }
}

fn option_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Int(i) => i.to_string(),
        OptionValue::Text(s) => js_string(s),
    }
}

/// The options argument of `createTable`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOptionsClause {
    pub schema: Option<String>,
    pub has_trigger: bool,
    pub timestamps: bool,
    pub paranoid: bool,
    /// Table name for `name: { singular, plural }`
    pub name: Option<String>,
    pub passthrough: BTreeMap<String, OptionValue>,
}

impl Fragment for TableOptionsClause {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(w.at(depth), "{{")?;
        let attr = depth + 1;
        if let Some(schema) = &self.schema {
            writeln!(w.at(attr), "schema: {},", js_string(schema))?;
        }
        if self.has_trigger {
            writeln!(w.at(attr), "hasTrigger: true,")?;
        }
        writeln!(w.at(attr), "timestamps: {},", self.timestamps)?;
        if self.paranoid {
            writeln!(w.at(attr), "paranoid: true,")?;
        }
        if let Some(name) = &self.name {
            writeln!(w.at(attr), "name: {{")?;
            writeln!(w.at(attr + 1), "singular: {},", js_string(name))?;
            writeln!(w.at(attr + 1), "plural: {},", js_string(name))?;
            writeln!(w.at(attr), "}},")?;
        }
        for (key, value) in &self.passthrough {
            writeln!(w.at(attr), "{}: {},", quote_name(key), option_value(value))?;
        }
        writeln!(w.at(attr), "transaction,")?;
        writeln!(w.at(depth), "}},")
    }
}

/// `createTable` with its columns and options.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<ColumnClause>,
    pub options: TableOptionsClause,
}

impl Fragment for CreateTable {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(w.at(depth), "await queryInterface.createTable(")?;
        writeln!(w.at(depth + 1), "{},", js_string(&self.table))?;
        writeln!(w.at(depth + 1), "{{")?;
        for column in &self.columns {
            column.render(w, depth + 2)?;
        }
        writeln!(w.at(depth + 1), "}},")?;
        self.options.render(w, depth + 1)?;
        writeln!(w.at(depth), ");")
    }
}

/// Index kinds emitted as `type`; anything else is an access method.
const INDEX_TYPES: &[&str] = &["UNIQUE", "FULLTEXT", "SPATIAL"];

/// `addIndex` for one explicit index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexClause<'a> {
    pub table: String,
    pub index: &'a IndexSpec,
}

impl Fragment for IndexClause<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        let index = self.index;
        writeln!(w.at(depth), "await queryInterface.addIndex({}, {{", self.table)?;
        let attr = depth + 1;
        writeln!(w.at(attr), "name: {},", js_string(&index.name))?;
        if index.unique {
            writeln!(w.at(attr), "unique: true,")?;
        }
        let kind = index
            .index_type
            .as_deref()
            .map(str::to_uppercase)
            .filter(|t| INDEX_TYPES.contains(&t.as_str()));
        if let Some(kind) = kind {
            writeln!(w.at(attr), "type: {},", js_string(&kind))?;
        } else if let Some(method) = index.method.as_deref().or(index.index_type.as_deref()) {
            writeln!(w.at(attr), "using: {},", js_string(method))?;
        }
        writeln!(w.at(attr), "fields: [")?;
        for field in &index.fields {
            let mut entry = format!("{{ name: {}", js_string(&field.column));
            if let Some(collate) = &field.collate {
                entry.push_str(&format!(", collate: {}", js_string(collate)));
            }
            if let Some(length) = field.length {
                entry.push_str(&format!(", length: {}", length));
            }
            if field.order == SortOrder::Desc {
                entry.push_str(", order: 'DESC'");
            }
            writeln!(w.at(attr + 1), "{} }},", entry)?;
        }
        writeln!(w.at(attr), "],")?;
        writeln!(w.at(attr), "transaction,")?;
        writeln!(w.at(depth), "}});")
    }
}

fn argument_entry(argument: &FunctionArgument) -> String {
    let mut entry = format!("{{ type: {}", js_string(&argument.data_type));
    if let Some(name) = &argument.name {
        entry.push_str(&format!(", name: {}", js_string(name)));
    }
    if let Some(direction) = &argument.direction {
        entry.push_str(&format!(", direction: {}", js_string(direction)));
    }
    entry.push_str(" }");
    entry
}

fn render_arguments(w: &mut SourceWriter, depth: usize, args: &[FunctionArgument]) -> fmt::Result {
    if args.is_empty() {
        return writeln!(w.at(depth), "[],");
    }
    writeln!(w.at(depth), "[")?;
    for argument in args {
        writeln!(w.at(depth + 1), "{},", argument_entry(argument))?;
    }
    writeln!(w.at(depth), "],")
}

/// How a trigger function is recreated.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionClause<'a> {
    /// `createFunction` with the body stripped of its outer block
    Declare { function: &'a FunctionSpec, body: String },
    /// The catalog's full definition, run as a query
    Definition(String),
}

impl<'a> FunctionClause<'a> {
    /// Prefer a reconstructed declaration unless `use_definition` is set or the
    /// body has no outer `BEGIN ... END;` block; both need a definition to fall back on.
    pub fn for_function(function: &'a FunctionSpec, use_definition: bool) -> Self {
        let body = function.unwrapped_body();
        match (&function.definition, use_definition || body.is_none()) {
            (Some(definition), true) => FunctionClause::Definition(definition.clone()),
            _ => FunctionClause::Declare {
                function,
                body: body.unwrap_or_else(|| function.body.trim().to_string()),
            },
        }
    }
}

fn function_options(function: &FunctionSpec) -> Vec<String> {
    let mut options = Vec::new();
    if let Some(volatility) = function.volatility {
        options.push(volatility.keyword().to_string());
    }
    options.push(if function.leakproof { "LEAKPROOF" } else { "NOT LEAKPROOF" }.to_string());
    if function.strict {
        options.push("STRICT".to_string());
    }
    if function.security_definer {
        options.push("SECURITY DEFINER".to_string());
    }
    if let Some(cost) = function.cost.filter(|c| *c > 0.0) {
        options.push(format!("COST {}", cost));
    }
    options
}

impl Fragment for FunctionClause<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        match self {
            FunctionClause::Definition(definition) => {
                writeln!(w.at(depth), "await queryInterface.sequelize.query(")?;
                write!(w.at(depth + 1), "`")?;
                w.write_raw(&escape_template(definition.trim()));
                writeln!(w, "`,")?;
                writeln!(w.at(depth + 1), "{{ transaction }},")?;
                writeln!(w.at(depth), ");")
            }
            FunctionClause::Declare { function, body } => {
                let attr = depth + 1;
                writeln!(w.at(depth), "await queryInterface.createFunction(")?;
                writeln!(w.at(attr), "{},", js_string(&function.name))?;
                render_arguments(w, attr, &function.arguments)?;
                writeln!(w.at(attr), "{},", js_string(&function.return_type))?;
                writeln!(w.at(attr), "{},", js_string(&function.language))?;
                write!(w.at(attr), "`")?;
                w.write_raw(&escape_template(body));
                writeln!(w, "`,")?;
                writeln!(w.at(attr), "[")?;
                for option in function_options(function) {
                    writeln!(w.at(attr + 1), "{},", js_string(&option))?;
                }
                writeln!(w.at(attr), "],")?;
                writeln!(w.at(attr), "{{ transaction, force: true }},")?;
                writeln!(w.at(depth), ");")
            }
        }
    }
}

/// `dropFunction` for a trigger function.
#[derive(Debug, Clone, PartialEq)]
pub struct DropFunction<'a>(pub &'a FunctionSpec);

impl Fragment for DropFunction<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(w.at(depth), "await queryInterface.dropFunction(")?;
        writeln!(w.at(depth + 1), "{},", js_string(&self.0.name))?;
        render_arguments(w, depth + 1, &self.0.arguments)?;
        writeln!(w.at(depth + 1), "{{ transaction }},")?;
        writeln!(w.at(depth), ");")
    }
}

fn trigger_target(table: &QualifiedName) -> String {
    table.to_string()
}

fn sql_query(w: &mut SourceWriter, depth: usize, sql: &str) -> fmt::Result {
    writeln!(w.at(depth), "await queryInterface.sequelize.query(")?;
    writeln!(w.at(depth + 1), "{},", js_string(sql))?;
    writeln!(w.at(depth + 1), "{{ transaction }},")?;
    writeln!(w.at(depth), ");")
}

/// `CREATE TRIGGER` statement rebuilt from the trigger's parts.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerStatement<'a>(pub &'a TriggerSpec);

impl TriggerStatement<'_> {
    pub fn sql(&self) -> String {
        let trigger = self.0;
        let events: Vec<String> = trigger.events.iter().map(|e| e.to_string()).collect();
        let mut sql = format!(
            "CREATE TRIGGER {} {} {} ON {}",
            trigger.name,
            trigger.timing,
            events.join(" OR "),
            trigger_target(&trigger.table)
        );
        sql.push_str(match trigger.orientation {
            Orientation::Row => " FOR EACH ROW",
            Orientation::Statement => " FOR EACH STATEMENT",
        });
        if let Some(condition) = &trigger.condition {
            let condition = condition.trim();
            let condition = condition
                .strip_prefix("WHEN ")
                .or_else(|| condition.strip_prefix("when "))
                .unwrap_or(condition)
                .trim();
            if condition.starts_with('(') && condition.ends_with(')') {
                sql.push_str(&format!(" WHEN {}", condition));
            } else {
                sql.push_str(&format!(" WHEN ({})", condition));
            }
        }
        sql.push(' ');
        sql.push_str(trigger.action.trim());
        sql
    }
}

impl Fragment for TriggerStatement<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        sql_query(w, depth, &self.sql())
    }
}

/// Idempotent `DROP TRIGGER`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTrigger<'a>(pub &'a TriggerSpec);

impl Fragment for DropTrigger<'_> {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        let sql = format!(
            "DROP TRIGGER IF EXISTS {} ON {}",
            self.0.name,
            trigger_target(&self.0.table)
        );
        sql_query(w, depth, &sql)
    }
}

/// `dropTable`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub table: String,
}

impl Fragment for DropTable {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(
            w.at(depth),
            "await queryInterface.dropTable({}, {{ transaction }});",
            self.table
        )
    }
}

/// `addConstraint` for one named foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintClause {
    pub table: String,
    pub name: String,
    pub fields: Vec<String>,
    /// Referenced table expression
    pub references: String,
    pub target_fields: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

impl Fragment for ConstraintClause {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        let attr = depth + 1;
        let quoted = |names: &[String]| -> String {
            names.iter().map(|n| js_string(n)).collect::<Vec<_>>().join(", ")
        };
        writeln!(w.at(depth), "await queryInterface.addConstraint({}, {{", self.table)?;
        writeln!(w.at(attr), "type: 'foreign key',")?;
        writeln!(w.at(attr), "name: {},", js_string(&self.name))?;
        writeln!(w.at(attr), "fields: [{}],", quoted(&self.fields))?;
        writeln!(w.at(attr), "references: {{")?;
        writeln!(w.at(attr + 1), "table: {},", self.references)?;
        match self.target_fields.as_slice() {
            [single] => writeln!(w.at(attr + 1), "field: {},", js_string(single))?,
            many => writeln!(w.at(attr + 1), "fields: [{}],", quoted(many))?,
        }
        writeln!(w.at(attr), "}},")?;
        if let Some(action) = self.on_delete {
            writeln!(w.at(attr), "onDelete: {},", js_string(action.as_sql()))?;
        }
        if let Some(action) = self.on_update {
            writeln!(w.at(attr), "onUpdate: {},", js_string(action.as_sql()))?;
        }
        if self.deferrable {
            let mode = if self.initially_deferred {
                "INITIALLY_DEFERRED"
            } else {
                "INITIALLY_IMMEDIATE"
            };
            writeln!(w.at(attr), "deferrable: Sequelize.Deferrable.{},", mode)?;
        }
        writeln!(w.at(attr), "transaction,")?;
        writeln!(w.at(depth), "}});")
    }
}

/// `removeConstraint`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveConstraint {
    pub table: String,
    pub name: String,
}

impl Fragment for RemoveConstraint {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result {
        writeln!(
            w.at(depth),
            "await queryInterface.removeConstraint({}, {}, {{ transaction }});",
            self.table,
            js_string(&self.name)
        )
    }
}
