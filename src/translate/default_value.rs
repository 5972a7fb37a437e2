//! Native default expressions to portable default values.
//!
//! Normalization happens in two dispatch steps: a per-dialect cleaner strips
//! engine decorations (casts, wrapping parentheses, quoting) and recognises
//! NULL sentinels, then per-[`TypeKind`] rules decide the portable form.
//! Values no kind rule claims fall through to the shared call, literal and
//! string rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::Dialect;
use crate::translate::type_mapping::{PortableType, TypeKind};

/// A default value in portable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortableDefault {
    Boolean(bool),
    /// List literal; `quoted` when the elements are strings
    List { items: Vec<String>, quoted: bool },
    /// JSON document, emitted unquoted
    Json(String),
    /// Generate a v4 UUID at insert time
    UuidV4,
    /// Zero-argument database function, by name
    FunctionCall(String),
    Number(String),
    /// Expression evaluated by the database at insert time
    RuntimeLiteral(String),
    /// Plain string, unescaped
    Text(String),
}

impl PortableDefault {
    /// Render back to a native default expression that normalizes to `self`.
    pub fn to_raw(&self) -> String {
        match self {
            PortableDefault::Boolean(value) => value.to_string(),
            PortableDefault::List { items, quoted } => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| {
                        if *quoted {
                            format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
                        } else {
                            item.clone()
                        }
                    })
                    .collect();
                format!("{{{}}}", items.join(","))
            }
            PortableDefault::Json(json) => json.clone(),
            PortableDefault::UuidV4 => "gen_random_uuid()".to_string(),
            PortableDefault::FunctionCall(name) => format!("{}()", name),
            PortableDefault::Number(number) => number.clone(),
            PortableDefault::RuntimeLiteral(expr) => expr.clone(),
            PortableDefault::Text(text) => format!("'{}'", text.replace('\'', "''")),
        }
    }

    /// Whether the value is produced by the database at runtime.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            PortableDefault::UuidV4
                | PortableDefault::FunctionCall(_)
                | PortableDefault::RuntimeLiteral(_)
        )
    }
}

/// A default after dialect cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub value: String,
    /// The value was a quoted string literal in the catalog
    pub quoted: bool,
}

impl Cleaned {
    fn bare(value: &str) -> Self {
        Cleaned {
            value: value.to_string(),
            quoted: false,
        }
    }
}

/// Engine-specific decoration of default expressions.
pub trait DialectDefaults: Send + Sync {
    /// Remove casts, wrapping parentheses and string quoting.
    fn clean(&self, raw: &str) -> Cleaned;

    /// Whether a bare (unquoted) value means "no default".
    fn is_null_sentinel(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("null")
    }
}

// A single literal: `''` is the only quote allowed inside.
static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[Nn]?'((?:[^']|'')*)'$").unwrap());
static QUOTED_CAST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^'((?:[^']|'')*)'::[\w\s".]+(?:\[\])*$"#).unwrap());
static CAST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)^(.*)::([\w\s".]+(?:\[\])*)$"#).unwrap());
static SIMPLE_OPERAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+\w.]+$").unwrap());

fn unquote(value: &str) -> Option<String> {
    QUOTED.captures(value).map(|c| c[1].replace("''", "'"))
}

fn strip_outer_parens(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner.trim())
}

/// Strip a cast applied to the whole value, never one applied to a trailing operand.
fn strip_top_level_cast(value: &str) -> Option<String> {
    let caps = CAST.captures(value)?;
    if caps[2].trim().eq_ignore_ascii_case("regclass") {
        return None;
    }
    let left = caps[1].trim();
    (SIMPLE_OPERAND.is_match(left) || strip_outer_parens(left).is_some()).then(|| left.to_string())
}

fn clean_quoted(value: &str) -> Cleaned {
    match unquote(value) {
        Some(text) => Cleaned {
            value: text,
            quoted: true,
        },
        None => Cleaned::bare(value),
    }
}

struct PostgresDefaults;

impl DialectDefaults for PostgresDefaults {
    fn clean(&self, raw: &str) -> Cleaned {
        let mut value = raw.trim().to_string();
        loop {
            if let Some(caps) = QUOTED_CAST.captures(&value) {
                return Cleaned {
                    value: caps[1].replace("''", "'"),
                    quoted: true,
                };
            }
            if let Some(operand) = strip_top_level_cast(&value) {
                value = operand;
                continue;
            }
            if let Some(inner) = strip_outer_parens(&value) {
                value = inner.to_string();
                continue;
            }
            return clean_quoted(&value);
        }
    }
}

struct MysqlDefaults;

impl DialectDefaults for MysqlDefaults {
    fn clean(&self, raw: &str) -> Cleaned {
        clean_quoted(raw.trim())
    }
}

struct MssqlDefaults;

impl DialectDefaults for MssqlDefaults {
    fn clean(&self, raw: &str) -> Cleaned {
        let mut value = raw.trim();
        while let Some(inner) = strip_outer_parens(value) {
            value = inner;
        }
        clean_quoted(value)
    }

    fn is_null_sentinel(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("newid()")
    }
}

struct SqliteDefaults;

impl DialectDefaults for SqliteDefaults {
    fn clean(&self, raw: &str) -> Cleaned {
        let mut value = raw.trim();
        if let Some(inner) = strip_outer_parens(value) {
            value = inner;
        }
        clean_quoted(value)
    }
}

/// Default-value strategy for `dialect`.
pub fn dialect_defaults(dialect: Dialect) -> &'static dyn DialectDefaults {
    match dialect {
        Dialect::Postgres => &PostgresDefaults,
        Dialect::Mysql | Dialect::Mariadb => &MysqlDefaults,
        Dialect::Mssql => &MssqlDefaults,
        Dialect::Sqlite => &SqliteDefaults,
    }
}

type Rule = fn(&Cleaned, &PortableType) -> Option<PortableDefault>;

/// Rules one type family applies before and after the shared call rules.
struct KindRules {
    before_calls: &'static [Rule],
    after_calls: &'static [Rule],
}

const NONE: &[Rule] = &[];
const BOOLEAN: &[Rule] = &[boolean];
const COLLECTION: &[Rule] = &[list];
const JSON: &[Rule] = &[json];
const UUID: &[Rule] = &[uuid_generator];
const NUMERIC: &[Rule] = &[numeric];
const TEMPORAL: &[Rule] = &[current_time];

fn kind_rules(kind: TypeKind) -> KindRules {
    let (before_calls, after_calls) = match kind {
        TypeKind::Boolean => (BOOLEAN, NONE),
        TypeKind::Collection => (COLLECTION, NONE),
        TypeKind::Json => (JSON, NONE),
        TypeKind::Uuid => (UUID, NONE),
        TypeKind::Numeric => (NONE, NUMERIC),
        TypeKind::Temporal => (NONE, TEMPORAL),
        TypeKind::Textual | TypeKind::Other => (NONE, NONE),
    };
    KindRules {
        before_calls,
        after_calls,
    }
}

static TRUTHY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)1|true").unwrap());
static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w.]+)\(\)$").unwrap());
static CALL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^[\w.]+\(.*\)$").unwrap());
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$").unwrap());
static CURRENT_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(current_timestamp|current_date|current_time|localtime|localtimestamp)(\(\d*\))?$")
        .unwrap()
});

fn boolean(value: &Cleaned, _: &PortableType) -> Option<PortableDefault> {
    Some(PortableDefault::Boolean(TRUTHY.is_match(&value.value)))
}

fn list(value: &Cleaned, ty: &PortableType) -> Option<PortableDefault> {
    let element = match ty {
        PortableType::Array(element) => element,
        _ => return None,
    };
    let v = value.value.trim();
    let quoted = !matches!(element.kind(), TypeKind::Numeric | TypeKind::Boolean);
    if let Some(body) = v.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return Some(PortableDefault::List {
            items: split_array_items(body),
            quoted,
        });
    }
    // ARRAY['x'::text, 'y'::text]
    let prefix = v.get(..6)?;
    if !prefix.eq_ignore_ascii_case("array[") {
        return None;
    }
    let body = v[6..].strip_suffix(']')?;
    let items = split_array_items(body)
        .into_iter()
        .map(|item| match item.split_once("::") {
            Some((operand, _)) => operand.trim().to_string(),
            None => item,
        })
        .collect();
    Some(PortableDefault::List { items, quoted })
}

/// Split the body of `{a,"b c",d}` or `ARRAY['a', 'b']` into unquoted items.
fn split_array_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut seen = false;

    for c in body.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                seen = true;
            }
            (None, ',') => {
                items.push(current.trim().to_string());
                current.clear();
            }
            (None, c) => {
                if !c.is_whitespace() || !current.is_empty() {
                    seen = true;
                }
                current.push(c);
            }
        }
    }
    if seen || !items.is_empty() {
        items.push(current.trim().to_string());
    }
    items
}

fn json(value: &Cleaned, _: &PortableType) -> Option<PortableDefault> {
    Some(PortableDefault::Json(value.value.clone()))
}

fn uuid_generator(value: &Cleaned, _: &PortableType) -> Option<PortableDefault> {
    let lower = value.value.to_lowercase();
    (!value.quoted && (lower.contains("gen_random_uuid()") || lower.contains("uuid_generate_v4()")))
        .then_some(PortableDefault::UuidV4)
}

fn numeric(value: &Cleaned, _: &PortableType) -> Option<PortableDefault> {
    if NUMBER.is_match(value.value.trim()) {
        Some(PortableDefault::Number(value.value.trim().to_string()))
    } else {
        Some(PortableDefault::RuntimeLiteral(value.value.clone()))
    }
}

fn current_time(value: &Cleaned, _: &PortableType) -> Option<PortableDefault> {
    (!value.quoted && CURRENT_TIME.is_match(value.value.trim()))
        .then(|| PortableDefault::RuntimeLiteral(value.value.trim().to_string()))
}

/// Call rules shared by every kind: a zero-argument function call becomes a
/// function wrapper, any other embedded call a runtime literal.
fn call(value: &Cleaned) -> Option<PortableDefault> {
    if value.quoted {
        return None;
    }
    let v = value.value.trim();
    if let Some(caps) = FUNCTION_CALL.captures(v) {
        return Some(PortableDefault::FunctionCall(caps[1].to_string()));
    }
    (v.contains("()") || CALL_SUFFIX.is_match(v))
        .then(|| PortableDefault::RuntimeLiteral(v.to_string()))
}

/// Normalize a raw catalog default for a column of type `ty`.
///
/// Returns `None` when the column gets no explicit default: identity columns,
/// and NULL sentinels.
pub fn normalize(
    raw: &str,
    ty: &PortableType,
    dialect: Dialect,
    is_identity: bool,
) -> Option<PortableDefault> {
    if is_identity {
        return None;
    }
    let strategy = dialect_defaults(dialect);
    let cleaned = strategy.clean(raw);
    if !cleaned.quoted && strategy.is_null_sentinel(cleaned.value.trim()) {
        return None;
    }

    let rules = kind_rules(ty.kind());
    rules
        .before_calls
        .iter()
        .find_map(|rule| rule(&cleaned, ty))
        .or_else(|| call(&cleaned))
        .or_else(|| rules.after_calls.iter().find_map(|rule| rule(&cleaned, ty)))
        .or(Some(PortableDefault::Text(cleaned.value)))
}
