//! Native type strings to portable types.
//!
//! Resolution runs every pattern of [`TYPE_RULES`] against the lower-cased native
//! type and keeps the longest match; ties go to the earlier rule. Arrays and
//! ranges resolve their element/base type recursively.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{ArrayElement, ColumnShape};

/// Integer storage width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    Tiny,
    Small,
    Medium,
    Regular,
    Big,
}

/// Precision and optional scale of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub precision: u32,
    pub scale: Option<u32>,
}

impl Precision {
    pub fn new(precision: u32, scale: Option<u32>) -> Self {
        Precision { precision, scale }
    }
}

/// The dialect-independent type vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortableType {
    Boolean,
    Integer {
        width: IntWidth,
        unsigned: bool,
        zerofill: bool,
    },
    String { length: Option<u32> },
    Char { length: Option<u32> },
    Text { length: Option<u32> },
    Real,
    Float { precision: Option<Precision> },
    Double { precision: Option<Precision> },
    Decimal { precision: Option<Precision> },
    Date,
    DateTime { precision: Option<u32> },
    Time,
    Uuid,
    Json,
    Jsonb,
    Blob,
    Geometry { subtype: Option<String> },
    Geography { subtype: Option<String> },
    Range(Box<PortableType>),
    Array(Box<PortableType>),
    Enum(Vec<String>),
    Hstore,
    Inet,
    Cidr,
    Macaddr,
    /// No rule matched; carries the native type for diagnostics
    Unknown(String),
}

/// Coarse type family used to pick default-value rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    Numeric,
    Textual,
    Temporal,
    Json,
    Uuid,
    Collection,
    Other,
}

impl PortableType {
    pub fn kind(&self) -> TypeKind {
        match self {
            PortableType::Boolean => TypeKind::Boolean,
            PortableType::Integer { .. }
            | PortableType::Real
            | PortableType::Float { .. }
            | PortableType::Double { .. }
            | PortableType::Decimal { .. } => TypeKind::Numeric,
            PortableType::String { .. }
            | PortableType::Char { .. }
            | PortableType::Text { .. }
            | PortableType::Enum(_) => TypeKind::Textual,
            PortableType::Date | PortableType::DateTime { .. } | PortableType::Time => {
                TypeKind::Temporal
            }
            PortableType::Json | PortableType::Jsonb => TypeKind::Json,
            PortableType::Uuid => TypeKind::Uuid,
            PortableType::Array(_) | PortableType::Range(_) => TypeKind::Collection,
            _ => TypeKind::Other,
        }
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            PortableType::Unknown(_) => true,
            PortableType::Array(inner) | PortableType::Range(inner) => inner.is_unknown(),
            _ => false,
        }
    }

    /// Element type of arrays and base type of ranges.
    pub fn element(&self) -> Option<&PortableType> {
        match self {
            PortableType::Array(inner) | PortableType::Range(inner) => Some(inner),
            _ => None,
        }
    }
}

struct Input<'a> {
    native: &'a str,
    precision: Option<Precision>,
    shape: &'a ColumnShape,
}

type Build = fn(&Captures<'_>, &Input<'_>) -> PortableType;

struct TypeRule {
    pattern: Regex,
    build: Build,
}

fn rule(pattern: &str, build: Build) -> TypeRule {
    TypeRule {
        pattern: Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid type rule {}: {}", pattern, e)),
        build,
    }
}

static LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)\)").unwrap());
static PRECISION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)(?:\s*,\s*(\d+))?\)").unwrap());
static ENUM_LABELS: Lazy<Regex> = Lazy::new(|| Regex::new(r"'((?:[^']|'')*)'").unwrap());

fn length(native: &str) -> Option<u32> {
    LENGTH
        .captures(native)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn precision(input: &Input<'_>) -> Option<Precision> {
    PRECISION
        .captures(input.native)
        .and_then(|c| {
            let precision = c.get(1)?.as_str().parse().ok()?;
            let scale = c.get(2).and_then(|m| m.as_str().parse().ok());
            Some(Precision::new(precision, scale))
        })
        .or(input.precision)
}

fn integer(caps: &Captures<'_>, input: &Input<'_>) -> PortableType {
    let width = match &caps[1] {
        "bigint" | "int8" | "bigserial" | "serial8" => IntWidth::Big,
        "smallint" | "int2" | "smallserial" | "serial2" => IntWidth::Small,
        "mediumint" => IntWidth::Medium,
        "tinyint" => IntWidth::Tiny,
        _ => IntWidth::Regular,
    };
    PortableType::Integer {
        width,
        unsigned: input.native.contains("unsigned"),
        zerofill: input.native.contains("zerofill"),
    }
}

fn range(caps: &Captures<'_>, _: &Input<'_>) -> PortableType {
    let base = match &caps[1] {
        "num" => "numeric",
        "int4" => "integer",
        "int8" => "bigint",
        "date" => "date",
        "ts" => "timestamp without time zone",
        "tstz" => "timestamp with time zone",
        other => other,
    };
    PortableType::Range(Box::new(translate(base, None, &ColumnShape::default())))
}

fn array(_: &Captures<'_>, input: &Input<'_>) -> PortableType {
    let element = match input.shape {
        ColumnShape::Array(ArrayElement::Native(native)) => {
            translate(native, None, &ColumnShape::default())
        }
        ColumnShape::Array(ArrayElement::Enum(labels)) => PortableType::Enum(labels.clone()),
        _ => PortableType::Unknown(String::new()),
    };
    PortableType::Array(Box::new(element))
}

fn enumeration(_: &Captures<'_>, input: &Input<'_>) -> PortableType {
    if let ColumnShape::Enum(labels) = input.shape {
        return PortableType::Enum(labels.clone());
    }
    let labels = ENUM_LABELS
        .captures_iter(input.native)
        .map(|c| c[1].replace("''", "'"))
        .collect();
    PortableType::Enum(labels)
}

fn spatial_subtype(shape: &ColumnShape) -> Option<String> {
    match shape {
        ColumnShape::Plain { subtype } => subtype.clone(),
        _ => None,
    }
}

static TYPE_RULES: Lazy<Vec<TypeRule>> = Lazy::new(|| {
    vec![
        rule(r"^(boolean|bool|bit|bit\(1\)|tinyint\(1\))$", |_, _| PortableType::Boolean),
        rule(r"^(num|int4|int8|date|tstz|ts)range$", range),
        rule(
            r"^(bigint|smallint|mediumint|tinyint|int\d?|integer|bigserial|smallserial|serial\d?)\b",
            integer,
        ),
        rule(r"^oid$", |_, _| PortableType::Integer {
            width: IntWidth::Regular,
            unsigned: false,
            zerofill: false,
        }),
        rule(r"^n?varchar\(max\)$", |_, _| PortableType::Text { length: None }),
        rule(r"^(character varying|n?varchar2?|string)|varying", |_, i| {
            PortableType::String { length: length(i.native) }
        }),
        rule(r"^(n?char|character|bpchar)\b", |_, i| PortableType::Char {
            length: length(i.native),
        }),
        rule(r"^real", |_, _| PortableType::Real),
        rule(r"text$", |_, i| PortableType::Text { length: length(i.native) }),
        rule(r"^date$", |_, _| PortableType::Date),
        rule(r"^(date|timestamp|year|smalldatetime)", |_, i| PortableType::DateTime {
            precision: length(i.native),
        }),
        rule(r"^time", |_, _| PortableType::Time),
        rule(r"^float4?", |_, i| PortableType::Float { precision: precision(i) }),
        rule(r"^(float8|double)", |_, i| PortableType::Double { precision: precision(i) }),
        rule(r"^(decimal|numeric)", |_, i| PortableType::Decimal { precision: precision(i) }),
        rule(r"^money", |_, _| PortableType::Decimal {
            precision: Some(Precision::new(19, Some(4))),
        }),
        rule(r"^smallmoney", |_, _| PortableType::Decimal {
            precision: Some(Precision::new(10, Some(4))),
        }),
        rule(r"^(uuid|uniqueidentifier)", |_, _| PortableType::Uuid),
        rule(r"^jsonb", |_, _| PortableType::Jsonb),
        rule(r"^json", |_, _| PortableType::Json),
        rule(r"^geometry", |_, i| PortableType::Geometry {
            subtype: spatial_subtype(i.shape),
        }),
        rule(r"^geography", |_, i| PortableType::Geography {
            subtype: spatial_subtype(i.shape),
        }),
        rule(r"^array", array),
        rule(r"binary|image|blob|bytea", |_, _| PortableType::Blob),
        rule(r"^hstore", |_, _| PortableType::Hstore),
        rule(r"^inet", |_, _| PortableType::Inet),
        rule(r"^cidr", |_, _| PortableType::Cidr),
        rule(r"^macaddr", |_, _| PortableType::Macaddr),
        rule(r"^enum", enumeration),
    ]
});

/// Translate a native type into the portable vocabulary.
///
/// `precision` fills in decimal precision the type string itself lacks;
/// `shape` supplies array elements, enum labels and spatial subtypes.
pub fn translate(native_type: &str, precision: Option<Precision>, shape: &ColumnShape) -> PortableType {
    let native = native_type.trim().to_lowercase();

    if let Some(element) = native.strip_suffix("[]") {
        return PortableType::Array(Box::new(translate(element, None, &ColumnShape::default())));
    }
    if matches!(shape, ColumnShape::Enum(_)) && !native.starts_with("array") {
        return enumeration_from_shape(shape);
    }

    let input = Input {
        native: &native,
        precision,
        shape,
    };

    let mut best: Option<(usize, &TypeRule, Captures<'_>)> = None;
    for rule in TYPE_RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&native) {
            let len = caps.get(0).map_or(0, |m| m.len());
            if best.as_ref().map_or(true, |(best_len, _, _)| len > *best_len) {
                best = Some((len, rule, caps));
            }
        }
    }

    match best {
        Some((_, rule, caps)) => (rule.build)(&caps, &input),
        None => PortableType::Unknown(native.clone()),
    }
}

fn enumeration_from_shape(shape: &ColumnShape) -> PortableType {
    match shape {
        ColumnShape::Enum(labels) => PortableType::Enum(labels.clone()),
        _ => PortableType::Enum(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(native: &str) -> PortableType {
        translate(native, None, &ColumnShape::default())
    }

    fn int(width: IntWidth) -> PortableType {
        PortableType::Integer {
            width,
            unsigned: false,
            zerofill: false,
        }
    }

    #[test]
    fn test_booleans() {
        for native in ["boolean", "bool", "bit", "bit(1)", "tinyint(1)", "BOOLEAN"] {
            assert_eq!(plain(native), PortableType::Boolean, "{}", native);
        }
    }

    #[test]
    fn test_integers() {
        assert_eq!(plain("integer"), int(IntWidth::Regular));
        assert_eq!(plain("int(11)"), int(IntWidth::Regular));
        assert_eq!(plain("int4"), int(IntWidth::Regular));
        assert_eq!(plain("bigint"), int(IntWidth::Big));
        assert_eq!(plain("smallint"), int(IntWidth::Small));
        assert_eq!(plain("tinyint(4)"), int(IntWidth::Tiny));
        assert_eq!(plain("oid"), int(IntWidth::Regular));
        assert_eq!(
            plain("int(10) unsigned zerofill"),
            PortableType::Integer {
                width: IntWidth::Regular,
                unsigned: true,
                zerofill: true
            }
        );
    }

    #[test]
    fn test_interval_is_not_an_integer() {
        assert!(plain("interval").is_unknown());
    }

    #[test]
    fn test_strings() {
        assert_eq!(plain("character varying(255)"), PortableType::String { length: Some(255) });
        assert_eq!(plain("varchar(40)"), PortableType::String { length: Some(40) });
        assert_eq!(plain("nvarchar(10)"), PortableType::String { length: Some(10) });
        assert_eq!(plain("character varying"), PortableType::String { length: None });
        assert_eq!(plain("varchar(max)"), PortableType::Text { length: None });
        assert_eq!(plain("nvarchar(max)"), PortableType::Text { length: None });
        assert_eq!(plain("character(2)"), PortableType::Char { length: Some(2) });
        assert_eq!(plain("nchar(8)"), PortableType::Char { length: Some(8) });
        assert_eq!(plain("text"), PortableType::Text { length: None });
        assert_eq!(plain("mediumtext"), PortableType::Text { length: None });
    }

    #[test]
    fn test_temporal() {
        assert_eq!(plain("date"), PortableType::Date);
        assert_eq!(plain("datetime"), PortableType::DateTime { precision: None });
        assert_eq!(plain("datetime(6)"), PortableType::DateTime { precision: Some(6) });
        assert_eq!(
            plain("timestamp with time zone"),
            PortableType::DateTime { precision: None }
        );
        assert_eq!(plain("year"), PortableType::DateTime { precision: None });
        assert_eq!(plain("time without time zone"), PortableType::Time);
    }

    #[test]
    fn test_numerics() {
        assert_eq!(plain("real"), PortableType::Real);
        assert_eq!(plain("float"), PortableType::Float { precision: None });
        assert_eq!(plain("float8"), PortableType::Double { precision: None });
        assert_eq!(plain("double precision"), PortableType::Double { precision: None });
        assert_eq!(
            plain("decimal(10,2)"),
            PortableType::Decimal {
                precision: Some(Precision::new(10, Some(2)))
            }
        );
        assert_eq!(
            translate("numeric", Some(Precision::new(12, Some(3))), &ColumnShape::default()),
            PortableType::Decimal {
                precision: Some(Precision::new(12, Some(3)))
            }
        );
    }

    #[test]
    fn test_money_collapses_to_decimal() {
        assert_eq!(
            plain("money"),
            PortableType::Decimal {
                precision: Some(Precision::new(19, Some(4)))
            }
        );
        assert_eq!(
            plain("smallmoney"),
            PortableType::Decimal {
                precision: Some(Precision::new(10, Some(4)))
            }
        );
    }

    #[test]
    fn test_misc_types() {
        assert_eq!(plain("uuid"), PortableType::Uuid);
        assert_eq!(plain("uniqueidentifier"), PortableType::Uuid);
        assert_eq!(plain("json"), PortableType::Json);
        assert_eq!(plain("jsonb"), PortableType::Jsonb);
        assert_eq!(plain("bytea"), PortableType::Blob);
        assert_eq!(plain("varbinary(16)"), PortableType::Blob);
        assert_eq!(plain("longblob"), PortableType::Blob);
        assert_eq!(plain("hstore"), PortableType::Hstore);
        assert_eq!(plain("inet"), PortableType::Inet);
        assert_eq!(plain("cidr"), PortableType::Cidr);
        assert_eq!(plain("macaddr"), PortableType::Macaddr);
    }

    #[test]
    fn test_ranges_recurse() {
        assert_eq!(
            plain("int4range"),
            PortableType::Range(Box::new(int(IntWidth::Regular)))
        );
        assert_eq!(plain("int8range"), PortableType::Range(Box::new(int(IntWidth::Big))));
        assert_eq!(plain("daterange"), PortableType::Range(Box::new(PortableType::Date)));
        assert_eq!(
            plain("tstzrange"),
            PortableType::Range(Box::new(PortableType::DateTime { precision: None }))
        );
        assert_eq!(
            plain("numrange"),
            PortableType::Range(Box::new(PortableType::Decimal { precision: None }))
        );
    }

    #[test]
    fn test_arrays_recurse() {
        let shape = ColumnShape::Array(ArrayElement::Native("character varying".into()));
        assert_eq!(
            translate("ARRAY", None, &shape),
            PortableType::Array(Box::new(PortableType::String { length: None }))
        );
        let enum_shape = ColumnShape::Array(ArrayElement::Enum(vec!["a".into(), "b".into()]));
        assert_eq!(
            translate("array", None, &enum_shape),
            PortableType::Array(Box::new(PortableType::Enum(vec!["a".into(), "b".into()])))
        );
        assert_eq!(
            plain("integer[]"),
            PortableType::Array(Box::new(int(IntWidth::Regular)))
        );
    }

    #[test]
    fn test_array_without_element_is_unknown() {
        assert!(plain("array").is_unknown());
    }

    #[test]
    fn test_enums() {
        assert_eq!(
            plain("enum('small','large','it''s')"),
            PortableType::Enum(vec!["small".into(), "large".into(), "it's".into()])
        );
        let shape = ColumnShape::Enum(vec!["open".into(), "closed".into()]);
        assert_eq!(
            translate("USER-DEFINED", None, &shape),
            PortableType::Enum(vec!["open".into(), "closed".into()])
        );
    }

    #[test]
    fn test_spatial_subtype() {
        let shape = ColumnShape::Plain {
            subtype: Some("'POINT', 4326".into()),
        };
        assert_eq!(
            translate("geometry", None, &shape),
            PortableType::Geometry {
                subtype: Some("'POINT', 4326".into())
            }
        );
        assert_eq!(plain("geography"), PortableType::Geography { subtype: None });
    }

    #[test]
    fn test_unknown_types_are_reported() {
        assert_eq!(plain("tsvector"), PortableType::Unknown("tsvector".into()));
        assert!(plain("xml").is_unknown());
    }

    #[test]
    fn test_translate_is_deterministic() {
        for native in ["character varying(12)", "numeric(8,3)", "timestamp(3)", "int8range"] {
            assert_eq!(plain(native), plain(native));
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(plain("integer").kind(), TypeKind::Numeric);
        assert_eq!(plain("text").kind(), TypeKind::Textual);
        assert_eq!(plain("date").kind(), TypeKind::Temporal);
        assert_eq!(plain("jsonb").kind(), TypeKind::Json);
        assert_eq!(plain("uuid").kind(), TypeKind::Uuid);
        assert_eq!(plain("int4range").kind(), TypeKind::Collection);
        assert_eq!(plain("boolean").kind(), TypeKind::Boolean);
        assert_eq!(plain("inet").kind(), TypeKind::Other);
    }
}
