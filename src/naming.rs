//! Naming conventions for generated model, property and file names.
//!
//! Everything here is a pure string transform with no shared state; the
//! migration compiler and the association compiler both call these directly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Case convention applied to a raw identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Case {
    #[serde(rename = "c", alias = "camel")]
    Camel,
    #[serde(rename = "k", alias = "kebab")]
    Kebab,
    #[serde(rename = "l", alias = "snake")]
    Snake,
    #[default]
    #[serde(rename = "o", alias = "original")]
    Original,
    #[serde(rename = "p", alias = "pascal")]
    Pascal,
    #[serde(rename = "u", alias = "upper")]
    UpperSnake,
}

/// Apply `case` to `value`, singularizing first when asked.
pub fn recase(case: Case, value: &str, singular: bool) -> String {
    let value = if singular && !value.is_empty() {
        singularize(value)
    } else {
        value.to_string()
    };
    if value.is_empty() {
        return value;
    }
    match case {
        Case::Original => value,
        Case::Camel => camel_case(&value),
        Case::Kebab => kebab_case(&value),
        Case::Snake => snake_case(&value),
        Case::Pascal => pascal_case(&value),
        Case::UpperSnake => snake_case(&value).to_uppercase(),
    }
}

/// Split an identifier into words on separators, case transitions and digit runs.
pub fn words(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_digit() && c.is_alphabetic())
                || (prev.is_uppercase() && c.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Convert to camelCase (`customer_id` -> `customerId`)
pub fn camel_case(value: &str) -> String {
    words(value)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

/// Convert to PascalCase (`order_item` -> `OrderItem`)
pub fn pascal_case(value: &str) -> String {
    words(value).iter().map(|w| capitalize(w)).collect()
}

/// Convert to snake_case (`OrderItem` -> `order_item`)
pub fn snake_case(value: &str) -> String {
    join_lower(value, "_")
}

/// Convert to kebab-case (`OrderItem` -> `order-item`)
pub fn kebab_case(value: &str) -> String {
    join_lower(value, "-")
}

fn join_lower(value: &str, separator: &str) -> String {
    words(value)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "moose",
    "deer",
    "news",
];

fn rules(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, replacement)| {
            let regex = Regex::new(&format!("(?i){}", pattern))
                .unwrap_or_else(|e| panic!("invalid inflection rule {}: {}", pattern, e));
            (regex, *replacement)
        })
        .collect()
}

static PLURAL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    rules(&[
        ("(people|men|children)$", "${1}"),
        ("(m)an$", "${1}en"),
        ("(pe)rson$", "${1}ople"),
        ("(child)$", "${1}ren"),
        ("^(ox)$", "${1}en"),
        ("(ax|test)is$", "${1}es"),
        ("(octop|vir)us$", "${1}i"),
        ("(alias|status)$", "${1}es"),
        ("(bu)s$", "${1}ses"),
        ("(buffal|tomat|potat)o$", "${1}oes"),
        ("([ti])um$", "${1}a"),
        ("([ti])a$", "${1}a"),
        ("sis$", "ses"),
        ("(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        ("(hive)$", "${1}s"),
        ("([^aeiouy]|qu)y$", "${1}ies"),
        ("(x|ch|ss|sh)$", "${1}es"),
        ("(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        ("([ml])ouse$", "${1}ice"),
        ("(quiz)$", "${1}zes"),
        ("s$", "s"),
        ("$", "s"),
    ])
});

static SINGULAR_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    rules(&[
        ("(database)s$", "${1}"),
        ("(m)en$", "${1}an"),
        ("(pe)ople$", "${1}rson"),
        ("(child)ren$", "${1}"),
        ("([ti])a$", "${1}um"),
        ("((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)ses$", "${1}sis"),
        ("(hive)s$", "${1}"),
        ("(tive)s$", "${1}"),
        ("(curve)s$", "${1}"),
        ("([lr])ves$", "${1}f"),
        ("([^fo])ves$", "${1}fe"),
        ("(m)ovies$", "${1}ovie"),
        ("([^aeiouy]|qu)ies$", "${1}y"),
        ("(x|ch|ss|sh)es$", "${1}"),
        ("([ml])ice$", "${1}ouse"),
        ("(bus)es$", "${1}"),
        ("(shoe)s$", "${1}"),
        ("(o)es$", "${1}"),
        ("(cris|ax|test)es$", "${1}is"),
        ("(octop|vir)i$", "${1}us"),
        ("(alias|status)es$", "${1}"),
        ("^(ox)en", "${1}"),
        ("(vert|ind)ices$", "${1}ex"),
        ("(matr)ices$", "${1}ix"),
        ("(quiz)zes$", "${1}"),
        ("(ss|us|is)$", "${1}"),
        ("s$", ""),
    ])
});

fn is_uncountable(value: &str) -> bool {
    let lower = value.to_lowercase();
    let last = lower.rsplit(['_', '-', ' ']).next().unwrap_or(&lower);
    UNCOUNTABLE.contains(&lower.as_str()) || UNCOUNTABLE.contains(&last)
}

fn inflect(value: &str, table: &[(Regex, &'static str)]) -> String {
    if value.is_empty() || is_uncountable(value) {
        return value.to_string();
    }
    table
        .iter()
        .find(|(regex, _)| regex.is_match(value))
        .map(|(regex, replacement)| regex.replace(value, *replacement).into_owned())
        .unwrap_or_else(|| value.to_string())
}

/// Plural form of the last word (`category` -> `categories`)
pub fn pluralize(value: &str) -> String {
    inflect(value, &PLURAL_RULES)
}

/// Singular form of the last word (`order_items` -> `order_item`)
pub fn singularize(value: &str) -> String {
    inflect(value, &SINGULAR_RULES)
}

/// Strip a trailing identifier suffix from a camelCased foreign-key name
/// (`customerId` -> `customer`). Names that are nothing but the suffix are kept.
pub fn strip_id_suffix(value: &str) -> String {
    for suffix in ["Id", "ID", "id"] {
        if let Some(stripped) = value.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        assert_eq!(words("customer_id"), vec!["customer", "id"]);
        assert_eq!(words("CustomerID"), vec!["Customer", "ID"]);
        assert_eq!(words("XMLHttpRequest"), vec!["XML", "Http", "Request"]);
        assert_eq!(words("address1"), vec!["address", "1"]);
        assert_eq!(words("__user--name "), vec!["user", "name"]);
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(camel_case("customer_id"), "customerId");
        assert_eq!(camel_case("CustomerID"), "customerId");
        assert_eq!(camel_case("created_at"), "createdAt");
        assert_eq!(pascal_case("order_item"), "OrderItem");
        assert_eq!(snake_case("OrderItem"), "order_item");
        assert_eq!(kebab_case("orderItem"), "order-item");
    }

    #[test]
    fn test_recase() {
        assert_eq!(recase(Case::Original, "order_items", false), "order_items");
        assert_eq!(recase(Case::Original, "order_items", true), "order_item");
        assert_eq!(recase(Case::Pascal, "order_items", true), "OrderItem");
        assert_eq!(recase(Case::Camel, "order_items", false), "orderItems");
        assert_eq!(recase(Case::UpperSnake, "orderItems", false), "ORDER_ITEMS");
        assert_eq!(recase(Case::Kebab, "order_items", true), "order-item");
        assert_eq!(recase(Case::Pascal, "", true), "");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("order"), "orders");
        assert_eq!(pluralize("orders"), "orders");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("information"), "information");
        assert_eq!(pluralize("user_information"), "user_information");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("orders"), "order");
        assert_eq!(singularize("order"), "order");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("address"), "address");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("order_items"), "order_item");
    }

    #[test]
    fn test_strip_id_suffix() {
        assert_eq!(strip_id_suffix("customerId"), "customer");
        assert_eq!(strip_id_suffix("parentID"), "parent");
        assert_eq!(strip_id_suffix("videoid"), "video");
        assert_eq!(strip_id_suffix("id"), "id");
        assert_eq!(strip_id_suffix("video"), "video");
    }
}
