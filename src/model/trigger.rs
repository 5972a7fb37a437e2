//! Trigger and function specs.

use std::fmt;

use crate::model::QualifiedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BEFORE" => Some(TriggerTiming::Before),
            "AFTER" => Some(TriggerTiming::After),
            "INSTEAD OF" => Some(TriggerTiming::InsteadOf),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD OF",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

impl TriggerEvent {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "INSERT" => Some(TriggerEvent::Insert),
            "UPDATE" => Some(TriggerEvent::Update),
            "DELETE" => Some(TriggerEvent::Delete),
            "TRUNCATE" => Some(TriggerEvent::Truncate),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
            TriggerEvent::Truncate => "TRUNCATE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Row,
    Statement,
}

impl Orientation {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("statement") {
            Orientation::Statement
        } else {
            Orientation::Row
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

impl Volatility {
    /// Accepts the catalog's one-letter codes (`i`, `s`, `v`) or full keywords.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "i" | "immutable" => Some(Volatility::Immutable),
            "s" | "stable" => Some(Volatility::Stable),
            "v" | "volatile" => Some(Volatility::Volatile),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Volatility::Immutable => "IMMUTABLE",
            Volatility::Stable => "STABLE",
            Volatility::Volatile => "VOLATILE",
        }
    }
}

/// One entry of a function's argument signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArgument {
    pub direction: Option<String>,
    pub name: Option<String>,
    pub data_type: String,
}

/// Parse a signature such as `a integer, OUT b text DEFAULT 'x'`.
pub fn parse_arguments(signature: &str) -> Vec<FunctionArgument> {
    split_top_level(signature)
        .into_iter()
        .filter_map(|raw| {
            let without_default = match raw.to_uppercase().find(" DEFAULT ") {
                Some(pos) => raw.get(..pos).unwrap_or(&raw),
                None => raw.as_str(),
            };
            let mut tokens: Vec<&str> = without_default.split_whitespace().collect();
            if tokens.is_empty() {
                return None;
            }
            let direction = match tokens[0].to_uppercase().as_str() {
                "IN" | "OUT" | "INOUT" | "VARIADIC" => Some(tokens.remove(0).to_uppercase()),
                _ => None,
            };
            // A lone token or a known multi-word type has no argument name.
            let name = if tokens.len() > 1 && !starts_multiword_type(&tokens) {
                Some(tokens.remove(0).to_string())
            } else {
                None
            };
            if tokens.is_empty() {
                return None;
            }
            Some(FunctionArgument {
                direction,
                name,
                data_type: tokens.join(" "),
            })
        })
        .collect()
}

fn starts_multiword_type(tokens: &[&str]) -> bool {
    const PREFIXES: &[&str] = &["character", "double", "timestamp", "time", "bit"];
    PREFIXES.contains(&tokens[0].to_lowercase().as_str())
}

fn split_top_level(signature: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in signature.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    /// Raw argument signature as reported by the catalog
    pub signature: String,
    pub arguments: Vec<FunctionArgument>,
    pub return_type: String,
    pub language: String,
    /// Function body source
    pub body: String,
    /// Full `CREATE FUNCTION` definition, when the catalog provides it
    pub definition: Option<String>,
    pub volatility: Option<Volatility>,
    pub leakproof: bool,
    pub strict: bool,
    pub security_definer: bool,
    pub cost: Option<f64>,
}

impl FunctionSpec {
    pub fn same_signature(&self, other: &FunctionSpec) -> bool {
        self.name == other.name && self.signature == other.signature
    }

    /// Body with its outer `BEGIN` / `END;` block delimiters removed, if it has them.
    pub fn unwrapped_body(&self) -> Option<String> {
        let trimmed = self.body.trim();
        let upper = trimmed.to_uppercase();
        if !upper.starts_with("BEGIN") || !(upper.ends_with("END;") || upper.ends_with("END")) {
            return None;
        }
        let begin_ends = "BEGIN".len();
        if trimmed[begin_ends..]
            .chars()
            .next()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            return None;
        }
        let end_starts = if upper.ends_with("END;") {
            trimmed.len() - "END;".len()
        } else {
            trimmed.len() - "END".len()
        };
        if end_starts < begin_ends {
            return None;
        }
        Some(trimmed[begin_ends..end_starts].trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub orientation: Orientation,
    pub condition: Option<String>,
    pub table: QualifiedName,
    /// The executed action, e.g. `EXECUTE FUNCTION audit()`
    pub action: String,
    pub function: FunctionSpec,
}

/// Whether `action` executes a function named `function`, bare or schema-qualified.
pub fn action_executes(action: &str, function: &str) -> bool {
    let action = action.to_lowercase();
    let needle = format!("{}(", function.to_lowercase());
    action.match_indices(&needle).any(|(pos, _)| {
        action[..pos]
            .chars()
            .last()
            .map_or(true, |c| c.is_whitespace() || c == '.' || c == '"')
    })
}
