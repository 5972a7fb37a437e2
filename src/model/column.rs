//! Column descriptors.

/// Uniqueness of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Unique {
    #[default]
    No,
    /// Unique without a usable constraint name
    Yes,
    /// Unique through the named constraint
    Named(String),
}

impl Unique {
    pub fn is_unique(&self) -> bool {
        !matches!(self, Unique::No)
    }
}

/// Element of an array column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayElement {
    /// Native element type, e.g. `integer`
    Native(String),
    /// Enum element with its ordered labels
    Enum(Vec<String>),
}

/// Exactly one of plain, array-of-type or enum-of-labels applies to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnShape {
    /// Scalar column. `subtype` carries the spatial payload of geometry and
    /// geography columns (`'POINT', 4326`).
    Plain { subtype: Option<String> },
    Array(ArrayElement),
    Enum(Vec<String>),
}

impl Default for ColumnShape {
    fn default() -> Self {
        ColumnShape::Plain { subtype: None }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Lower-cased native type, including any length or precision suffix
    pub native_type: String,
    pub shape: ColumnShape,
    pub allow_null: bool,
    /// Raw default expression as reported by the catalog
    pub default_value: Option<String>,
    pub primary_key: bool,
    pub unique: Unique,
    /// Identity/serial column whose value the database generates
    pub auto_increment: bool,
    pub comment: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: &str, native_type: &str) -> Self {
        ColumnDescriptor {
            name: name.to_string(),
            native_type: native_type.to_lowercase(),
            allow_null: true,
            ..Default::default()
        }
    }

    pub fn with_shape(mut self, shape: ColumnShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn unique(mut self, unique: Unique) -> Self {
        self.unique = unique;
        self
    }
}
