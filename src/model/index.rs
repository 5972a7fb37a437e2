//! Index specs.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// One indexed column with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub column: String,
    pub collate: Option<String>,
    pub length: Option<u32>,
    pub order: SortOrder,
}

impl IndexField {
    pub fn new(column: &str) -> Self {
        IndexField {
            column: column.to_string(),
            collate: None,
            length: None,
            order: SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub unique: bool,
    pub primary: bool,
    /// Index kind such as `FULLTEXT` or `SPATIAL`
    pub index_type: Option<String>,
    /// Access method such as `BTREE` or `GIN`
    pub method: Option<String>,
    pub fields: Vec<IndexField>,
}

impl IndexSpec {
    /// A unique primary index is implied by the primary-key declaration.
    pub fn is_implied(&self) -> bool {
        self.primary && self.unique
    }
}
