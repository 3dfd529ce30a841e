use std::collections::BTreeMap;

/// A single parsed field of command output. Stacked or multi-supervisor
/// systems report some identity facts once per member, hence `List`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Render for a single workbook cell: lists are joined with "," and no spaces
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(","),
        }
    }

    /// First scalar value, used where only one value makes sense (hostname)
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::List(items) => items.first().map(|s| s.as_str()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// One structured row of command output, keyed by field name
pub type Record = BTreeMap<String, FieldValue>;

/// Read a scalar text field from a record, treating blanks as absent
pub fn record_text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(|v| v.first())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
