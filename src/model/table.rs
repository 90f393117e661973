//! Tabular types: raw extracted grids and canonical output rows.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::Serialize;

/// A rectangular text grid extracted from a page region.
///
/// Rows are ordered top-to-bottom, cells left-to-right. Every row has the
/// same cell count; a cell with no detected text is the empty string. Cells
/// may contain `\n` where stacked sub-values were merged into one logical
/// row (e.g. "points\nposition" pairs on championship sheets).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    /// Rows of cell text
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (constant across rows; taken from the first row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether a row is entirely empty cells.
    pub fn is_blank_row(row: &[String]) -> bool {
        row.iter().all(|c| c.trim().is_empty())
    }

    /// Return the table without trailing all-blank rows.
    ///
    /// The extractor intentionally keeps them to stay layout-agnostic;
    /// report builders call this before mapping.
    pub fn without_trailing_blank_rows(mut self) -> Self {
        while self
            .rows
            .last()
            .map(|r| Self::is_blank_row(r))
            .unwrap_or(false)
        {
            self.rows.pop();
        }
        self
    }

    /// Cell accessor; out-of-range indices read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// A typed value in a canonical output row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text, preserved exactly as extracted
    Text(String),
    /// Parsed integer
    Int(i64),
    /// Duration in integer milliseconds
    Millis(i64),
    /// Absent value (empty CSV cell, JSON null)
    Null,
}

impl Value {
    /// Text constructor.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Render for CSV output; `Null` renders as the empty string.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Millis(ms) => ms.to_string(),
            Value::Null => String::new(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Millis(ms) => serializer.serialize_i64(*ms),
            Value::Null => serializer.serialize_none(),
        }
    }
}

/// A mapping from fixed field names to typed values.
///
/// Field sets are fixed per report type; insertion order is the output
/// column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    fields: Vec<(&'static str, Value)>,
}

impl CanonicalRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Values in output order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CanonicalRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Serialize a row sequence as a JSON array of objects.
pub fn serialize_rows<S: serde::Serializer>(
    rows: &[CanonicalRow],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(rows.len()))?;
    for row in rows {
        seq.serialize_element(row)?;
    }
    seq.end()
}
