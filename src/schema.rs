//! Column mapping: raw extracted grids to canonical rows.
//!
//! Each report type owns a [`ColumnSchema`] resolved at builder
//! construction, not inferred at row-parse time; a new sheet layout means
//! a new descriptor, never a branch deep inside parsing code.

use crate::error::{Error, Result};
use crate::model::{CanonicalRow, RawTable, Value};
use crate::resolve::EntrantAliases;
use crate::time::parse_duration;

/// Cell transform applied after source columns are gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Keep the text as extracted
    Identity,
    /// Parse as integer; empty cells map to null
    Integer,
    /// Parse as duration milliseconds; empty cells map to null
    Millis,
    /// Look the text up in the entrant alias table
    Alias,
}

/// One canonical field: name, source column indices, line selection and
/// transform.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Canonical output field name
    pub name: &'static str,
    /// Source column index (or indices, joined with a space)
    pub sources: Vec<usize>,
    /// Which physical line of a multi-line cell to keep; `None` joins all
    /// lines with a space
    pub line: Option<usize>,
    /// Transform applied to the gathered text
    pub transform: Transform,
}

impl FieldSpec {
    /// Text field from one source column.
    pub fn text(name: &'static str, source: usize) -> Self {
        Self {
            name,
            sources: vec![source],
            line: None,
            transform: Transform::Identity,
        }
    }

    /// Integer field from one source column.
    pub fn int(name: &'static str, source: usize) -> Self {
        Self {
            transform: Transform::Integer,
            ..Self::text(name, source)
        }
    }

    /// Milliseconds field from one source column.
    pub fn millis(name: &'static str, source: usize) -> Self {
        Self {
            transform: Transform::Millis,
            ..Self::text(name, source)
        }
    }

    /// Alias-resolved field from one source column.
    pub fn alias(name: &'static str, source: usize) -> Self {
        Self {
            transform: Transform::Alias,
            ..Self::text(name, source)
        }
    }

    /// Text field concatenated from several source columns.
    pub fn joined(name: &'static str, sources: Vec<usize>) -> Self {
        Self {
            name,
            sources,
            line: None,
            transform: Transform::Identity,
        }
    }

    /// Keep only one physical line of the (possibly stacked) cell text.
    pub fn keep_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A per-report-type mapping from raw columns to canonical fields.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    /// Output fields in order
    pub fields: Vec<FieldSpec>,
    /// Raw column holding the row's primary key; rows where it is empty
    /// are spacer rows and are dropped before mapping
    pub key_column: usize,
}

impl ColumnSchema {
    /// Create a schema.
    pub fn new(key_column: usize, fields: Vec<FieldSpec>) -> Self {
        Self { fields, key_column }
    }

    /// Map a raw table into canonical rows.
    ///
    /// Produces exactly one row per non-spacer input row, in input order.
    pub fn map_table(
        &self,
        table: &RawTable,
        aliases: Option<&EntrantAliases>,
    ) -> Result<Vec<CanonicalRow>> {
        let mut out = Vec::with_capacity(table.row_count());
        for row in &table.rows {
            let key = row.get(self.key_column).map(|s| s.trim()).unwrap_or("");
            if key.is_empty() {
                continue;
            }
            out.push(self.map_row(row, aliases)?);
        }
        Ok(out)
    }

    /// Map a single raw row.
    pub fn map_row(
        &self,
        row: &[String],
        aliases: Option<&EntrantAliases>,
    ) -> Result<CanonicalRow> {
        let mut canonical = CanonicalRow::new();
        for spec in &self.fields {
            let text = gather(row, spec);
            let value = match spec.transform {
                Transform::Identity => Value::Text(text),
                Transform::Integer => {
                    if text.is_empty() {
                        Value::Null
                    } else {
                        let n = text.parse::<i64>().map_err(|_| {
                            Error::PdfParse(format!(
                                "expected integer in field {:?}, got {:?}",
                                spec.name, text
                            ))
                        })?;
                        Value::Int(n)
                    }
                }
                Transform::Millis => {
                    if text.is_empty() {
                        Value::Null
                    } else {
                        Value::Millis(parse_duration(&text)?)
                    }
                }
                Transform::Alias => {
                    let aliases =
                        aliases.ok_or_else(|| Error::UnknownEntrant(text.clone()))?;
                    Value::text(aliases.resolve(&text)?)
                }
            };
            canonical.push(spec.name, value);
        }
        Ok(canonical)
    }
}

/// Gather and normalize the source cell text for one field.
fn gather(row: &[String], spec: &FieldSpec) -> String {
    let joined = spec
        .sources
        .iter()
        .filter_map(|&i| row.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match spec.line {
        Some(line) => joined
            .split('\n')
            .nth(line)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        None => joined
            .split('\n')
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn quali_schema() -> ColumnSchema {
        // The "%" column at index 6 is dropped by not naming it.
        ColumnSchema::new(
            1,
            vec![
                FieldSpec::text("pos", 0),
                FieldSpec::text("no", 1),
                FieldSpec::text("driver", 2),
                FieldSpec::text("entrant", 3),
                FieldSpec::text("q1", 4),
                FieldSpec::text("q1_laps", 5),
                FieldSpec::text("q1_time", 7),
                FieldSpec::text("q2", 8),
                FieldSpec::text("q2_laps", 9),
                FieldSpec::text("q2_time", 10),
                FieldSpec::text("q3", 11),
                FieldSpec::text("q3_laps", 12),
                FieldSpec::text("q3_time", 13),
            ],
        )
    }

    #[test]
    fn test_quali_row_maps_and_drops_percent_column() {
        let table = raw(&[&[
            "1", "44", "HAMILTON", "Mercedes", "1:20.5", "5", "98.2%", "1:20.123", "1:19.8",
            "4", "1:19.456", "1:19.2", "3", "1:19.222",
        ]]);
        let rows = quali_schema().map_table(&table, None).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("pos"), Some(&Value::text("1")));
        assert_eq!(row.get("no"), Some(&Value::text("44")));
        assert_eq!(row.get("driver"), Some(&Value::text("HAMILTON")));
        assert_eq!(row.get("entrant"), Some(&Value::text("Mercedes")));
        assert_eq!(row.get("q1"), Some(&Value::text("1:20.5")));
        assert_eq!(row.get("q1_laps"), Some(&Value::text("5")));
        assert_eq!(row.get("q1_time"), Some(&Value::text("1:20.123")));
        assert_eq!(row.get("q3_time"), Some(&Value::text("1:19.222")));
        assert!(row.get("%").is_none());
    }

    #[test]
    fn test_spacer_rows_dropped() {
        let table = raw(&[
            &["1", "44", "HAMILTON"],
            &["", "", ""],
            &["2", "63", "RUSSELL"],
        ]);
        let schema = ColumnSchema::new(
            1,
            vec![FieldSpec::text("no", 1), FieldSpec::text("driver", 2)],
        );
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("no"), Some(&Value::text("63")));
    }

    #[test]
    fn test_integer_and_millis_transforms() {
        let table = raw(&[&["1", "57", "1:23.456"]]);
        let schema = ColumnSchema::new(
            0,
            vec![FieldSpec::int("laps", 1), FieldSpec::millis("time", 2)],
        );
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(rows[0].get("laps"), Some(&Value::Int(57)));
        assert_eq!(rows[0].get("time"), Some(&Value::Millis(83_456)));
    }

    #[test]
    fn test_empty_typed_cells_become_null() {
        let table = raw(&[&["1", "", ""]]);
        let schema = ColumnSchema::new(
            0,
            vec![FieldSpec::int("laps", 1), FieldSpec::millis("time", 2)],
        );
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(rows[0].get("laps"), Some(&Value::Null));
        assert_eq!(rows[0].get("time"), Some(&Value::Null));
    }

    #[test]
    fn test_malformed_millis_fails() {
        let table = raw(&[&["1", "1:2:3:4"]]);
        let schema = ColumnSchema::new(0, vec![FieldSpec::millis("time", 1)]);
        let err = schema.map_table(&table, None).unwrap_err();
        assert!(matches!(err, Error::MalformedDuration(_)));
    }

    #[test]
    fn test_line_selection_on_stacked_cell() {
        let table = raw(&[&["1", "25\n2"]]);
        let schema = ColumnSchema::new(
            0,
            vec![
                FieldSpec::text("points", 1).keep_line(0),
                FieldSpec::text("position", 1).keep_line(1),
            ],
        );
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(rows[0].get("points"), Some(&Value::text("25")));
        assert_eq!(rows[0].get("position"), Some(&Value::text("2")));
    }

    #[test]
    fn test_multiline_cell_normalized_with_space() {
        let table = raw(&[&["1", "Oracle Red Bull\nRacing"]]);
        let schema = ColumnSchema::new(0, vec![FieldSpec::text("entrant", 1)]);
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(
            rows[0].get("entrant"),
            Some(&Value::text("Oracle Red Bull Racing"))
        );
    }

    #[test]
    fn test_joined_sources() {
        let table = raw(&[&["Max", "VERSTAPPEN"]]);
        let schema = ColumnSchema::new(0, vec![FieldSpec::joined("driver", vec![0, 1])]);
        let rows = schema.map_table(&table, None).unwrap();
        assert_eq!(rows[0].get("driver"), Some(&Value::text("Max VERSTAPPEN")));
    }
}
