//! Report builders.
//!
//! One builder per report type, each a fixed pipeline: locate the anchor
//! section, extract the region grid, map columns, resolve cross-document
//! references, emit ordered rows. Builders that need a second document
//! (grid order, lap chart) take it already parsed so one event uses one
//! consistent grid.

mod championship;
mod laps;
mod pits;
mod quali;
mod race;

pub use championship::{build_constructors_championship, build_drivers_championship};
pub use laps::build_lap_analysis;
pub use pits::build_pit_stops;
pub use quali::build_quali_classification;
pub use race::{build_race_classification, RaceClassification};

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::model::{serialize_rows, CanonicalRow};

/// The ordered rows of one built report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Report name, used as the output file stem
    pub name: String,
    /// Column headers in output order
    pub columns: Vec<&'static str>,
    /// Rows in classification or lap-then-driver order
    #[serde(serialize_with = "serialize_rows")]
    pub rows: Vec<CanonicalRow>,
}

impl Report {
    pub fn new(name: impl Into<String>, columns: Vec<&'static str>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the report as CSV, header row first.
    ///
    /// Null values render as empty fields. Cells containing commas,
    /// quotes or newlines are quoted per RFC 4180.
    pub fn write_csv<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "{}", self.columns.join(","))?;
        for row in &self.rows {
            let line = row
                .values()
                .map(|v| escape_csv(&v.to_csv_field()))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    /// The report rendered as a CSV string.
    pub fn to_csv_string(&self) -> String {
        let mut buf = Vec::new();
        // Vec<u8> writes cannot fail
        let _ = self.write_csv(&mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }

    /// The report's rows as a pretty-printed JSON array.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Keep only rows whose key cell is a bare car number.
///
/// Region extraction picks up the column header line and footer fragments
/// alongside driver rows; a digits-only key separates the two without any
/// per-sheet casing.
pub(crate) fn keep_numeric_key(mut table: crate::model::RawTable, col: usize) -> crate::model::RawTable {
    table.rows.retain(|row| {
        row.get(col)
            .map(|c| {
                let c = c.trim();
                !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit())
            })
            .unwrap_or(false)
    });
    table
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_csv_output_with_escaping_and_nulls() {
        let mut report = Report::new("pit_stops", vec!["no", "note", "millis"]);
        let mut row = CanonicalRow::new();
        row.push("no", Value::text("44"));
        row.push("note", Value::text("in, out"));
        row.push("millis", Value::Null);
        report.rows.push(row);

        let csv = report.to_csv_string();
        assert_eq!(csv, "no,note,millis\n44,\"in, out\",\n");
    }

    #[test]
    fn test_json_output() {
        let mut report = Report::new("demo", vec!["lap", "time"]);
        let mut row = CanonicalRow::new();
        row.push("lap", Value::Int(1));
        row.push("time", Value::text("1:21.5"));
        report.rows.push(row);

        let json = report.to_json_string().unwrap();
        assert!(json.contains("\"lap\": 1"));
        assert!(json.contains("\"time\": \"1:21.5\""));
    }
}
