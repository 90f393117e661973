//! Drivers' and constructors' championship standings.
//!
//! Standings sheets stack two values in each per-round cell: the points
//! scored that round over the finishing position. Wins are not printed
//! anywhere, so they are derived by counting rounds finished first
//! ("1", or "1F" when the win came with the fastest lap).

use crate::error::{Error, Result};
use crate::model::{CanonicalRow, Rect, TimingDocument, Value};
use crate::parser::{grid, GridOptions};
use crate::report::Report;

pub const DRIVER_COLUMNS: &[&str] = &["driver", "points", "position", "wins"];
pub const CONSTRUCTOR_COLUMNS: &[&str] = &["constructor", "points", "position", "wins"];

/// Vertical gap under which a points line and its position line belong to
/// the same standings row.
const STACK_TOLERANCE: f32 = 12.0;

/// Build the drivers' championship report.
pub fn build_drivers_championship(doc: &TimingDocument) -> Result<Report> {
    build_championship(doc, "DRIVER", "driver", "drivers_championship", DRIVER_COLUMNS)
}

/// Build the constructors' championship report.
pub fn build_constructors_championship(doc: &TimingDocument) -> Result<Report> {
    build_championship(
        doc,
        "ENTRANT",
        "constructor",
        "constructors_championship",
        CONSTRUCTOR_COLUMNS,
    )
}

/// Shared pipeline: both sheets are pos, name, total, then one stacked
/// cell per round. Standings continue across pages for full fields.
fn build_championship(
    doc: &TimingDocument,
    anchor: &str,
    name_field: &'static str,
    report_name: &str,
    columns: &[&'static str],
) -> Result<Report> {
    let mut report = Report::new(report_name, columns.to_vec());
    let mut found = false;

    for page in &doc.pages {
        let label = match page.search(anchor).into_iter().next() {
            Some(rect) => rect,
            None => continue,
        };
        found = true;
        let region = Rect::new(0.0, label.bottom, page.width, page.height);
        let options = GridOptions::new().with_row_merge(STACK_TOLERANCE);
        let table = super::keep_numeric_key(grid::extract(page, &region, &options), 0);
        log::debug!("{report_name}: {} rows on page {}", table.row_count(), page.number);

        for row in &table.rows {
            let name = row.get(1).map(|c| flatten(c)).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let mut out = CanonicalRow::new();
            out.push(name_field, Value::text(name));
            out.push("points", Value::text(flatten(cell(row, 2))));
            out.push("position", Value::text(cell(row, 0).trim()));
            out.push("wins", Value::Int(count_wins(row.get(3..).unwrap_or(&[]))));
            report.rows.push(out);
        }
    }

    if !found {
        return Err(Error::SectionNotFound {
            tried: vec![anchor.to_string()],
        });
    }
    Ok(report)
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.as_str()).unwrap_or("")
}

fn flatten(cell: &str) -> String {
    cell.split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count rounds won: per-round cells whose stacked second line reads "1"
/// or "1F".
fn count_wins(round_cells: &[String]) -> i64 {
    round_cells
        .iter()
        .filter(|cell| {
            matches!(cell.split('\n').nth(1).map(str::trim), Some("1") | Some("1F"))
        })
        .count() as i64
}
