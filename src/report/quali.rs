//! Qualifying session classification.

use crate::error::Result;
use crate::model::{Rect, TimingDocument};
use crate::parser::{grid, GridOptions};
use crate::report::Report;
use crate::schema::{ColumnSchema, FieldSpec};

/// Section title variants, newest naming first.
const TITLE_ANCHORS: &[&str] = &[
    "Qualifying Session Final Classification",
    "Qualifying Session Provisional Classification",
];

/// Labels that mark the bottom of the classified table, in priority order.
const BOTTOM_ANCHORS: &[&str] = &[
    "NOT CLASSIFIED - ",
    "POLE POSITION LAP",
    "FASTEST LAP",
    "Formula One World Championship",
];

/// Raw sheet layout: pos, no, driver, nat, entrant, then Q1 time/laps/%/
/// session-best, Q2 and Q3 time/laps/session-best. The nat and % columns
/// are dropped by the schema.
fn schema() -> ColumnSchema {
    ColumnSchema::new(
        1,
        vec![
            FieldSpec::text("pos", 0),
            FieldSpec::text("no", 1),
            FieldSpec::text("driver", 2),
            FieldSpec::text("entrant", 4),
            FieldSpec::text("q1", 5),
            FieldSpec::text("q1_laps", 6),
            FieldSpec::text("q1_time", 8),
            FieldSpec::text("q2", 9),
            FieldSpec::text("q2_laps", 10),
            FieldSpec::text("q2_time", 11),
            FieldSpec::text("q3", 12),
            FieldSpec::text("q3_laps", 13),
            FieldSpec::text("q3_time", 14),
        ],
    )
}

pub const COLUMNS: &[&str] = &[
    "pos", "no", "driver", "entrant", "q1", "q1_laps", "q1_time", "q2", "q2_laps", "q2_time",
    "q3", "q3_laps", "q3_time",
];

/// Build the qualifying classification report.
pub fn build_quali_classification(doc: &TimingDocument) -> Result<Report> {
    let (page, title) = doc.locate_any(TITLE_ANCHORS)?;
    let bottom = page.locate_any(BOTTOM_ANCHORS)?.top;
    let region = Rect::new(0.0, title.bottom, page.width, bottom);

    let table = grid::extract(page, &region, &GridOptions::new());
    let table = super::keep_numeric_key(table, 1);
    log::debug!(
        "quali classification: {} rows x {} cols",
        table.row_count(),
        table.column_count()
    );

    let rows = schema().map_table(&table.without_trailing_blank_rows(), None)?;
    let mut report = Report::new("quali_classification", COLUMNS.to_vec());
    report.rows = rows;
    Ok(report)
}
