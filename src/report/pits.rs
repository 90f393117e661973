//! Pit stop summary.

use crate::error::{Error, Result};
use crate::model::{Page, RawTable, Rect, TimingDocument};
use crate::parser::{grid, GridOptions};
use crate::report::Report;
use crate::schema::{ColumnSchema, FieldSpec};

/// Header labels, left to right on the sheet.
const HEADERS: &[&str] = &[
    "NO",
    "DRIVER",
    "ENTRANT",
    "LAP",
    "TIME OF DAY",
    "STOP",
    "DURATION",
    "TOTAL TIME",
];

pub const COLUMNS: &[&str] = &["no", "driver", "stop", "lap", "time", "duration", "milliseconds"];

fn schema() -> ColumnSchema {
    ColumnSchema::new(
        0,
        vec![
            FieldSpec::text("no", 0),
            FieldSpec::text("driver", 1),
            FieldSpec::text("stop", 5),
            FieldSpec::text("lap", 3),
            FieldSpec::text("time", 4),
            FieldSpec::text("duration", 6),
            FieldSpec::millis("milliseconds", 6),
        ],
    )
}

/// Build the pit stop report.
///
/// Long races overflow onto further pages; every page carrying the header
/// row contributes rows, in page order.
pub fn build_pit_stops(doc: &TimingDocument) -> Result<Report> {
    let mut all = RawTable::default();
    for page in &doc.pages {
        if let Some(table) = extract_page(page)? {
            all.rows.extend(table.rows);
        }
    }
    if all.is_empty() {
        return Err(Error::SectionNotFound {
            tried: vec!["DRIVER".to_string()],
        });
    }
    log::debug!("pit stops: {} rows", all.row_count());

    let rows = schema().map_table(&all, None)?;
    let mut report = Report::new("race_pit_stops", COLUMNS.to_vec());
    report.rows = rows;
    Ok(report)
}

fn extract_page(page: &Page) -> Result<Option<RawTable>> {
    let mut rects = Vec::with_capacity(HEADERS.len());
    for label in HEADERS {
        match page.search(label).into_iter().next() {
            Some(rect) => rects.push(rect),
            None => return Ok(None),
        }
    }
    let separators: Vec<f32> = rects
        .windows(2)
        .map(|pair| (pair[0].right + pair[1].left) / 2.0)
        .collect();
    let region = Rect::new(0.0, rects[1].bottom, page.width, page.height);
    let table = grid::extract(page, &region, &GridOptions::new().with_separators(separators));
    Ok(Some(super::keep_numeric_key(table, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, ReportKind, TextSpan, Value};

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 8.0)
    }

    fn pit_doc() -> TimingDocument {
        let cols = [40.0, 80.0, 200.0, 340.0, 390.0, 480.0, 530.0, 600.0];
        let mut spans = Vec::new();
        for (label, x) in HEADERS.iter().zip(cols) {
            spans.push(span(label, x, 60.0));
        }
        let rows: [[&str; 8]; 3] = [
            ["44", "HAMILTON", "Mercedes", "11", "15:23:44", "1", "23.456", "23.456"],
            ["33", "VERSTAPPEN", "Red Bull", "12", "15:24:10", "1", "22.905", "22.905"],
            ["44", "HAMILTON", "Mercedes", "30", "15:52:01", "2", "1:02.456", "1:25.912"],
        ];
        for (r, row) in rows.iter().enumerate() {
            let y = 80.0 + r as f32 * 14.0;
            for (c, text) in row.iter().enumerate() {
                spans.push(span(text, cols[c], y));
            }
        }
        TimingDocument {
            kind: ReportKind::RacePitStops,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 842.0, 595.0, spans)],
        }
    }

    #[test]
    fn test_build_pit_stops() {
        let report = build_pit_stops(&pit_doc()).unwrap();
        assert_eq!(report.columns, COLUMNS);
        assert_eq!(report.row_count(), 3);

        let first = &report.rows[0];
        assert_eq!(first.get("no"), Some(&Value::text("44")));
        assert_eq!(first.get("stop"), Some(&Value::text("1")));
        assert_eq!(first.get("lap"), Some(&Value::text("11")));
        assert_eq!(first.get("time"), Some(&Value::text("15:23:44")));
        assert_eq!(first.get("duration"), Some(&Value::text("23.456")));
        assert_eq!(first.get("milliseconds"), Some(&Value::Millis(23_456)));

        let third = &report.rows[2];
        assert_eq!(third.get("duration"), Some(&Value::text("1:02.456")));
        assert_eq!(third.get("milliseconds"), Some(&Value::Millis(62_456)));
    }

    #[test]
    fn test_document_without_header_fails() {
        let doc = TimingDocument {
            kind: ReportKind::RacePitStops,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 842.0, 595.0, vec![span("x", 10.0, 10.0)])],
        };
        assert!(matches!(
            build_pit_stops(&doc).unwrap_err(),
            Error::SectionNotFound { .. }
        ));
    }
}
