//! Lap-by-lap analysis, joined with the lap chart for running positions.
//!
//! A lap analysis sheet prints one block per driver: the car number and
//! name, then two side-by-side sub-columns of lap number and lap time.
//! Times come from this sheet; per-lap positions come from the lap chart.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{CanonicalRow, Page, Rect, TimingDocument, Value};
use crate::parser::{grid, GridOptions};
use crate::report::Report;
use crate::resolve::LapChart;
use crate::time::parse_duration;

pub const COLUMNS: &[&str] = &["lap", "driver", "time", "position", "milliseconds"];

/// Build the lap analysis report.
///
/// Rows are ordered lap-then-driver, with drivers in that lap's running
/// order. A driver's sequence ends at the last lap the chart still lists
/// them on.
pub fn build_lap_analysis(
    analysis: &TimingDocument,
    lap_chart_doc: &TimingDocument,
) -> Result<Report> {
    let chart = LapChart::from_document(lap_chart_doc)?;

    let mut times: BTreeMap<String, BTreeMap<u32, String>> = BTreeMap::new();
    let mut found_any = false;
    for page in &analysis.pages {
        found_any |= collect_page(page, &mut times)?;
    }
    if !found_any {
        return Err(Error::SectionNotFound {
            tried: vec!["LAP".to_string(), "TIME".to_string()],
        });
    }
    log::debug!("lap analysis: {} drivers collected", times.len());

    let mut report = Report::new("laps_analysis", COLUMNS.to_vec());
    for lap in 1..=chart.lap_count() {
        let order = match chart.order(lap) {
            Some(order) => order,
            None => break,
        };
        for (i, no) in order.iter().enumerate() {
            let time = match times.get(no).and_then(|t| t.get(&lap)) {
                Some(time) => time,
                None => continue,
            };
            let mut row = CanonicalRow::new();
            row.push("lap", Value::Int(lap as i64));
            row.push("driver", Value::text(no.clone()));
            row.push("time", Value::text(time.clone()));
            row.push("position", Value::Int(i as i64 + 1));
            row.push("milliseconds", Value::Millis(parse_duration(time)?));
            report.rows.push(row);
        }
    }
    Ok(report)
}

/// One driver block header: car number plus abbreviated name.
struct BlockHeader {
    no: String,
    rect: Rect,
}

/// Gather lap/time pairs from one page into the per-driver map.
///
/// Returns whether any sub-column was found on the page.
fn collect_page(
    page: &Page,
    times: &mut BTreeMap<String, BTreeMap<u32, String>>,
) -> Result<bool> {
    let header_re = Regex::new(r"^(\d+)\s+[A-Z]\.").unwrap();
    let headers: Vec<BlockHeader> = page
        .spans
        .iter()
        .filter_map(|s| {
            header_re.captures(&s.text).map(|caps| BlockHeader {
                no: caps[1].to_string(),
                rect: s.rect(),
            })
        })
        .collect();
    if headers.is_empty() {
        return Ok(false);
    }

    let lap_labels = page.search("LAP");
    let mut found = false;
    for lap_label in &lap_labels {
        // the TIME label immediately right of this LAP label, same line
        let time_label = page
            .search("TIME")
            .into_iter()
            .filter(|t| (t.y_mid() - lap_label.y_mid()).abs() < 3.0 && t.left > lap_label.right)
            .min_by(|a, b| a.left.total_cmp(&b.left));
        let time_label = match time_label {
            Some(t) => t,
            None => continue,
        };

        let owner = headers
            .iter()
            .filter(|h| h.rect.top < lap_label.top && h.rect.left <= lap_label.x_mid())
            .max_by(|a, b| a.rect.left.total_cmp(&b.rect.left));
        let owner = match owner {
            Some(h) => h,
            None => continue,
        };

        let strip = Rect::new(
            lap_label.left - 2.0,
            lap_label.bottom,
            time_label.right + 24.0,
            page.height,
        );
        let options = GridOptions::new()
            .with_separators(vec![(lap_label.right + time_label.left) / 2.0]);
        let table = grid::extract(page, &strip, &options);

        for row in &table.rows {
            // a pit-in marker can share the lap cell ("12 P")
            let lap_text = row
                .first()
                .and_then(|c| c.split_whitespace().next())
                .unwrap_or("");
            let time_text = row.get(1).map(|c| c.trim()).unwrap_or("");
            if lap_text.is_empty() || time_text.is_empty() {
                continue;
            }
            let lap: u32 = match lap_text.parse() {
                Ok(n) => n,
                Err(_) => {
                    log::warn!("skipping lap row with non-numeric lap label {lap_text:?}");
                    continue;
                }
            };
            times
                .entry(owner.no.clone())
                .or_default()
                .insert(lap, time_text.to_string());
            found = true;
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, ReportKind, TextSpan};

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 8.0)
    }

    fn chart_doc(lines: &[&str]) -> TimingDocument {
        let spans = lines
            .iter()
            .enumerate()
            .map(|(i, l)| span(l, 40.0, 100.0 + i as f32 * 12.0))
            .collect();
        TimingDocument {
            kind: ReportKind::RaceLapChart,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 842.0, 595.0, spans)],
        }
    }

    fn analysis_doc() -> TimingDocument {
        let mut spans = vec![
            span("44 L. HAMILTON", 40.0, 50.0),
            span("LAP", 40.0, 70.0),
            span("TIME", 80.0, 70.0),
            span("33 M. VERSTAPPEN", 300.0, 50.0),
            span("LAP", 300.0, 70.0),
            span("TIME", 340.0, 70.0),
        ];
        // Hamilton: three laps, the second with a pit-in marker
        for (i, (lap, time)) in [("1", "1:31.044"), ("2 P", "1:29.097"), ("3", "1:28.500")]
            .iter()
            .enumerate()
        {
            let y = 90.0 + i as f32 * 12.0;
            spans.push(span(lap, 40.0, y));
            spans.push(span(time, 80.0, y));
        }
        // Verstappen retires after lap 2
        for (i, (lap, time)) in [("1", "1:30.500"), ("2", "1:29.800")].iter().enumerate() {
            let y = 90.0 + i as f32 * 12.0;
            spans.push(span(lap, 300.0, y));
            spans.push(span(time, 340.0, y));
        }
        TimingDocument {
            kind: ReportKind::RaceLapAnalysis,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 842.0, 595.0, spans)],
        }
    }

    #[test]
    fn test_lap_then_driver_order_with_truncation() {
        let chart = chart_doc(&["LAP 1 33 44", "LAP 2 44 33", "LAP 3 44"]);
        let report = build_lap_analysis(&analysis_doc(), &chart).unwrap();

        let keys: Vec<(i64, String, i64)> = report
            .rows
            .iter()
            .map(|r| {
                let lap = match r.get("lap") {
                    Some(Value::Int(n)) => *n,
                    _ => panic!("lap missing"),
                };
                let driver = match r.get("driver") {
                    Some(Value::Text(s)) => s.clone(),
                    _ => panic!("driver missing"),
                };
                let pos = match r.get("position") {
                    Some(Value::Int(n)) => *n,
                    _ => panic!("position missing"),
                };
                (lap, driver, pos)
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, "33".to_string(), 1),
                (1, "44".to_string(), 2),
                (2, "44".to_string(), 1),
                (2, "33".to_string(), 2),
                (3, "44".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_times_and_milliseconds() {
        let chart = chart_doc(&["LAP 1 33 44", "LAP 2 44 33", "LAP 3 44"]);
        let report = build_lap_analysis(&analysis_doc(), &chart).unwrap();

        let ham_lap2 = report
            .rows
            .iter()
            .find(|r| {
                r.get("lap") == Some(&Value::Int(2))
                    && r.get("driver") == Some(&Value::text("44"))
            })
            .unwrap();
        assert_eq!(ham_lap2.get("time"), Some(&Value::text("1:29.097")));
        assert_eq!(ham_lap2.get("milliseconds"), Some(&Value::Millis(89_097)));
    }

    #[test]
    fn test_missing_blocks_fail() {
        let empty = TimingDocument {
            kind: ReportKind::RaceLapAnalysis,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 842.0, 595.0, vec![span("x", 10.0, 10.0)])],
        };
        let chart = chart_doc(&["LAP 1 44"]);
        assert!(matches!(
            build_lap_analysis(&empty, &chart).unwrap_err(),
            Error::SectionNotFound { .. }
        ));
    }
}
