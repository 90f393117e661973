//! Race classification and per-event constructor results.
//!
//! The classification sheet alone does not carry grid positions, so the
//! builder takes the already-parsed lap chart document and joins against
//! its `GRID` row. Fastest-lap ranks come from sorting the whole field's
//! fastest times, retirements included.

use crate::classify::{
    format_points, is_marker_row, parse_points, ClassificationAssembler, ConstructorTotals,
    Section,
};
use crate::error::{Error, Result};
use crate::model::{CanonicalRow, Page, Rect, TimingDocument, Value};
use crate::parser::{grid, GridOptions};
use crate::report::Report;
use crate::resolve::{EntrantAliases, FastestLapIndex, GridOrder};
use crate::time::parse_duration;

const TITLE_ANCHORS: &[&str] = &[
    "Race Final Classification",
    "Race Provisional Classification",
];

/// Header labels used to derive column separator positions.
const HEADERS: &[&str] = &[
    "NO", "DRIVER", "NAT", "ENTRANT", "LAPS", "TIME", "GAP", "INT", "KM/H", "FASTEST", "ON",
    "PTS",
];

pub const DRIVER_COLUMNS: &[&str] = &[
    "no",
    "entrant",
    "grid",
    "position",
    "positionOrder",
    "points",
    "laps",
    "time",
    "milliseconds",
    "fastestLap",
    "rank",
    "fastestLapTime",
    "fastestLapSpeed",
];

pub const CONSTRUCTOR_COLUMNS: &[&str] = &["constructor", "points"];

// Raw column indices once the header-derived separators are applied.
const COL_POS: usize = 0;
const COL_NO: usize = 1;
const COL_ENTRANT: usize = 4;
const COL_LAPS: usize = 5;
const COL_TIME: usize = 6;
const COL_GAP: usize = 7;
const COL_SPEED: usize = 9;
const COL_FASTEST: usize = 10;
const COL_ON: usize = 11;
const COL_PTS: usize = 12;

/// The two reports built from one race classification sheet.
#[derive(Debug, Clone)]
pub struct RaceClassification {
    pub drivers: Report,
    pub constructors: Report,
}

/// Build the race classification and constructor-results reports.
pub fn build_race_classification(
    doc: &TimingDocument,
    lap_chart: &TimingDocument,
    aliases: &EntrantAliases,
) -> Result<RaceClassification> {
    let grid_order = GridOrder::from_lap_chart(lap_chart)?;

    let (page, title) = doc.locate_any(TITLE_ANCHORS)?;
    // The section label sits at the left margin; column text further right
    // can also contain the phrase.
    let bottom = page
        .search("FASTEST LAP")
        .into_iter()
        .find(|r| r.top > title.bottom && r.left < page.width / 4.0)
        .map(|r| r.top)
        .ok_or_else(|| Error::SectionNotFound {
            tried: vec!["FASTEST LAP".to_string()],
        })?;
    let region = Rect::new(0.0, title.bottom, page.width, bottom);

    let separators = header_separators(page, &region)?;
    let mut table = grid::extract(page, &region, &GridOptions::new().with_separators(separators));
    table.rows.retain(|row| {
        is_marker_row(row)
            || row
                .get(COL_NO)
                .map(|c| {
                    let c = c.trim();
                    !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit())
                })
                .unwrap_or(false)
    });

    let assembler = ClassificationAssembler::split(&table);
    log::debug!(
        "race classification: {} classified, {} not classified",
        assembler.classified().len(),
        assembler.not_classified().len()
    );

    let rank_index = FastestLapIndex::build(
        assembler
            .rows()
            .map(|(_, _, row)| cell(row, COL_FASTEST).to_string()),
    )?;

    let winner_ms = match assembler.classified().first() {
        Some(winner) => Some(parse_duration(cell(winner, COL_TIME))?),
        None => None,
    };

    let mut drivers = Report::new("race_classification", DRIVER_COLUMNS.to_vec());
    let mut totals = ConstructorTotals::new();

    for (order, section, row) in assembler.rows() {
        let no = cell(row, COL_NO);
        let entrant = aliases.resolve(&cell(row, COL_ENTRANT).replace('\n', " "))?;
        let points = parse_points(cell(row, COL_PTS))?;
        totals.add(&entrant, points);

        let (position, time, millis) = match section {
            Section::Classified => {
                let is_winner = order == 1;
                let time = if is_winner {
                    cell(row, COL_TIME)
                } else {
                    cell(row, COL_GAP)
                };
                let millis = if is_winner {
                    winner_ms.map(Value::Millis).unwrap_or(Value::Null)
                } else {
                    follower_millis(winner_ms, time)?
                };
                (
                    Value::text(cell(row, COL_POS)),
                    Value::text(time),
                    millis,
                )
            }
            Section::NotClassified => (Value::Null, Value::Null, Value::Null),
        };

        let mut out = CanonicalRow::new();
        out.push("no", Value::text(no));
        out.push("entrant", Value::text(entrant.clone()));
        out.push("grid", Value::Int(grid_order.position(no)? as i64));
        out.push("position", position);
        out.push("positionOrder", Value::Int(order as i64));
        out.push("points", Value::text(format_points(points)));
        out.push("laps", Value::text(cell(row, COL_LAPS)));
        out.push("time", time);
        out.push("milliseconds", millis);
        out.push("fastestLap", Value::text(cell(row, COL_ON)));
        out.push("rank", Value::Int(rank_index.rank(cell(row, COL_FASTEST)) as i64));
        out.push("fastestLapTime", Value::text(cell(row, COL_FASTEST)));
        out.push("fastestLapSpeed", Value::text(cell(row, COL_SPEED)));
        drivers.rows.push(out);
    }

    let mut constructors = Report::new("constructor_result", CONSTRUCTOR_COLUMNS.to_vec());
    for (name, points) in totals.iter() {
        let mut out = CanonicalRow::new();
        out.push("constructor", Value::text(name));
        out.push("points", Value::text(format_points(points)));
        constructors.rows.push(out);
    }

    Ok(RaceClassification {
        drivers,
        constructors,
    })
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.trim()).unwrap_or("")
}

/// Gap-to-winner text resolved into absolute milliseconds.
///
/// Lapped drivers show "+N LAP(S)" instead of a time and get no value;
/// anything else must parse as a duration or the whole report fails.
fn follower_millis(winner_ms: Option<i64>, gap: &str) -> Result<Value> {
    let gap = gap.trim_start_matches('+').trim();
    if gap.is_empty() || gap.contains("LAP") {
        return Ok(Value::Null);
    }
    let delta = parse_duration(gap)?;
    Ok(winner_ms
        .map(|base| Value::Millis(base + delta))
        .unwrap_or(Value::Null))
}

/// Column separator x-positions computed from the header label boxes.
///
/// Midpoints are used where adjacent values can run close together; label
/// edges where the printed column is exactly as wide as its header.
fn header_separators(page: &Page, region: &Rect) -> Result<Vec<f32>> {
    let mut pos = Vec::with_capacity(HEADERS.len());
    for label in HEADERS {
        let rect = page
            .search_within(label, region)
            .into_iter()
            .next()
            .ok_or_else(|| Error::SectionNotFound {
                tried: vec![label.to_string()],
            })?;
        pos.push(rect);
    }
    let [no, driver, nat, _entrant, laps, time, gap, int, kmh, fastest, _on, pts] =
        <[Rect; 12]>::try_from(pos).map_err(|_| Error::PdfParse("header layout".into()))?;

    Ok(vec![
        no.left,
        (no.right + driver.left) / 2.0,
        nat.left,
        nat.right,
        laps.left,
        laps.right,
        (time.right + gap.left) / 2.0,
        (gap.right + int.left) / 2.0,
        (int.right + kmh.left) / 2.0,
        fastest.left,
        fastest.right,
        pts.left,
    ])
}
