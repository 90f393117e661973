//! Cross-document lookups.
//!
//! A results sheet alone does not carry everything a canonical row needs.
//! Grid positions come from the lap chart, fastest-lap ranks from sorting
//! the whole field's fastest times, and short constructor names from a
//! static alias table. Each lookup here is built once from a parsed
//! document and consulted while assembling rows of another.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::TimingDocument;
use crate::time::parse_duration;

/// Starting grid order, read from the `GRID` row of a lap chart.
#[derive(Debug, Clone)]
pub struct GridOrder {
    numbers: Vec<String>,
}

impl GridOrder {
    /// Build from the lap chart document.
    ///
    /// The chart's first page carries one line `GRID <no> <no> ...` listing
    /// car numbers in starting order.
    pub fn from_lap_chart(doc: &TimingDocument) -> Result<Self> {
        for page in &doc.pages {
            for line in page.text_lines() {
                if let Some(rest) = line.strip_prefix("GRID ") {
                    let numbers: Vec<String> =
                        rest.split_whitespace().map(str::to_string).collect();
                    let order = Self { numbers };
                    order.verify_permutation()?;
                    return Ok(order);
                }
            }
        }
        Err(Error::SectionNotFound {
            tried: vec!["GRID".to_string()],
        })
    }

    /// Build directly from an ordered list of car numbers.
    pub fn from_numbers(numbers: Vec<String>) -> Result<Self> {
        let order = Self { numbers };
        order.verify_permutation()?;
        Ok(order)
    }

    /// 1-based grid position of a car number.
    ///
    /// A missing number means the driver was not on the grid document at
    /// all, which must be surfaced rather than defaulted.
    pub fn position(&self, no: &str) -> Result<u32> {
        self.numbers
            .iter()
            .position(|n| n == no)
            .map(|i| i as u32 + 1)
            .ok_or_else(|| Error::key_not_found(no, "grid"))
    }

    /// Number of grid slots.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// True when no grid slots were found.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    // A duplicated car number would make every later lookup ambiguous,
    // so corrupted grids fail at construction.
    fn verify_permutation(&self) -> Result<()> {
        let mut seen = HashMap::new();
        for no in &self.numbers {
            if seen.insert(no.as_str(), ()).is_some() {
                return Err(Error::PdfParse(format!(
                    "duplicate car number {no:?} in grid order"
                )));
            }
        }
        Ok(())
    }
}

/// Per-lap running order, read from the `LAP n` rows of a lap chart.
#[derive(Debug, Clone)]
pub struct LapChart {
    laps: Vec<Vec<String>>,
}

impl LapChart {
    /// Build from the lap chart document.
    ///
    /// Each line `LAP <n> <no> <no> ...` lists car numbers in running
    /// order at the end of lap `n`. Laps are indexed by the printed lap
    /// number, not line position, so page breaks cannot scramble them.
    pub fn from_document(doc: &TimingDocument) -> Result<Self> {
        let re = Regex::new(r"^LAP (\d+) (.+)$").unwrap();
        let mut numbered: Vec<(u32, Vec<String>)> = Vec::new();
        for page in &doc.pages {
            for line in page.text_lines() {
                if let Some(caps) = re.captures(&line) {
                    let lap: u32 = caps[1]
                        .parse()
                        .map_err(|_| Error::PdfParse(format!("bad lap number in {line:?}")))?;
                    let order = caps[2].split_whitespace().map(str::to_string).collect();
                    numbered.push((lap, order));
                }
            }
        }
        if numbered.is_empty() {
            return Err(Error::SectionNotFound {
                tried: vec!["LAP".to_string()],
            });
        }
        numbered.sort_by_key(|(lap, _)| *lap);
        Ok(Self {
            laps: numbered.into_iter().map(|(_, order)| order).collect(),
        })
    }

    /// Total number of charted laps.
    pub fn lap_count(&self) -> u32 {
        self.laps.len() as u32
    }

    /// 1-based running position of a car at the end of the given lap.
    ///
    /// A driver absent from a lap's ordering retired before completing it;
    /// callers truncate that driver's lap sequence at the last lap that
    /// still resolves.
    pub fn position(&self, lap: u32, no: &str) -> Result<u32> {
        let order = self
            .laps
            .get(lap.checked_sub(1).ok_or_else(|| Error::key_not_found(no, "lap chart"))? as usize)
            .ok_or_else(|| Error::key_not_found(no, "lap chart"))?;
        order
            .iter()
            .position(|n| n == no)
            .map(|i| i as u32 + 1)
            .ok_or_else(|| Error::key_not_found(no, "lap chart"))
    }

    /// Running order at the end of the given lap.
    pub fn order(&self, lap: u32) -> Option<&[String]> {
        lap.checked_sub(1)
            .and_then(|i| self.laps.get(i as usize))
            .map(|v| v.as_slice())
    }

    /// Number of consecutive laps, from lap 1, on which the car appears.
    pub fn laps_completed(&self, no: &str) -> u32 {
        self.laps
            .iter()
            .take_while(|order| order.iter().any(|n| n == no))
            .count() as u32
    }
}

/// Field-wide fastest-lap ranking.
///
/// Built from every driver's fastest-lap time string, classified and not.
#[derive(Debug, Clone)]
pub struct FastestLapIndex {
    sorted: Vec<String>,
}

impl FastestLapIndex {
    /// Sort the given time strings ascending by parsed duration.
    ///
    /// The sort is stable, so equal times keep their document order. Empty
    /// cells (drivers with no recorded lap) are left out of the index; a
    /// non-empty cell that does not parse is a layout mismatch and fails
    /// the build.
    pub fn build<I, S>(times: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keyed: Vec<(i64, String)> = Vec::new();
        for time in times {
            let time = time.into();
            if time.trim().is_empty() {
                continue;
            }
            keyed.push((parse_duration(&time)?, time));
        }
        keyed.sort_by_key(|(ms, _)| *ms);
        Ok(Self {
            sorted: keyed.into_iter().map(|(_, t)| t).collect(),
        })
    }

    /// 1-based rank of a time string, or 0 when the time is not indexed.
    ///
    /// The 0 sentinel stands for "no rank" (driver without a recorded
    /// fastest lap) and is never an error.
    pub fn rank(&self, time: &str) -> u32 {
        self.sorted
            .iter()
            .position(|t| t == time)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }
}

/// Static mapping from sponsor-laden entrant names to short constructor
/// names.
///
/// Loaded once per process from JSON and injected into builders. Lookups
/// are strict: an unmapped name is an error, so new sponsor branding is
/// caught at extraction time instead of leaking into output.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct EntrantAliases {
    map: HashMap<String, String>,
}

impl EntrantAliases {
    /// Parse an alias table from a JSON object of `full name: short name`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::PdfParse(format!("invalid entrant alias table: {e}")))
    }

    /// The alias table bundled with the crate.
    pub fn bundled() -> Self {
        serde_json::from_str(include_str!("../data/entrants.json")).unwrap_or_else(|e| {
            log::warn!("bundled entrant alias table unreadable: {e}");
            Self {
                map: HashMap::new(),
            }
        })
    }

    /// Resolve a full entrant name to its short constructor name.
    ///
    /// Already-canonical short names resolve to themselves.
    pub fn resolve(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if let Some(short) = self.map.get(name) {
            return Ok(short.clone());
        }
        if self.map.values().any(|v| v == name) {
            return Ok(name.to_string());
        }
        Err(Error::UnknownEntrant(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, Page, ReportKind, TextSpan, TimingDocument};

    fn chart_doc(lines: &[&str]) -> TimingDocument {
        let spans = lines
            .iter()
            .enumerate()
            .map(|(i, line)| TextSpan::new(line.to_string(), 40.0, 100.0 + i as f32 * 12.0, 8.0))
            .collect();
        TimingDocument {
            kind: ReportKind::RaceLapChart,
            metadata: Metadata::default(),
            pages: vec![Page::from_spans(1, 595.0, 842.0, spans)],
        }
    }

    #[test]
    fn test_grid_order_positions() {
        let doc = chart_doc(&["GRID 44 33 77 16", "LAP 1 44 77 33 16"]);
        let grid = GridOrder::from_lap_chart(&doc).unwrap();
        assert_eq!(grid.position("44").unwrap(), 1);
        assert_eq!(grid.position("77").unwrap(), 3);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_grid_missing_driver_fails() {
        let doc = chart_doc(&["GRID 44 33"]);
        let grid = GridOrder::from_lap_chart(&doc).unwrap();
        let err = grid.position("99").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn test_grid_duplicate_number_raises() {
        let err = GridOrder::from_numbers(vec!["44".into(), "33".into(), "44".into()])
            .unwrap_err();
        assert!(matches!(err, Error::PdfParse(_)));
    }

    #[test]
    fn test_grid_positions_form_permutation() {
        let doc = chart_doc(&["GRID 5 16 44 63 81"]);
        let grid = GridOrder::from_lap_chart(&doc).unwrap();
        let mut positions: Vec<u32> = ["5", "16", "44", "63", "81"]
            .iter()
            .map(|no| grid.position(no).unwrap())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_lap_chart_lookup_and_truncation() {
        let doc = chart_doc(&[
            "GRID 44 33 77",
            "LAP 1 44 33 77",
            "LAP 2 33 44 77",
            "LAP 3 33 44",
        ]);
        let chart = LapChart::from_document(&doc).unwrap();
        assert_eq!(chart.lap_count(), 3);
        assert_eq!(chart.position(1, "44").unwrap(), 1);
        assert_eq!(chart.position(2, "44").unwrap(), 2);
        assert!(matches!(
            chart.position(3, "77").unwrap_err(),
            Error::KeyNotFound { .. }
        ));
        assert_eq!(chart.laps_completed("77"), 2);
        assert_eq!(chart.laps_completed("33"), 3);
    }

    #[test]
    fn test_lap_chart_sorted_by_printed_lap_number() {
        let doc = chart_doc(&["LAP 2 33 44", "LAP 1 44 33"]);
        let chart = LapChart::from_document(&doc).unwrap();
        assert_eq!(chart.position(1, "44").unwrap(), 1);
        assert_eq!(chart.position(2, "44").unwrap(), 2);
    }

    #[test]
    fn test_fastest_lap_rank_monotonic() {
        let index = FastestLapIndex::build(["1:21.500", "1:19.123", "1:20.007"]).unwrap();
        assert_eq!(index.rank("1:19.123"), 1);
        assert_eq!(index.rank("1:20.007"), 2);
        assert_eq!(index.rank("1:21.500"), 3);
        // idempotent
        assert_eq!(index.rank("1:19.123"), 1);
    }

    #[test]
    fn test_fastest_lap_missing_time_sentinel() {
        let index = FastestLapIndex::build(["1:19.123"]).unwrap();
        assert_eq!(index.rank("1:25.000"), 0);
        assert_eq!(index.rank(""), 0);
    }

    #[test]
    fn test_fastest_lap_skips_empty_cells() {
        let index = FastestLapIndex::build(["1:19.123", "", "  "]).unwrap();
        assert_eq!(index.rank("1:19.123"), 1);
    }

    #[test]
    fn test_fastest_lap_malformed_time_fails() {
        let err = FastestLapIndex::build(["1:19.123", "DNF"]).unwrap_err();
        assert!(matches!(err, Error::MalformedDuration(_)));
    }

    #[test]
    fn test_alias_resolution() {
        let aliases = EntrantAliases::from_json_str(
            r#"{"Oracle Red Bull Racing": "Red Bull", "Mercedes-AMG Petronas F1 Team": "Mercedes"}"#,
        )
        .unwrap();
        assert_eq!(aliases.resolve("Oracle Red Bull Racing").unwrap(), "Red Bull");
        assert_eq!(aliases.resolve("Red Bull").unwrap(), "Red Bull");
        assert!(matches!(
            aliases.resolve("Scuderia Unknown").unwrap_err(),
            Error::UnknownEntrant(_)
        ));
    }
}
