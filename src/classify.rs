//! Merging the classified and not-classified sections of a results sheet.
//!
//! A race classification prints finishers first, then a `NOT CLASSIFIED`
//! marker, then retirements. Finishing-order numbering continues straight
//! through both sections in printed order, which is the official ordering
//! and not always by laps completed.

use crate::error::{Error, Result};
use crate::model::RawTable;

/// Which section of the results sheet a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Classified,
    NotClassified,
}

/// The two sections of a results table, split at the `NOT CLASSIFIED`
/// marker row.
#[derive(Debug, Clone)]
pub struct ClassificationAssembler {
    classified: Vec<Vec<String>>,
    not_classified: Vec<Vec<String>>,
}

impl ClassificationAssembler {
    /// Split a raw results table at its section marker.
    ///
    /// The transition is one-way: once the marker row is seen every later
    /// row is not-classified, even if its cells resemble a finisher.
    /// Spacer rows (all cells empty) are dropped so that numbering stays
    /// positional.
    pub fn split(table: &RawTable) -> Self {
        let mut classified = Vec::new();
        let mut not_classified = Vec::new();
        let mut section = Section::Classified;
        for row in &table.rows {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            if is_marker_row(row) {
                section = Section::NotClassified;
                continue;
            }
            match section {
                Section::Classified => classified.push(row.clone()),
                Section::NotClassified => not_classified.push(row.clone()),
            }
        }
        Self {
            classified,
            not_classified,
        }
    }

    /// Rows of the classified section, finishing order 1..N.
    pub fn classified(&self) -> &[Vec<String>] {
        &self.classified
    }

    /// Rows of the not-classified section, finishing order N+1..N+M.
    pub fn not_classified(&self) -> &[Vec<String>] {
        &self.not_classified
    }

    /// All rows with their section and continuing finishing-order number.
    pub fn rows(&self) -> impl Iterator<Item = (u32, Section, &[String])> {
        let n = self.classified.len() as u32;
        self.classified
            .iter()
            .enumerate()
            .map(|(i, row)| (i as u32 + 1, Section::Classified, row.as_slice()))
            .chain(
                self.not_classified
                    .iter()
                    .enumerate()
                    .map(move |(i, row)| (n + i as u32 + 1, Section::NotClassified, row.as_slice())),
            )
    }
}

/// True when a row is the section marker separating finishers from
/// retirements.
pub fn is_marker_row(row: &[String]) -> bool {
    row.iter().any(|c| c.trim().starts_with("NOT CLASSIFIED"))
}

/// Parse a points cell. DNF rows normally carry none, so empty means 0.
pub fn parse_points(cell: &str) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>()
        .map_err(|_| Error::PdfParse(format!("malformed points cell {cell:?}")))
}

/// Format a points total, dropping the fraction when it is whole.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as i64)
    } else {
        format!("{points}")
    }
}

/// Running constructor point totals for one event.
///
/// Keyed by canonical entrant name, kept in first-appearance order so the
/// constructor-results output follows the classification sheet. Discarded
/// after the event's reports are built.
#[derive(Debug, Clone, Default)]
pub struct ConstructorTotals {
    totals: Vec<(String, f64)>,
}

impl ConstructorTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points for an entrant, inserting it on first sight.
    pub fn add(&mut self, entrant: &str, points: f64) {
        match self.totals.iter_mut().find(|(name, _)| name == entrant) {
            Some((_, total)) => *total += points,
            None => self.totals.push((entrant.to_string(), points)),
        }
    }

    /// Totals in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.totals.iter().map(|(name, pts)| (name.as_str(), *pts))
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
