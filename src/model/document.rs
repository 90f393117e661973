//! Document-level types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::page::{Page, Rect};
use crate::error::{Error, Result};

/// The kind of timing sheet a document holds.
///
/// Kinds are the stable identifiers the (external) retrieval layer keys on;
/// [`slug`](ReportKind::slug) is the FIA publication file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Qualifying session classification
    QualiClassification,
    /// Race classification (final or provisional)
    RaceClassification,
    /// Race lap analysis (per-driver lap times)
    RaceLapAnalysis,
    /// Race lap chart (per-lap running order, plus the starting grid)
    RaceLapChart,
    /// Race history chart
    RaceHistoryChart,
    /// Pit stop summary
    RacePitStops,
    /// Drivers' championship standings
    DriversChampionship,
    /// Constructors' championship standings
    ConstructorsChampionship,
    /// Sprint qualifying (shootout) classification
    SprintQualiClassification,
    /// Sprint session classification
    SprintClassification,
    /// Sprint lap chart
    SprintLapChart,
    /// Sprint pit stop summary
    SprintPitStops,
}

impl ReportKind {
    /// All kinds, in publication order.
    pub const ALL: [ReportKind; 12] = [
        ReportKind::QualiClassification,
        ReportKind::RaceClassification,
        ReportKind::RaceLapAnalysis,
        ReportKind::RaceLapChart,
        ReportKind::RaceHistoryChart,
        ReportKind::RacePitStops,
        ReportKind::DriversChampionship,
        ReportKind::ConstructorsChampionship,
        ReportKind::SprintQualiClassification,
        ReportKind::SprintClassification,
        ReportKind::SprintLapChart,
        ReportKind::SprintPitStops,
    ];

    /// Snake-case kind name, used in file naming and CLI selection.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::QualiClassification => "quali_classification",
            ReportKind::RaceClassification => "race_classification",
            ReportKind::RaceLapAnalysis => "race_lap_analysis",
            ReportKind::RaceLapChart => "race_lap_chart",
            ReportKind::RaceHistoryChart => "race_history_chart",
            ReportKind::RacePitStops => "race_pit_stops",
            ReportKind::DriversChampionship => "drivers_championship",
            ReportKind::ConstructorsChampionship => "constructors_championship",
            ReportKind::SprintQualiClassification => "sprint_quali_classification",
            ReportKind::SprintClassification => "sprint_classification",
            ReportKind::SprintLapChart => "sprint_lap_chart",
            ReportKind::SprintPitStops => "sprint_pit_stops",
        }
    }

    /// FIA publication file stem for this kind.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::QualiClassification => {
                "f1_q0_timing_qualifyingsessionprovisionalclassification_v01"
            }
            ReportKind::RaceClassification => "f1_r0_timing_raceprovisionalclassification_v01",
            ReportKind::RaceLapAnalysis => "f1_r0_timing_racelapanalysis_v01",
            ReportKind::RaceLapChart => "f1_r0_timing_racelapchart_v01",
            ReportKind::RaceHistoryChart => "f1_r0_timing_racehistorychart_v01",
            ReportKind::RacePitStops => "f1_r0_timing_racepitstopsummary_v01",
            ReportKind::DriversChampionship => "f1_r0_timing_driverschampionship_v01",
            ReportKind::ConstructorsChampionship => "f1_r0_timing_constructorschampionship_v01",
            ReportKind::SprintQualiClassification => {
                "f1_sq0_timing_sprintqualifyingsessionprovisionalclassification_v01"
            }
            ReportKind::SprintClassification => "f1_s0_timing_sprintprovisionalclassification_v01",
            ReportKind::SprintLapChart => "f1_s0_timing_sprintlapchart_v01",
            ReportKind::SprintPitStops => "f1_s0_timing_sprintpitstopsummary_v01",
        }
    }

    /// Parse a kind from its snake-case name.
    pub fn from_str_opt(s: &str) -> Option<ReportKind> {
        ReportKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Whether this kind belongs to a sprint event.
    pub fn is_sprint(&self) -> bool {
        matches!(
            self,
            ReportKind::SprintQualiClassification
                | ReportKind::SprintClassification
                | ReportKind::SprintLapChart
                | ReportKind::SprintPitStops
        )
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed timing document: an ordered sequence of pages, identified by
/// report kind. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingDocument {
    /// What kind of sheet this is
    pub kind: ReportKind,
    /// Document metadata from the PDF Info dictionary
    pub metadata: Metadata,
    /// Pages in publication order
    pub pages: Vec<Page>,
}

impl TimingDocument {
    /// Create a document with no pages.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            metadata: Metadata::default(),
            pages: Vec::new(),
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Find the first page carrying one of the given anchor labels.
    ///
    /// Pages are scanned in order; within a page the anchor variants are
    /// tried in order. Fails with [`Error::SectionNotFound`] when no page
    /// carries any variant.
    pub fn locate_any(&self, anchors: &[&str]) -> Result<(&Page, Rect)> {
        for page in &self.pages {
            for anchor in anchors {
                if let Some(rect) = page.search(anchor).into_iter().next() {
                    return Ok((page, rect));
                }
            }
        }
        Err(Error::SectionNotFound {
            tried: anchors.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// PDF producer
    pub producer: Option<String>,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
    /// PDF version (e.g., "1.7")
    pub pdf_version: String,
    /// Total number of pages
    pub page_count: u32,
}
