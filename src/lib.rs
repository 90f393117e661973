//! # laptrace
//!
//! Extraction and reconciliation of motorsport timing data from official
//! position-based PDF timing sheets.
//!
//! Timing sheets carry no machine-readable structure: every value is a
//! positioned text run on a page. This library locates known section
//! labels, slices the labelled regions into text grids, maps the grids
//! onto fixed per-report schemas, and reconciles values across documents
//! (grid positions from the lap chart, fastest-lap ranks from the whole
//! field's times, sponsor-laden entrant names against a static alias
//! table) into ordered tabular reports.
//!
//! ## Quick Start
//!
//! ```no_run
//! use laptrace::{parse_file, report, ReportKind};
//!
//! fn main() -> laptrace::Result<()> {
//!     let quali = parse_file(ReportKind::QualiClassification, "quali.pdf")?;
//!     let rows = report::build_quali_classification(&quali)?;
//!     print!("{}", rows.to_csv_string());
//!     Ok(())
//! }
//! ```
//!
//! Reports that join across documents take the second document already
//! parsed, so one event uses a single consistent grid order:
//!
//! ```no_run
//! use laptrace::{parse_file, report, EntrantAliases, ReportKind};
//!
//! fn main() -> laptrace::Result<()> {
//!     let race = parse_file(ReportKind::RaceClassification, "race.pdf")?;
//!     let chart = parse_file(ReportKind::RaceLapChart, "lap_chart.pdf")?;
//!     let aliases = EntrantAliases::bundled();
//!     let built = report::build_race_classification(&race, &chart, &aliases)?;
//!     print!("{}", built.drivers.to_csv_string());
//!     print!("{}", built.constructors.to_csv_string());
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod schema;
pub mod time;

// Re-export commonly used types
pub use detect::{detect_version_from_bytes, detect_version_from_path, is_pdf_bytes};
pub use error::{Error, Result};
pub use model::{
    CanonicalRow, Metadata, Page, RawTable, Rect, ReportKind, TextSpan, TimingDocument, Value,
};
pub use parser::{GridOptions, ParseOptions, SheetParser};
pub use report::Report;
pub use resolve::{EntrantAliases, FastestLapIndex, GridOrder, LapChart};
pub use schema::{ColumnSchema, FieldSpec, Transform};
pub use time::{format_duration, parse_duration};

use std::io::Read;
use std::path::Path;

/// Parse a timing sheet PDF from a file.
///
/// # Example
///
/// ```no_run
/// use laptrace::{parse_file, ReportKind};
///
/// let doc = parse_file(ReportKind::RaceLapChart, "lap_chart.pdf").unwrap();
/// println!("pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(kind: ReportKind, path: P) -> Result<TimingDocument> {
    SheetParser::open(kind, path)?.parse()
}

/// Parse a timing sheet PDF from a file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(
    kind: ReportKind,
    path: P,
    options: ParseOptions,
) -> Result<TimingDocument> {
    SheetParser::open_with_options(kind, path, options)?.parse()
}

/// Parse a timing sheet PDF from bytes.
pub fn parse_bytes(kind: ReportKind, data: &[u8]) -> Result<TimingDocument> {
    SheetParser::from_bytes(kind, data)?.parse()
}

/// Parse a timing sheet PDF from bytes with custom options.
pub fn parse_bytes_with_options(
    kind: ReportKind,
    data: &[u8],
    options: ParseOptions,
) -> Result<TimingDocument> {
    SheetParser::from_bytes_with_options(kind, data, options)?.parse()
}

/// Parse a timing sheet PDF from a reader.
pub fn parse_reader<R: Read>(kind: ReportKind, reader: R) -> Result<TimingDocument> {
    SheetParser::from_reader(kind, reader)?.parse()
}
