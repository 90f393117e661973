//! Document model types for timing sheet content.
//!
//! The model is the intermediate representation between PDF parsing and
//! report building: documents of pages, pages of positioned text spans,
//! extracted raw grids and canonical output rows.

mod document;
mod page;
mod table;

pub use document::{Metadata, ReportKind, TimingDocument};
pub use page::{Page, Rect, TextSpan};
pub use table::{serialize_rows, CanonicalRow, RawTable, Value};
