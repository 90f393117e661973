//! PDF parsing: sheet loading, text layout, grid extraction.

pub mod grid;
mod layout;
mod sheet;

pub use grid::GridOptions;
pub use layout::SpanExtractor;
pub use sheet::{ParseOptions, SheetParser};
