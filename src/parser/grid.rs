//! Region extraction: a page rectangle to a rectangular text grid.
//!
//! Columns come either from explicit separator positions (computed by
//! callers as midpoints between header label boxes) or from the x-gap
//! profile of the spans themselves. Rows come from vertical grouping, with
//! an optional merge pass that folds stacked sub-lines into one logical
//! row (`\n`-joined cell text).

use crate::model::{Page, RawTable, Rect, TextSpan};

/// Configuration for grid extraction.
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Explicit vertical column separator x-positions, left to right.
    /// When absent, columns are inferred from whitespace geometry.
    pub column_separators: Option<Vec<f32>>,
    /// Y tolerance for grouping spans into one visual line (points)
    pub row_tolerance: f32,
    /// Merge consecutive visual lines closer than this into one logical
    /// row; 0.0 disables merging
    pub row_merge_tolerance: f32,
    /// Minimum horizontal gap that separates inferred columns (points)
    pub min_column_gap: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            column_separators: None,
            row_tolerance: 3.0,
            row_merge_tolerance: 0.0,
            min_column_gap: 8.0,
        }
    }
}

impl GridOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit column separators.
    pub fn with_separators(mut self, separators: Vec<f32>) -> Self {
        self.column_separators = Some(separators);
        self
    }

    /// Merge stacked lines within `tolerance` points into one logical row.
    pub fn with_row_merge(mut self, tolerance: f32) -> Self {
        self.row_merge_tolerance = tolerance;
        self
    }

    /// Set the minimum gap between inferred columns.
    pub fn with_min_column_gap(mut self, gap: f32) -> Self {
        self.min_column_gap = gap;
        self
    }
}

/// A visual line of clipped spans.
struct Line<'a> {
    y: f32,
    spans: Vec<&'a TextSpan>,
}

/// Extract the text grid inside `region`.
///
/// Guarantees: row order matches vertical position top-to-bottom; column
/// order matches horizontal position left-to-right; every row has the same
/// cell count; a cell with no detected text is the empty string. Trailing
/// blank rows are NOT filtered here; callers do that.
pub fn extract(page: &Page, region: &Rect, options: &GridOptions) -> RawTable {
    let clipped: Vec<&TextSpan> = page
        .spans
        .iter()
        .filter(|s| region.contains(s.rect().x_mid(), s.y_mid()))
        .collect();

    if clipped.is_empty() {
        return RawTable::default();
    }

    let lines = group_into_lines(clipped, options.row_tolerance);
    let boundaries = match &options.column_separators {
        Some(separators) => {
            let mut b = Vec::with_capacity(separators.len() + 2);
            b.push(region.left);
            b.extend_from_slice(separators);
            b.push(region.right);
            b
        }
        None => infer_boundaries(&lines, region, options.min_column_gap),
    };
    let column_count = boundaries.len().saturating_sub(1);
    if column_count == 0 {
        return RawTable::default();
    }

    log::debug!(
        "grid: {} lines, {} columns at {:?}",
        lines.len(),
        column_count,
        &boundaries[1..boundaries.len() - 1]
    );

    // Fold visual lines into logical rows, then assemble cells.
    let mut rows: Vec<Vec<Vec<String>>> = Vec::new(); // row -> col -> stacked lines
    let mut prev_y = f32::NEG_INFINITY;

    for line in &lines {
        let start_new_row = rows.is_empty()
            || options.row_merge_tolerance <= 0.0
            || (line.y - prev_y) > options.row_merge_tolerance;
        if start_new_row {
            rows.push(vec![Vec::new(); column_count]);
        }
        prev_y = line.y;

        let row = rows.last_mut().unwrap();
        let mut line_cells: Vec<Vec<&str>> = vec![Vec::new(); column_count];
        for span in &line.spans {
            let center = span.rect().x_mid();
            let col = column_of(&boundaries, center);
            line_cells[col].push(span.text.trim());
        }
        for (col, parts) in line_cells.into_iter().enumerate() {
            if !parts.is_empty() {
                row[col].push(parts.join(" "));
            }
        }
    }

    let rows = rows
        .into_iter()
        .map(|row| row.into_iter().map(|stack| stack.join("\n")).collect())
        .collect();
    RawTable::new(rows)
}

/// Group clipped spans into visual lines ordered top to bottom.
fn group_into_lines(mut spans: Vec<&TextSpan>, tolerance: f32) -> Vec<Line<'_>> {
    spans.sort_by(|a, b| {
        (a.y_mid(), a.x)
            .partial_cmp(&(b.y_mid(), b.x))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<Line<'_>> = Vec::new();
    for span in spans {
        match lines.last_mut() {
            Some(line) if (span.y_mid() - line.y).abs() <= tolerance => {
                line.spans.push(span);
            }
            _ => lines.push(Line {
                y: span.y_mid(),
                spans: vec![span],
            }),
        }
    }

    for line in &mut lines {
        line.spans
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    lines
}

/// Infer column boundaries from the merged x-extents of all spans.
///
/// Overlapping or nearly-touching extents collapse into one column; each
/// gap of at least `min_gap` becomes a boundary at its midpoint.
fn infer_boundaries(lines: &[Line<'_>], region: &Rect, min_gap: f32) -> Vec<f32> {
    let mut intervals: Vec<(f32, f32)> = lines
        .iter()
        .flat_map(|l| l.spans.iter())
        .map(|s| (s.x, s.x + s.width))
        .collect();
    intervals.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<(f32, f32)> = Vec::new();
    for (start, end) in intervals {
        match merged.last_mut() {
            Some((_, prev_end)) if start - *prev_end < min_gap => {
                *prev_end = prev_end.max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    let mut boundaries = Vec::with_capacity(merged.len() + 1);
    boundaries.push(region.left);
    for pair in merged.windows(2) {
        boundaries.push((pair[0].1 + pair[1].0) / 2.0);
    }
    boundaries.push(region.right);
    boundaries
}

/// Index of the column whose x-range contains `x`.
fn column_of(boundaries: &[f32], x: f32) -> usize {
    for (i, window) in boundaries.windows(2).enumerate() {
        if x < window[1] {
            return i;
        }
    }
    boundaries.len().saturating_sub(2)
}
