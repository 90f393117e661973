//! Page-level types: positioned text and anchor search.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A rectangle in page coordinates (origin top-left, y grows downward).
///
/// Regions are always derived from anchor label positions, never from
/// hard-coded pixel values; layouts shift between events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (points)
    pub left: f32,
    /// Top edge (points)
    pub top: f32,
    /// Right edge (points)
    pub right: f32,
    /// Bottom edge (points)
    pub bottom: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Horizontal midpoint.
    pub fn x_mid(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Vertical midpoint.
    pub fn y_mid(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Check whether a point lies inside the rectangle.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A text span with position information.
///
/// Coordinates are top-down page points. Width is estimated from character
/// count and font size; the label-based grid convention of timing sheets
/// only needs relative positions, not exact glyph metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Height (approximately the font size)
    pub height: f32,
}

impl TextSpan {
    /// Create a new text span with an estimated width.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = font_size * 0.5 * text.chars().count() as f32;
        Self {
            text,
            x,
            y,
            width,
            height: font_size,
        }
    }

    /// Bounding rectangle of the span.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Vertical center of the span.
    pub fn y_mid(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// A single page of a timing document.
///
/// Holds the page dimensions and a text-with-position index; supports
/// searching for literal substrings and returning their bounding boxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Text spans on the page
    pub spans: Vec<TextSpan>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            spans: Vec::new(),
        }
    }

    /// Create a page from pre-built spans.
    pub fn from_spans(number: u32, width: f32, height: f32, spans: Vec<TextSpan>) -> Self {
        Self {
            number,
            width,
            height,
            spans,
        }
    }

    /// Full page bounds.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Find bounding boxes of every occurrence of `needle` on the page.
    ///
    /// Exact, case- and whitespace-sensitive substring match against the
    /// span index. A match inside a span gets a proportionally sliced
    /// x-extent. Results are ordered top-to-bottom, then left-to-right.
    pub fn search(&self, needle: &str) -> Vec<Rect> {
        self.search_within(needle, &self.bounds())
    }

    /// Like [`search`](Self::search), but only spans whose center lies
    /// inside `region` are considered.
    pub fn search_within(&self, needle: &str, region: &Rect) -> Vec<Rect> {
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Rect> = Vec::new();
        for span in &self.spans {
            let mid = span.rect();
            if !region.contains(mid.x_mid(), mid.y_mid()) {
                continue;
            }
            let total = span.text.chars().count() as f32;
            if total == 0.0 {
                continue;
            }
            let per_char = span.width / total;
            for (byte_idx, _) in span.text.match_indices(needle) {
                let start_chars = span.text[..byte_idx].chars().count() as f32;
                let len_chars = needle.chars().count() as f32;
                let left = span.x + start_chars * per_char;
                hits.push(Rect::new(
                    left,
                    span.y,
                    left + len_chars * per_char,
                    span.y + span.height,
                ));
            }
        }

        hits.sort_by(|a, b| {
            (a.top, a.left)
                .partial_cmp(&(b.top, b.left))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    /// Locate the first of an ordered list of alternative anchor labels.
    ///
    /// Returns the first bounding box of the first label that matches.
    /// Fails with [`Error::SectionNotFound`] when all variants are absent.
    pub fn locate_any(&self, anchors: &[&str]) -> Result<Rect> {
        for anchor in anchors {
            if let Some(rect) = self.search(anchor).into_iter().next() {
                return Ok(rect);
            }
        }
        Err(Error::SectionNotFound {
            tried: anchors.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Reconstruct the page's text lines in reading order.
    ///
    /// Spans are grouped by vertical position and joined with single
    /// spaces. Used for prefix-scraping lap chart pages ("GRID ...",
    /// "LAP n ...").
    pub fn text_lines(&self) -> Vec<String> {
        let mut sorted: Vec<&TextSpan> = self.spans.iter().collect();
        sorted.sort_by(|a, b| {
            (a.y, a.x)
                .partial_cmp(&(b.y, b.x))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut lines: Vec<(f32, Vec<&TextSpan>)> = Vec::new();
        for span in sorted {
            match lines.last_mut() {
                Some((y, group)) if (span.y_mid() - *y).abs() <= span.height * 0.5 => {
                    group.push(span);
                }
                _ => lines.push((span.y_mid(), vec![span])),
            }
        }

        lines
            .into_iter()
            .map(|(_, mut group)| {
                group.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
                group
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(texts: &[(&str, f32, f32)]) -> Page {
        let spans = texts
            .iter()
            .map(|(t, x, y)| TextSpan::new(*t, *x, *y, 10.0))
            .collect();
        Page::from_spans(1, 595.0, 842.0, spans)
    }

    #[test]
    fn test_search_exact_match() {
        let page = page_with(&[("Race Final Classification", 100.0, 50.0)]);
        let hits = page.search("Race Final Classification");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].left, 100.0);
        assert_eq!(hits[0].top, 50.0);
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let page = page_with(&[("NOT CLASSIFIED", 100.0, 400.0)]);
        assert!(page.search("not classified").is_empty());
        assert_eq!(page.search("NOT CLASSIFIED").len(), 1);
    }

    #[test]
    fn test_search_substring_slices_extent() {
        // "DRIVER" starts 4 chars into "NO  DRIVER": slice must shift right.
        let page = page_with(&[("NO  DRIVER", 100.0, 50.0)]);
        let hits = page.search("DRIVER");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].left > 100.0);
    }

    #[test]
    fn test_search_within_clips() {
        let page = page_with(&[("LAPS", 100.0, 50.0), ("LAPS", 100.0, 500.0)]);
        let upper = Rect::new(0.0, 0.0, 595.0, 200.0);
        assert_eq!(page.search_within("LAPS", &upper).len(), 1);
        assert_eq!(page.search("LAPS").len(), 2);
    }

    #[test]
    fn test_locate_any_falls_through_variants() {
        let page = page_with(&[("Race Provisional Classification", 100.0, 50.0)]);
        let rect = page
            .locate_any(&[
                "Race Final Classification",
                "Race Provisional Classification",
            ])
            .unwrap();
        assert_eq!(rect.top, 50.0);
    }

    #[test]
    fn test_locate_any_exhausts_to_error() {
        let page = page_with(&[("something else", 10.0, 10.0)]);
        let err = page.locate_any(&["A", "B"]).unwrap_err();
        assert!(matches!(err, Error::SectionNotFound { tried } if tried == vec!["A", "B"]));
    }

    #[test]
    fn test_text_lines_reading_order() {
        let page = page_with(&[
            ("18", 80.0, 100.0),
            ("GRID", 20.0, 100.0),
            ("1", 60.0, 100.0),
            ("LAP 1", 20.0, 120.0),
        ]);
        let lines = page.text_lines();
        assert_eq!(lines[0], "GRID 1 18");
        assert_eq!(lines[1], "LAP 1");
    }
}
