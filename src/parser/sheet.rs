//! Timing sheet loading: PDF bytes to a [`TimingDocument`].

use std::io::Read;
use std::path::Path;

use lopdf::Document as LopdfDocument;
use rayon::prelude::*;

use crate::detect::detect_version_from_path;
use crate::error::{Error, Result};
use crate::model::{Metadata, Page, ReportKind, TimingDocument};

use super::layout::SpanExtractor;

/// Options for loading timing sheets.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Extract page spans in parallel (pages are independent)
    pub parallel: bool,
}

impl ParseOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable parallel page extraction.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Parser for one timing sheet PDF.
pub struct SheetParser {
    doc: LopdfDocument,
    kind: ReportKind,
    options: ParseOptions,
}

impl SheetParser {
    /// Open a timing sheet file.
    pub fn open<P: AsRef<Path>>(kind: ReportKind, path: P) -> Result<Self> {
        Self::open_with_options(kind, path, ParseOptions::default())
    }

    /// Open a timing sheet file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(
        kind: ReportKind,
        path: P,
        options: ParseOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        detect_version_from_path(path)?;

        let doc = LopdfDocument::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Self::from_loaded(kind, doc, options)
    }

    /// Parse a timing sheet from bytes.
    pub fn from_bytes(kind: ReportKind, data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(kind, data, ParseOptions::default())
    }

    /// Parse a timing sheet from bytes with custom options.
    pub fn from_bytes_with_options(
        kind: ReportKind,
        data: &[u8],
        options: ParseOptions,
    ) -> Result<Self> {
        crate::detect::detect_version_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Self::from_loaded(kind, doc, options)
    }

    /// Parse a timing sheet from a reader.
    pub fn from_reader<R: Read>(kind: ReportKind, mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(kind, &data)
    }

    fn from_loaded(kind: ReportKind, doc: LopdfDocument, options: ParseOptions) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc, kind, options })
    }

    /// Parse the sheet into a [`TimingDocument`].
    pub fn parse(&self) -> Result<TimingDocument> {
        let mut document = TimingDocument::new(self.kind);
        document.metadata = self.extract_metadata();

        let page_ids = self.doc.get_pages();
        document.metadata.page_count = page_ids.len() as u32;

        let page_nums: Vec<u32> = page_ids.keys().copied().collect();
        let extractor = SpanExtractor::new(&self.doc);

        let mut pages: Vec<Page> = if self.options.parallel {
            page_nums
                .par_iter()
                .map(|&num| self.parse_page(&extractor, num))
                .collect::<Result<Vec<_>>>()?
        } else {
            page_nums
                .iter()
                .map(|&num| self.parse_page(&extractor, num))
                .collect::<Result<Vec<_>>>()?
        };

        pages.sort_by_key(|p| p.number);
        document.pages = pages;

        log::debug!(
            "parsed {} as {}: {} pages",
            document
                .metadata
                .title
                .as_deref()
                .unwrap_or("untitled sheet"),
            self.kind,
            document.page_count()
        );
        Ok(document)
    }

    /// Parse a single page into spans.
    fn parse_page(&self, extractor: &SpanExtractor<'_>, page_num: u32) -> Result<Page> {
        let (width, height) = self.page_dimensions(page_num)?;
        let spans = extractor.extract_page_spans(page_num, height)?;
        Ok(Page::from_spans(page_num, width, height, spans))
    }

    /// Get page dimensions from the MediaBox.
    fn page_dimensions(&self, page_num: u32) -> Result<(f32, f32)> {
        let pages = self.doc.get_pages();
        let page_id = pages
            .get(&page_num)
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

        if let Ok(page_dict) = self.doc.get_dictionary(*page_id) {
            if let Ok(media_box) = page_dict.get(b"MediaBox") {
                if let Ok(array) = media_box.as_array() {
                    if array.len() >= 4 {
                        let width = array[2].as_float().unwrap_or(595.0);
                        let height = array[3].as_float().unwrap_or(842.0);
                        return Ok((width, height));
                    }
                }
            }
        }

        // FIA sheets are A4
        Ok((595.0, 842.0))
    }

    /// Extract document metadata from the Info dictionary.
    fn extract_metadata(&self) -> Metadata {
        let mut metadata = Metadata {
            pdf_version: self.doc.version.to_string(),
            ..Metadata::default()
        };

        if let Ok(info) = self.doc.trailer.get(b"Info") {
            if let Ok(info_ref) = info.as_reference() {
                if let Ok(info_dict) = self.doc.get_dictionary(info_ref) {
                    metadata.title = get_string_from_dict(info_dict, b"Title");
                    metadata.creator = get_string_from_dict(info_dict, b"Creator");
                    metadata.producer = get_string_from_dict(info_dict, b"Producer");

                    if let Some(date_str) = get_string_from_dict(info_dict, b"CreationDate") {
                        metadata.created = parse_pdf_date(&date_str);
                    }
                    if let Some(date_str) = get_string_from_dict(info_dict, b"ModDate") {
                        metadata.modified = parse_pdf_date(&date_str);
                    }
                }
            }
        }

        metadata
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        lopdf::Object::String(bytes, _) => Some(super::layout::decode_text_simple(bytes)),
        lopdf::Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    })
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:")?;

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240623154512").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 23);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
    }

    #[test]
    fn test_from_bytes_rejects_non_pdf() {
        let result = SheetParser::from_bytes(ReportKind::RaceClassification, b"not a pdf at all");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_options_sequential() {
        let options = ParseOptions::new().sequential();
        assert!(!options.parallel);
    }
}
