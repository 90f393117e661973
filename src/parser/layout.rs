//! Content-stream interpretation: raw PDF operations to positioned text.
//!
//! Timing sheets carry no table rulings worth trusting; everything
//! downstream works off the text layer, so this pass only needs to recover
//! each shown string with its position and font size.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::TextSpan;

/// Extracts positioned text spans from the pages of a lopdf document.
pub struct SpanExtractor<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor over a loaded document.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract all text spans of a page, in content-stream order.
    ///
    /// `page_height` is needed to flip PDF bottom-up baselines into the
    /// top-down coordinates the model uses.
    pub fn extract_page_spans(&self, page_num: u32, page_height: f32) -> Result<Vec<TextSpan>> {
        let pages = self.doc.get_pages();
        let page_id = pages
            .get(&page_num)
            .copied()
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();
        let content = self.page_content(page_id)?;
        self.interpret(&content, &fonts, page_height)
    }

    /// Get the decompressed content stream bytes for a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = page_dict
            .get(b"Contents")
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        match contents {
            Object::Reference(r) => {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    return s
                        .decompressed_content()
                        .map_err(|e| Error::PdfParse(e.to_string()));
                }
                Err(Error::PdfParse("Invalid content stream".to_string()))
            }
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            if let Ok(data) = s.decompressed_content() {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Walk the content stream and collect shown text.
    fn interpret(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        page_height: f32,
    ) -> Result<Vec<TextSpan>> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut spans = Vec::new();
        let mut current_font_name: Vec<u8> = Vec::new();
        let mut current_font_size: f32 = 12.0;
        let mut matrix = TextMatrix::default();
        let mut in_text_block = false;

        for op in content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text_block = true;
                    matrix = TextMatrix::default();
                }
                "ET" => {
                    in_text_block = false;
                }
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let Object::Name(font_name) = &op.operands[0] {
                            current_font_name = font_name.clone();
                        }
                        current_font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                        matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if op.operands.len() >= 6 {
                        matrix.set(
                            get_number(&op.operands[0]).unwrap_or(1.0),
                            get_number(&op.operands[1]).unwrap_or(0.0),
                            get_number(&op.operands[2]).unwrap_or(0.0),
                            get_number(&op.operands[3]).unwrap_or(1.0),
                            get_number(&op.operands[4]).unwrap_or(0.0),
                            get_number(&op.operands[5]).unwrap_or(0.0),
                        );
                    }
                }
                "T*" => {
                    matrix.next_line();
                }
                "Tj" | "TJ" => {
                    if in_text_block {
                        let text = self.decode_show_op(&op, fonts, &current_font_name);
                        self.push_span(
                            &mut spans,
                            text,
                            &matrix,
                            current_font_size,
                            page_height,
                        );
                    }
                }
                "'" | "\"" => {
                    matrix.next_line();
                    if in_text_block {
                        let text_idx = if op.operator == "\"" { 2 } else { 0 };
                        if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                            let text = self.decode_bytes(bytes, fonts, &current_font_name);
                            self.push_span(
                                &mut spans,
                                text,
                                &matrix,
                                current_font_size,
                                page_height,
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        log::debug!("extracted {} spans", spans.len());
        Ok(spans)
    }

    fn push_span(
        &self,
        spans: &mut Vec<TextSpan>,
        text: String,
        matrix: &TextMatrix,
        font_size: f32,
        page_height: f32,
    ) {
        if text.trim().is_empty() {
            return;
        }
        let (x, baseline) = matrix.position();
        let effective_size = font_size * matrix.scale();
        // Flip to top-down coordinates; the span top sits roughly one cap
        // height above the baseline.
        let top = page_height - baseline - effective_size * 0.8;
        spans.push(TextSpan::new(text, x, top, effective_size));
    }

    /// Decode the string operand(s) of a Tj/TJ operator.
    ///
    /// TJ interleaves strings with kerning adjustments in 1/1000 text-space
    /// units; large negative adjustments stand in for word spaces on
    /// timing sheets, so those become literal spaces.
    fn decode_show_op(
        &self,
        op: &lopdf::content::Operation,
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        font_name: &[u8],
    ) -> String {
        if op.operator == "TJ" {
            let mut combined = String::new();
            let space_threshold = 200.0;
            if let Some(Object::Array(arr)) = op.operands.first() {
                for item in arr {
                    match item {
                        Object::String(bytes, _) => {
                            combined.push_str(&self.decode_bytes(bytes, fonts, font_name));
                        }
                        Object::Integer(n) => {
                            if -(*n as f32) > space_threshold && !combined.ends_with(' ') {
                                combined.push(' ');
                            }
                        }
                        Object::Real(n) => {
                            if -n > space_threshold && !combined.ends_with(' ') {
                                combined.push(' ');
                            }
                        }
                        _ => {}
                    }
                }
            }
            combined
        } else if let Some(Object::String(bytes, _)) = op.operands.first() {
            self.decode_bytes(bytes, fonts, font_name)
        } else {
            String::new()
        }
    }

    /// Decode a text byte sequence using the current font's encoding,
    /// falling back to simple decoding when the font is unavailable.
    fn decode_bytes(
        &self,
        bytes: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        font_name: &[u8],
    ) -> String {
        if let Some(font_dict) = fonts.get(font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Simple text decoding fallback when no font encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Latin-1 fallback
    bytes.iter().map(|&b| b as char).collect()
}

/// Text matrix state while walking a content stream.
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Default leading; the TL operator is rare on timing sheets
        self.f -= 12.0 * self.d;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Helper to extract a number from a PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
