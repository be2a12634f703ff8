//! Page-layout extraction.
//!
//! Interprets each page's content stream into positioned text spans
//! (tracking the text matrix, the active font and size, and the fill
//! color), groups spans into lines by baseline proximity, and emits one
//! insert operation per non-blank span plus a newline per line. Inline
//! style comes from the span's font name and size; non-text content is
//! skipped without a placeholder.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Document as LopdfDocument, Object};
use rayon::prelude::*;

use crate::delta::{Attributes, DeltaOp};
use crate::error::{Diagnostics, Error, Result};
use crate::style::{classify_font_name, Color, SizeBucket};

use super::{DeltaExtractor, Extraction};

/// Page-layout document → Delta extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    _private: (),
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DeltaExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction> {
        let doc = LopdfDocument::load_mem(bytes).map_err(|e| {
            Error::UnsupportedSourceFormat(format!("not a page-layout document: {}", e))
        })?;

        let pages = doc.get_pages();
        // Pages are independent; extract spans in parallel and stitch the
        // results back in page order.
        let mut per_page: Vec<(u32, Vec<DeltaOp>)> = pages
            .par_iter()
            .map(|(page_num, page_id)| (*page_num, extract_page(&doc, *page_num, *page_id)))
            .collect();
        per_page.sort_by_key(|(page_num, _)| *page_num);

        let delta = per_page.into_iter().flat_map(|(_, ops)| ops).collect();
        Ok(Extraction {
            delta,
            diagnostics: Diagnostics::new(),
        })
    }
}

/// A positioned span with resolved font information.
#[derive(Debug, Clone)]
struct TextSpan {
    text: String,
    x: f32,
    y: f32,
    font_size: f32,
    font_name: String,
    color: Color,
}

/// Extract one page's operations. A page whose content stream cannot be
/// decoded is logged and skipped; one bad page never fails the document.
fn extract_page(doc: &LopdfDocument, page_num: u32, page_id: (u32, u16)) -> Vec<DeltaOp> {
    let spans = match extract_page_spans(doc, page_id) {
        Ok(spans) => spans,
        Err(e) => {
            log::warn!("skipping page {}: {}", page_num, e);
            return Vec::new();
        }
    };
    spans_to_ops(spans)
}

/// Base font name by resource name for one page, subset prefixes stripped.
fn page_font_names(doc: &LopdfDocument, page_id: (u32, u16)) -> HashMap<Vec<u8>, String> {
    let mut fonts = HashMap::new();
    if let Ok(page_fonts) = doc.get_page_fonts(page_id) {
        for (name, font) in &page_fonts {
            let base_font = font
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)))
                .unwrap_or_default();
            fonts.insert(name.clone(), base_font);
        }
    }
    fonts
}

/// Drop the `ABCDEF+` subset prefix embedded fonts carry.
fn strip_subset_prefix(name: &str) -> String {
    let bytes = name.as_bytes();
    if bytes.len() > 7
        && bytes[6] == b'+'
        && bytes[..6].iter().all(|b| b.is_ascii_uppercase())
    {
        name[7..].to_string()
    } else {
        name.to_string()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Walk the content stream, tracking the text state the span positions
/// depend on.
fn extract_page_spans(doc: &LopdfDocument, page_id: (u32, u16)) -> Result<Vec<TextSpan>> {
    let fonts = page_font_names(doc, page_id);
    let lopdf_fonts: BTreeMap<Vec<u8>, &lopdf::Dictionary> =
        doc.get_page_fonts(page_id).unwrap_or_default();

    let content = doc.get_page_content(page_id)?;
    let content = lopdf::content::Content::decode(&content)?;

    let mut spans = Vec::new();
    let mut current_font_res: Vec<u8> = Vec::new();
    let mut current_font = String::new();
    let mut font_size: f32 = 12.0;
    let mut fill = Color::BLACK;
    let mut in_text = false;
    // Line start and the advance within the current line.
    let mut line_x: f32 = 0.0;
    let mut line_y: f32 = 0.0;
    let mut advance: f32 = 0.0;
    let mut leading: f32 = 0.0;

    for op in content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                line_x = 0.0;
                line_y = 0.0;
                advance = 0.0;
            }
            "ET" => in_text = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Object::Name(name) = &op.operands[0] {
                        current_font_res = name.clone();
                        current_font = fonts
                            .get(name.as_slice())
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                    }
                    font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(l) = op.operands.first().and_then(get_number) {
                    leading = l;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    line_x += tx;
                    line_y += ty;
                    advance = 0.0;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    line_x = get_number(&op.operands[4]).unwrap_or(0.0);
                    line_y = get_number(&op.operands[5]).unwrap_or(0.0);
                    advance = 0.0;
                }
            }
            "T*" => {
                line_y -= leading;
                advance = 0.0;
            }
            // Non-stroking color selection.
            "rg" => {
                if op.operands.len() >= 3 {
                    fill = color_from_operands(&op.operands[..3]);
                }
            }
            "g" => {
                if let Some(gray) = op.operands.first().and_then(get_number) {
                    fill = Color::from_rgb_f32(gray, gray, gray);
                }
            }
            "k" => {
                if op.operands.len() >= 4 {
                    let c = get_number(&op.operands[0]).unwrap_or(0.0);
                    let m = get_number(&op.operands[1]).unwrap_or(0.0);
                    let y = get_number(&op.operands[2]).unwrap_or(0.0);
                    let k = get_number(&op.operands[3]).unwrap_or(0.0);
                    fill = Color::from_rgb_f32(
                        (1.0 - c) * (1.0 - k),
                        (1.0 - m) * (1.0 - k),
                        (1.0 - y) * (1.0 - k),
                    );
                }
            }
            "sc" | "scn" => {
                let nums: Vec<f32> = op.operands.iter().filter_map(get_number).collect();
                match nums.len() {
                    1 => fill = Color::from_rgb_f32(nums[0], nums[0], nums[0]),
                    3 => fill = Color::from_rgb_f32(nums[0], nums[1], nums[2]),
                    _ => {}
                }
            }
            "Tj" | "TJ" if in_text => {
                let text = match op.operator.as_str() {
                    "TJ" => decode_tj_array(doc, page_id, &current_font_res, &lopdf_fonts, &op.operands),
                    _ => match op.operands.first() {
                        Some(Object::String(bytes, _)) => {
                            decode_text(doc, page_id, &current_font_res, &lopdf_fonts, bytes)
                        }
                        _ => String::new(),
                    },
                };
                if !text.is_empty() {
                    spans.push(TextSpan {
                        text: text.clone(),
                        x: line_x + advance,
                        y: line_y,
                        font_size,
                        font_name: current_font.clone(),
                        color: fill,
                    });
                    // Rough advance so consecutive shows on one line keep
                    // their reading order.
                    advance += text.chars().count() as f32 * font_size * 0.5;
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn color_from_operands(operands: &[Object]) -> Color {
    Color::from_rgb_f32(
        get_number(&operands[0]).unwrap_or(0.0),
        get_number(&operands[1]).unwrap_or(0.0),
        get_number(&operands[2]).unwrap_or(0.0),
    )
}

/// Decode a text string using the active font's encoding, falling back to
/// lossy UTF-8.
fn decode_text(
    doc: &LopdfDocument,
    _page_id: (u32, u16),
    font_res: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    bytes: &[u8],
) -> String {
    if let Some(font) = fonts.get(font_res) {
        if let Ok(encoding) = font.get_font_encoding(doc) {
            if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                return text;
            }
        }
    }
    String::from_utf8_lossy(bytes).to_string()
}

/// A TJ array interleaves strings with kerning adjustments in thousandths
/// of the font size; large negative adjustments stand in for word spaces.
fn decode_tj_array(
    doc: &LopdfDocument,
    page_id: (u32, u16),
    font_res: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    operands: &[Object],
) -> String {
    let Some(Object::Array(items)) = operands.first() else {
        return String::new();
    };
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => {
                combined.push_str(&decode_text(doc, page_id, font_res, fonts, bytes));
            }
            Object::Integer(i) if *i < -100 => combined.push(' '),
            Object::Real(r) if *r < -100.0 => combined.push(' '),
            _ => {}
        }
    }
    combined
}

/// Group spans into baseline lines and emit Delta operations.
fn spans_to_ops(mut spans: Vec<TextSpan>) -> Vec<DeltaOp> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Reading order: top of the page first, then left to right.
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    for span in spans {
        let tolerance = (span.font_size * 0.5).max(2.0);
        match lines.last_mut() {
            Some(line) if (line[0].y - span.y).abs() <= tolerance => line.push(span),
            _ => lines.push(vec![span]),
        }
    }

    let mut delta = Vec::new();
    for mut line in lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let mut emitted = false;
        for span in line {
            // Whitespace-only spans are dropped silently.
            if span.text.trim().is_empty() {
                continue;
            }
            delta.push(DeltaOp::text_with(span.text.clone(), span_attributes(&span)));
            emitted = true;
        }
        if emitted {
            delta.push(DeltaOp::newline(Attributes::default()));
        }
    }
    delta
}

fn span_attributes(span: &TextSpan) -> Attributes {
    let (bold, italic) = classify_font_name(&span.font_name);
    Attributes {
        bold: bold.then_some(true),
        italic: italic.then_some(true),
        font: (!span.font_name.is_empty()).then(|| span.font_name.clone()),
        size: SizeBucket::from_points(span.font_size),
        // Black is the theme default and stays unset.
        color: (!span.color.is_black()).then(|| span.color.css()),
        ..Attributes::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Script;

    fn span(text: &str, x: f32, y: f32, size: f32, font: &str) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            font_size: size,
            font_name: font.to_string(),
            color: Color::BLACK,
        }
    }

    #[test]
    fn test_span_attributes_classification() {
        let attrs = span_attributes(&span("x", 0.0, 0.0, 18.0, "Arial-BoldItalic"));
        assert_eq!(attrs.bold, Some(true));
        assert_eq!(attrs.italic, Some(true));
        assert_eq!(attrs.font.as_deref(), Some("Arial-BoldItalic"));
        assert_eq!(attrs.size, Some(SizeBucket::Large));
        assert_eq!(attrs.color, None);
        assert_eq!(attrs.script, None::<Script>);
    }

    #[test]
    fn test_black_color_is_unset() {
        let mut s = span("x", 0.0, 0.0, 12.0, "Helvetica");
        assert_eq!(span_attributes(&s).color, None);
        s.color = Color::parse("#E53935").unwrap();
        assert_eq!(span_attributes(&s).color.as_deref(), Some("#E53935"));
    }

    #[test]
    fn test_spans_group_into_lines() {
        let ops = spans_to_ops(vec![
            span("world", 50.0, 700.0, 12.0, "Helvetica"),
            span("Hello ", 10.0, 700.5, 12.0, "Helvetica"),
            span("below", 10.0, 680.0, 12.0, "Helvetica"),
        ]);
        let texts: Vec<&str> = ops.iter().filter_map(|op| op.insert.as_text()).collect();
        assert_eq!(texts, vec!["Hello ", "world", "\n", "below", "\n"]);
    }

    #[test]
    fn test_whitespace_spans_dropped() {
        let ops = spans_to_ops(vec![
            span("  ", 10.0, 700.0, 12.0, "Helvetica"),
            span("text", 30.0, 700.0, 12.0, "Helvetica"),
        ]);
        let texts: Vec<&str> = ops.iter().filter_map(|op| op.insert.as_text()).collect();
        assert_eq!(texts, vec!["text", "\n"]);
    }

    #[test]
    fn test_blank_line_emits_nothing() {
        let ops = spans_to_ops(vec![span("   ", 10.0, 700.0, 12.0, "Helvetica")]);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial-Bold"), "Arial-Bold");
        assert_eq!(strip_subset_prefix("Arial-Bold"), "Arial-Bold");
        assert_eq!(strip_subset_prefix("abcdef+Arial"), "abcdef+Arial");
    }

    #[test]
    fn test_not_a_pdf_is_unsupported() {
        let err = PdfExtractor::new().extract(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceFormat(_)));
    }

    #[test]
    fn test_extracts_generated_document() {
        use crate::generate::{DocumentGenerator, GenerateOptions, PdfGenerator};

        let delta: Vec<DeltaOp> = serde_json::from_value(serde_json::json!([
            {"insert": "Heading", "attributes": {"bold": true, "size": "large"}},
            {"insert": "\n"},
            {"insert": "body text\n"}
        ]))
        .unwrap();
        let generated = PdfGenerator::new()
            .generate(&delta, &GenerateOptions::default())
            .unwrap();

        let extraction = PdfExtractor::new().extract(&generated.bytes).unwrap();
        let texts: Vec<&str> = extraction
            .delta
            .iter()
            .filter_map(|op| op.insert.as_text())
            .collect();
        assert!(texts.contains(&"Heading"));
        assert!(texts.contains(&"body text"));

        let heading = extraction
            .delta
            .iter()
            .find(|op| op.insert.as_text() == Some("Heading"))
            .unwrap();
        let attrs = heading.attributes.clone().unwrap();
        assert_eq!(attrs.bold, Some(true));
        assert_eq!(attrs.size, Some(SizeBucket::Large));
        assert_eq!(attrs.font.as_deref(), Some("Helvetica-Bold"));
    }
}
