//! Word-package extraction.
//!
//! Streams `word/document.xml` out of the package and walks body
//! paragraphs in document order. Each run becomes one insert operation
//! carrying its decoded style attributes; each paragraph end becomes a
//! newline operation carrying the paragraph's alignment. Content inside
//! tables is skipped: only body-level paragraphs are walked. Whitespace-only
//! runs are preserved verbatim — blank runs are meaningful row spacing in
//! this format.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::delta::{Alignment, Attributes, DeltaOp};
use crate::error::{Diagnostics, Error, Result};
use crate::style::{Color, Script, SizeBucket};

use super::{DeltaExtractor, Extraction};

/// Word package → Delta extractor.
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor {
    _private: (),
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DeltaExtractor for DocxExtractor {
    fn name(&self) -> &str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::UnsupportedSourceFormat(format!("not a word package: {}", e)))?;
        let mut document_xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|_| {
                Error::UnsupportedSourceFormat("word package has no document part".to_string())
            })?
            .read_to_string(&mut document_xml)
            .map_err(|e| Error::UnsupportedSourceFormat(format!("unreadable document part: {}", e)))?;

        extract_document(&document_xml)
    }
}

/// Attribute lookup by local name, namespace prefix included or not.
fn attr_value(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Toggle properties (`w:b`, `w:i`, ...) are on unless an explicit off
/// value is present.
fn toggle_on(element: &BytesStart) -> bool {
    !matches!(
        attr_value(element, b"val").as_deref(),
        Some("0") | Some("false") | Some("none")
    )
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value {
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "justify" | "both" => Some(Alignment::Justify),
        // left and anything unknown stay unset
        _ => None,
    }
}

fn extract_document(xml: &str) -> Result<Extraction> {
    let mut reader = Reader::from_str(xml);
    // Whitespace inside w:t is significant; no trimming.

    let mut delta = Vec::new();
    let mut diagnostics = Diagnostics::new();

    let mut table_depth = 0usize;
    let mut align: Option<Alignment> = None;
    let mut in_run = false;
    let mut in_run_props = false;
    let mut in_text = false;
    let mut run_text = String::new();
    let mut run_attrs = Attributes::default();
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"tbl" => table_depth += 1,
                    _ if table_depth > 0 => {}
                    b"p" => align = None,
                    b"jc" => {
                        if !in_run {
                            if let Some(val) = attr_value(&e, b"val") {
                                align = parse_alignment(&val);
                            }
                        }
                    }
                    b"r" => {
                        in_run = true;
                        run_text.clear();
                        run_attrs = Attributes::default();
                    }
                    b"rPr" if in_run => in_run_props = true,
                    b"t" if in_run => in_text = true,
                    _ if in_run && in_run_props => {
                        read_run_property(&e, &mut run_attrs, &mut diagnostics)
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_text && table_depth == 0 => {
                run_text.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ if table_depth > 0 => {}
                b"t" => in_text = false,
                b"rPr" => in_run_props = false,
                b"r" => {
                    // Whitespace-only runs are kept; runs with no text at
                    // all (pure field/break runs) are not.
                    if !run_text.is_empty() {
                        delta.push(DeltaOp::text_with(
                            std::mem::take(&mut run_text),
                            run_attrs.clone(),
                        ));
                    }
                    in_run = false;
                }
                b"p" => {
                    delta.push(DeltaOp::newline(Attributes {
                        align,
                        ..Attributes::default()
                    }));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::UnsupportedSourceFormat(format!(
                    "malformed document part: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(Extraction { delta, diagnostics })
}

/// Decode one `w:rPr` child into the run's attribute map.
fn read_run_property(element: &BytesStart, attrs: &mut Attributes, diagnostics: &mut Diagnostics) {
    match element.local_name().as_ref() {
        b"b" => attrs.bold = toggle_on(element).then_some(true),
        b"i" => attrs.italic = toggle_on(element).then_some(true),
        b"strike" => attrs.strike = toggle_on(element).then_some(true),
        b"u" => {
            let off = matches!(attr_value(element, b"val").as_deref(), Some("none"));
            attrs.underline = (!off).then_some(true);
        }
        b"vertAlign" => {
            attrs.script = match attr_value(element, b"val").as_deref() {
                Some("superscript") => Some(Script::Super),
                Some("subscript") => Some(Script::Sub),
                _ => None,
            }
        }
        b"rFonts" => {
            if let Some(font) = attr_value(element, b"ascii") {
                attrs.font = Some(font);
            }
        }
        b"sz" => {
            if let Some(val) = attr_value(element, b"val") {
                if let Ok(half_points) = val.parse::<f32>() {
                    attrs.size = SizeBucket::from_points(half_points / 2.0);
                }
            }
        }
        b"color" => {
            if let Some(val) = attr_value(element, b"val") {
                if val != "auto" {
                    match Color::parse(&val) {
                        Ok(color) => attrs.color = Some(color.css()),
                        Err(e) => diagnostics.record(&e),
                    }
                }
            }
        }
        b"shd" => {
            if let Some(fill) = attr_value(element, b"fill") {
                if fill != "auto" {
                    match Color::parse(&fill) {
                        Ok(color) => attrs.background = Some(color.css()),
                        Err(e) => diagnostics.record(&e),
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::Insert;

    fn extract(body: &str) -> Extraction {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        extract_document(&xml).unwrap()
    }

    #[test]
    fn test_plain_paragraph() {
        let extraction = extract(r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#);
        let delta = extraction.delta;
        assert_eq!(delta.len(), 2);
        assert_eq!(delta[0].insert.as_text(), Some("Hello"));
        assert!(delta[0].attributes.is_none());
        assert_eq!(delta[1].insert.as_text(), Some("\n"));
        assert!(delta[1].attributes.is_none());
    }

    #[test]
    fn test_styled_run() {
        let extraction = extract(
            r#"<w:p><w:r><w:rPr><w:b/><w:i/><w:u w:val="single"/><w:strike/><w:vertAlign w:val="superscript"/><w:sz w:val="36"/><w:rFonts w:ascii="Georgia" w:hAnsi="Georgia"/><w:color w:val="E53935"/></w:rPr><w:t>styled</w:t></w:r></w:p>"#,
        );
        let attrs = extraction.delta[0].attributes.clone().unwrap();
        assert_eq!(attrs.bold, Some(true));
        assert_eq!(attrs.italic, Some(true));
        assert_eq!(attrs.underline, Some(true));
        assert_eq!(attrs.strike, Some(true));
        assert_eq!(attrs.script, Some(Script::Super));
        assert_eq!(attrs.size, Some(SizeBucket::Large));
        assert_eq!(attrs.font.as_deref(), Some("Georgia"));
        assert_eq!(attrs.color.as_deref(), Some("#E53935"));
    }

    #[test]
    fn test_explicitly_off_toggle_yields_no_key() {
        let extraction =
            extract(r#"<w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>x</w:t></w:r></w:p>"#);
        assert!(extraction.delta[0].attributes.is_none());
    }

    #[test]
    fn test_paragraph_alignment_on_newline() {
        let extraction = extract(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>centered</w:t></w:r></w:p>"#,
        );
        assert_eq!(extraction.delta[1].alignment(), Some(Alignment::Center));
        // alignment never rides on the run itself
        assert!(extraction.delta[0].attributes.is_none());
    }

    #[test]
    fn test_both_maps_to_justify() {
        let extraction =
            extract(r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r><w:t>j</w:t></w:r></w:p>"#);
        assert_eq!(extraction.delta[1].alignment(), Some(Alignment::Justify));
    }

    #[test]
    fn test_whitespace_run_preserved() {
        let extraction = extract(
            r#"<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        assert_eq!(extraction.delta[0].insert.as_text(), Some("   "));
        assert_eq!(extraction.delta[1].insert.as_text(), Some("x"));
    }

    #[test]
    fn test_empty_run_skipped() {
        let extraction = extract(r#"<w:p><w:r><w:rPr><w:b/></w:rPr></w:r></w:p>"#);
        assert_eq!(extraction.delta.len(), 1);
        assert_eq!(extraction.delta[0].insert.as_text(), Some("\n"));
    }

    #[test]
    fn test_table_content_skipped() {
        let extraction = extract(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        let texts: Vec<&str> = extraction
            .delta
            .iter()
            .filter_map(|op| op.insert.as_text())
            .collect();
        assert_eq!(texts, vec!["before", "\n", "after", "\n"]);
    }

    #[test]
    fn test_invalid_color_recovered() {
        let extraction = extract(
            r#"<w:p><w:r><w:rPr><w:color w:val="zzz"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        assert!(extraction.delta[0].attributes.is_none());
        assert!(!extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_background_from_shading_fill() {
        let extraction = extract(
            r#"<w:p><w:r><w:rPr><w:shd w:val="clear" w:color="auto" w:fill="FFFF00"/></w:rPr><w:t>hi</w:t></w:r></w:p>"#,
        );
        let attrs = extraction.delta[0].attributes.clone().unwrap();
        assert_eq!(attrs.background.as_deref(), Some("#FFFF00"));
    }

    #[test]
    fn test_entities_unescaped() {
        let extraction = extract(r#"<w:p><w:r><w:t>a &amp; b</w:t></w:r></w:p>"#);
        assert_eq!(extraction.delta[0].insert.as_text(), Some("a & b"));
        assert!(matches!(extraction.delta[0].insert, Insert::Text(_)));
    }

    #[test]
    fn test_not_a_zip_is_unsupported() {
        let err = DocxExtractor::new().extract(b"plainly not a zip").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceFormat(_)));
    }
}
