//! Word-package generation.
//!
//! Builds the OPC zip package directly: WordprocessingML is emitted as
//! escaped XML strings (the document part plus minimal styles, numbering
//! and core-properties parts) and deflated into the archive. List items use
//! real numbering definitions, so ordered ordinals are produced by the word
//! processor's numbering engine; the counter policy decides whether one
//! numbering instance spans the document or each resumed list gets a fresh
//! one.

use std::fmt::Write as _;
use std::io::{Cursor, Write as _};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::delta::{Alignment, DeltaOp, ListKind};
use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::model::{Block, Paragraph, Run, Table};
use crate::style::{Script, SizeBucket};

use super::{BlockAssembler, DocumentGenerator, Generated, GenerateOptions};

/// MIME type of the word-package format.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Numbering instance shared by every bullet item.
const BULLET_NUM_ID: i64 = 1;
/// Numbering instance shared by ordered items under the continuous policy.
const ORDERED_NUM_ID: i64 = 2;

/// Delta → word package generator.
#[derive(Debug, Clone, Default)]
pub struct DocxGenerator {
    _private: (),
}

impl DocxGenerator {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentGenerator for DocxGenerator {
    fn name(&self) -> &str {
        "docx"
    }

    fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    fn generate(&self, ops: &[DeltaOp], options: &GenerateOptions) -> Result<Generated> {
        if ops.is_empty() {
            return Err(Error::MissingInput("delta"));
        }

        let (blocks, diagnostics) = BlockAssembler::assemble(ops, options.numbering);
        let ordered_ids = allocate_ordered_num_ids(&blocks, options);
        let document = document_xml(&blocks, &ordered_ids, &options.geometry);
        let numbering = numbering_xml(&ordered_ids);
        let bytes = write_package(&document, &numbering)?;

        Ok(Generated {
            bytes,
            mime_type: DOCX_MIME,
            diagnostics,
        })
    }
}

/// Per-block numbering instance for ordered items (`None` for everything
/// else). Continuous numbering shares one instance; the restart policy
/// allocates a fresh instance whenever an ordered run resumes, which makes
/// the word processor start that run at 1 again.
fn allocate_ordered_num_ids(blocks: &[Block], options: &GenerateOptions) -> Vec<Option<i64>> {
    use super::ListNumbering;

    let mut ids = Vec::with_capacity(blocks.len());
    let mut next_id = ORDERED_NUM_ID;
    let mut in_ordered_run = false;

    for block in blocks {
        let is_ordered = matches!(
            block,
            Block::Paragraph(p) if p.list.map(|l| l.kind) == Some(ListKind::Ordered)
        );
        if !is_ordered {
            ids.push(None);
            in_ordered_run = false;
            continue;
        }
        match options.numbering {
            ListNumbering::Continuous => ids.push(Some(ORDERED_NUM_ID)),
            ListNumbering::RestartAfterBreak => {
                if !in_ordered_run {
                    next_id += 1;
                }
                ids.push(Some(next_id));
            }
        }
        in_ordered_run = true;
    }
    ids
}

fn document_xml(blocks: &[Block], ordered_ids: &[Option<i64>], geometry: &PageGeometry) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );

    for (block, num_id) in blocks.iter().zip(ordered_ids) {
        match block {
            Block::Paragraph(p) => paragraph_xml(&mut xml, p, *num_id),
            Block::Table(t) => table_xml(&mut xml, t, geometry),
        }
    }

    let (page_w, page_h) = geometry.page_twips();
    let (top, bottom, left, right) = geometry.margins_twips();
    let _ = write!(
        xml,
        r#"<w:sectPr><w:pgSz w:w="{page_w}" w:h="{page_h}"/><w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#
    );

    xml.push_str("</w:body></w:document>");
    xml
}

fn paragraph_xml(xml: &mut String, paragraph: &Paragraph, ordered_num_id: Option<i64>) {
    xml.push_str("<w:p>");

    let num_id = match paragraph.list.map(|l| l.kind) {
        Some(ListKind::Bullet) => Some(BULLET_NUM_ID),
        Some(ListKind::Ordered) => ordered_num_id,
        None => None,
    };
    let jc = match paragraph.alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    };
    if num_id.is_some() || jc.is_some() {
        xml.push_str("<w:pPr>");
        if let Some(id) = num_id {
            let _ = write!(
                xml,
                r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{id}"/></w:numPr>"#
            );
        }
        if let Some(val) = jc {
            let _ = write!(xml, r#"<w:jc w:val="{val}"/>"#);
        }
        xml.push_str("</w:pPr>");
    }

    for run in &paragraph.runs {
        run_xml(xml, run);
    }
    xml.push_str("</w:p>");
}

fn run_xml(xml: &mut String, run: &Run) {
    let style = &run.style;
    xml.push_str("<w:r>");

    if style.has_styling() {
        xml.push_str("<w:rPr>");
        if let Some(font) = &style.font {
            let name = escape(font.as_str());
            let _ = write!(xml, r#"<w:rFonts w:ascii="{name}" w:hAnsi="{name}"/>"#);
        }
        if style.bold {
            xml.push_str("<w:b/>");
        }
        if style.italic {
            xml.push_str("<w:i/>");
        }
        if style.strike {
            xml.push_str("<w:strike/>");
        }
        if style.underline {
            xml.push_str(r#"<w:u w:val="single"/>"#);
        }
        if let Some(script) = style.script {
            let val = match script {
                Script::Super => "superscript",
                Script::Sub => "subscript",
            };
            let _ = write!(xml, r#"<w:vertAlign w:val="{val}"/>"#);
        }
        if let Some(size) = style.size {
            let _ = write!(xml, r#"<w:sz w:val="{}"/>"#, size.half_points());
        }
        if let Some(color) = style.color {
            let _ = write!(xml, r#"<w:color w:val="{}"/>"#, color.hex());
        }
        if let Some(background) = style.background {
            let _ = write!(
                xml,
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                background.hex()
            );
        }
        xml.push_str("</w:rPr>");
    }

    if !run.text.is_empty() {
        let _ = write!(
            xml,
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape(run.text.as_str())
        );
    }
    xml.push_str("</w:r>");
}

fn table_xml(xml: &mut String, table: &Table, geometry: &PageGeometry) {
    if table.is_empty() {
        return;
    }
    let total_width = geometry.content_width_twips();
    let col_width = total_width / table.columns as i64;

    xml.push_str("<w:tbl><w:tblPr>");
    let _ = write!(xml, r#"<w:tblW w:w="{total_width}" w:type="dxa"/>"#);
    xml.push_str("<w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(
            xml,
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
        );
    }
    xml.push_str("</w:tblBorders>");
    xml.push_str(r#"<w:tblLayout w:type="fixed"/></w:tblPr>"#);

    xml.push_str("<w:tblGrid>");
    for _ in 0..table.columns {
        let _ = write!(xml, r#"<w:gridCol w:w="{col_width}"/>"#);
    }
    xml.push_str("</w:tblGrid>");

    for row in &table.rows {
        xml.push_str("<w:tr>");
        for cell in row {
            xml.push_str("<w:tc><w:tcPr>");
            let _ = write!(xml, r#"<w:tcW w:w="{col_width}" w:type="dxa"/>"#);
            xml.push_str(r#"<w:vAlign w:val="center"/></w:tcPr><w:p>"#);
            for run in &cell.runs {
                run_xml(xml, run);
            }
            xml.push_str("</w:p></w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

fn numbering_xml(ordered_ids: &[Option<i64>]) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );

    // Abstract definitions: 0 = bullet, 1 = decimal.
    xml.push_str(
        r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#8226;"/><w:rPr><w:rFonts w:ascii="Symbol" w:hAnsi="Symbol"/></w:rPr><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
    );
    xml.push_str(
        r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
    );

    let _ = write!(
        xml,
        r#"<w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="0"/></w:num>"#
    );

    let mut ids: Vec<i64> = ordered_ids.iter().flatten().copied().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        // Keep the shared instance so documents without ordered lists still
        // carry a complete part.
        ids.push(ORDERED_NUM_ID);
    }
    for id in ids {
        let _ = write!(
            xml,
            r#"<w:num w:numId="{id}"><w:abstractNumId w:val="1"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#
        );
    }

    xml.push_str("</w:numbering>");
    xml
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:rPr><w:sz w:val="24"/></w:rPr></w:style></w:styles>"#
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#
}

fn root_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#
}

fn document_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#
}

fn core_xml() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>deltadoc</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#
    )
}

fn write_package(document: &str, numbering: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", content_types_xml()),
        ("_rels/.rels", root_rels_xml()),
        ("word/document.xml", document),
        ("word/_rels/document.xml.rels", document_rels_xml()),
        ("word/styles.xml", styles_xml()),
        ("word/numbering.xml", numbering),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.start_file("docProps/core.xml", options)?;
    zip.write_all(core_xml().as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Margins;
    use crate::model::{Cell, ListItem};
    use crate::style::RunStyle;

    fn ops(json: serde_json::Value) -> Vec<DeltaOp> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_empty_delta_is_missing_input() {
        let err = DocxGenerator::new()
            .generate(&[], &GenerateOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_run_xml_styles() {
        let mut xml = String::new();
        run_xml(
            &mut xml,
            &Run::new(
                "hi",
                RunStyle {
                    bold: true,
                    underline: true,
                    size: Some(SizeBucket::Large),
                    color: Some(crate::style::Color::parse("#E53935").unwrap()),
                    ..RunStyle::default()
                },
            ),
        );
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:u w:val="single"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="36"/>"#));
        assert!(xml.contains(r#"<w:color w:val="E53935"/>"#));
        assert!(xml.contains(r#"<w:t xml:space="preserve">hi</w:t>"#));
    }

    #[test]
    fn test_run_xml_escapes_text() {
        let mut xml = String::new();
        run_xml(&mut xml, &Run::plain("a < b & c"));
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(!xml.contains("<w:rPr>"));
    }

    #[test]
    fn test_paragraph_alignment_and_numbering() {
        let mut xml = String::new();
        paragraph_xml(
            &mut xml,
            &Paragraph {
                runs: vec![Run::plain("x")],
                alignment: Alignment::Justify,
                list: Some(ListItem::ordered(1)),
            },
            Some(ORDERED_NUM_ID),
        );
        assert!(xml.contains(r#"<w:jc w:val="both"/>"#));
        assert!(xml.contains(r#"<w:numId w:val="2"/>"#));
    }

    #[test]
    fn test_left_paragraph_has_no_ppr() {
        let mut xml = String::new();
        paragraph_xml(
            &mut xml,
            &Paragraph {
                runs: vec![Run::plain("x")],
                ..Paragraph::default()
            },
            None,
        );
        assert!(!xml.contains("<w:pPr>"));
    }

    #[test]
    fn test_table_xml_is_rectangular_with_borders() {
        let mut table = Table::new(2);
        table.push_row(vec![Cell::new(vec![Run::plain("a")])]);
        let mut xml = String::new();
        table_xml(&mut xml, &table, &PageGeometry::default());
        assert_eq!(xml.matches("<w:gridCol").count(), 2);
        assert_eq!(xml.matches("<w:tc>").count(), 2);
        assert!(xml.contains(r#"<w:insideV w:val="single""#));
        assert!(xml.contains(r#"<w:vAlign w:val="center"/>"#));
        assert!(xml.contains('\u{00A0}'));
    }

    #[test]
    fn test_section_geometry_in_twips() {
        let geometry = PageGeometry::resolve(Some("a4"), Some(Margins::uniform(20.0)));
        let xml = document_xml(&[], &[], &geometry);
        assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
        assert!(xml.contains(r#"w:top="1134""#));
    }

    #[test]
    fn test_continuous_numbering_shares_one_instance() {
        let (blocks, _) = BlockAssembler::assemble(
            &ops(serde_json::json!([
                {"insert": "a\n", "attributes": {"list": "ordered"}},
                {"insert": "x\n"},
                {"insert": "b\n", "attributes": {"list": "ordered"}}
            ])),
            super::super::ListNumbering::Continuous,
        );
        let options = GenerateOptions::default();
        let ids = allocate_ordered_num_ids(&blocks, &options);
        assert_eq!(ids, vec![Some(2), None, Some(2)]);
    }

    #[test]
    fn test_restart_numbering_allocates_fresh_instances() {
        let options =
            GenerateOptions::default().with_numbering(super::super::ListNumbering::RestartAfterBreak);
        let (blocks, _) = BlockAssembler::assemble(
            &ops(serde_json::json!([
                {"insert": "a\n", "attributes": {"list": "ordered"}},
                {"insert": "b\n", "attributes": {"list": "ordered"}},
                {"insert": "x\n"},
                {"insert": "c\n", "attributes": {"list": "ordered"}}
            ])),
            options.numbering,
        );
        let ids = allocate_ordered_num_ids(&blocks, &options);
        assert_eq!(ids, vec![Some(3), Some(3), None, Some(4)]);

        let numbering = numbering_xml(&ids);
        assert!(numbering.contains(r#"<w:num w:numId="3">"#));
        assert!(numbering.contains(r#"<w:num w:numId="4">"#));
        assert!(numbering.contains("<w:startOverride w:val=\"1\"/>"));
    }

    #[test]
    fn test_generated_package_contains_parts() {
        let result = DocxGenerator::new()
            .generate(
                &ops(serde_json::json!([
                    {"insert": "Hello\n", "attributes": {"bold": true, "align": "center"}}
                ])),
                &GenerateOptions::default(),
            )
            .unwrap();
        assert_eq!(result.mime_type, DOCX_MIME);

        let mut archive = zip::ZipArchive::new(Cursor::new(result.bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"word/document.xml".to_string()));
        assert!(names.contains(&"word/numbering.xml".to_string()));
        assert!(names.contains(&"[Content_Types].xml".to_string()));

        use std::io::Read as _;
        let mut doc = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut doc)
            .unwrap();
        assert!(doc.contains(r#"<w:jc w:val="center"/>"#));
        assert!(doc.contains("<w:b/>"));
        assert!(doc.contains("Hello"));
    }
}
