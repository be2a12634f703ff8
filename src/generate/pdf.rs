//! Page-layout generation.
//!
//! Builds the PDF object tree with lopdf: a pages tree over per-page
//! content streams, the base-14 Helvetica faces as shared font resources,
//! and an Info dictionary. Layout is a single downward cursor: runs are
//! wrapped greedily against the content width using an estimated Helvetica
//! advance, blocks that do not fit open a new page, and tables are drawn as
//! stroked grids with evenly distributed column widths.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};

use crate::delta::{Alignment, DeltaOp};
use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::model::{Block, Cell, ListItem, Paragraph, Run};
use crate::style::{RunStyle, Script, SizeBucket};

use super::{BlockAssembler, DocumentGenerator, Generated, GenerateOptions};

/// MIME type of the page-layout format.
pub const PDF_MIME: &str = "application/pdf";

const LEADING: f32 = 1.4;
const LIST_INDENT: f32 = 18.0;
const TABLE_ROW_HEIGHT: f32 = 22.0;
const CELL_PADDING: f32 = 3.0;

/// Delta → page-layout generator.
#[derive(Debug, Clone, Default)]
pub struct PdfGenerator {
    _private: (),
}

impl PdfGenerator {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentGenerator for PdfGenerator {
    fn name(&self) -> &str {
        "pdf"
    }

    fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    fn generate(&self, ops: &[DeltaOp], options: &GenerateOptions) -> Result<Generated> {
        if ops.is_empty() {
            return Err(Error::MissingInput("delta"));
        }

        let (blocks, diagnostics) = BlockAssembler::assemble(ops, options.numbering);
        let mut layout = PageLayout::new(&options.geometry);
        for block in &blocks {
            match block {
                Block::Paragraph(p) => layout.paragraph(p),
                Block::Table(t) => layout.table(t),
            }
        }
        let bytes = write_document(layout.into_pages(), options.geometry.page_points())?;

        Ok(Generated {
            bytes,
            mime_type: PDF_MIME,
            diagnostics,
        })
    }
}

/// Resource name of the Helvetica face matching a style.
fn font_resource(style: &RunStyle) -> &'static str {
    match (style.bold, style.italic) {
        (false, false) => "F1",
        (true, false) => "F2",
        (false, true) => "F3",
        (true, true) => "F4",
    }
}

/// Effective font size of a run: bucket-mapped, scaled down for
/// super/subscript.
fn font_size(style: &RunStyle) -> f32 {
    let size = SizeBucket::points_or_normal(style.size);
    if style.script.is_some() {
        size * 0.65
    } else {
        size
    }
}

/// Baseline rise for super/subscript.
fn baseline_rise(style: &RunStyle) -> f32 {
    let base = SizeBucket::points_or_normal(style.size);
    match style.script {
        Some(Script::Super) => base * 0.35,
        Some(Script::Sub) => -base * 0.15,
        None => 0.0,
    }
}

/// Estimated advance of one character, as a fraction of the font size.
/// Helvetica metrics, coarsely binned; enough to place wrapped and aligned
/// text within a few points.
fn glyph_width_factor(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '!' | '|' | '\'' | '`' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '/' | '\\' | ' ' | '\u{00A0}' => 0.35,
        'm' | 'M' | 'W' | '@' => 0.85,
        'w' | 'A'..='Z' | '0'..='9' | '%' | '&' => 0.67,
        _ => 0.52,
    }
}

/// Estimated width of a string at a given size.
fn text_width(text: &str, style: &RunStyle) -> f32 {
    let size = font_size(style);
    let factor: f32 = text.chars().map(glyph_width_factor).sum();
    let weight = if style.bold { 1.05 } else { 1.0 };
    factor * size * weight
}

/// Encode text for the WinAnsi-encoded base fonts. Characters outside the
/// encoding degrade to `?` rather than failing the conversion.
fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2026}' => 0x85,
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// A wrapped fragment: text sharing one style on one line.
#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    style: RunStyle,
    width: f32,
}

/// One laid-out line.
#[derive(Debug, Clone, Default)]
struct Line {
    fragments: Vec<Fragment>,
    width: f32,
    /// Dominant font size, for leading.
    size: f32,
}

impl Line {
    fn push(&mut self, text: &str, style: &RunStyle) {
        let width = text_width(text, style);
        self.width += width;
        self.size = self.size.max(font_size(style));
        // Merge into the previous fragment when the style matches, keeping
        // the content stream small.
        if let Some(last) = self.fragments.last_mut() {
            if last.style == *style {
                last.text.push_str(text);
                last.width += width;
                return;
            }
        }
        self.fragments.push(Fragment {
            text: text.to_string(),
            style: style.clone(),
            width,
        });
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Greedy word wrap of a paragraph's runs against an available width.
fn wrap_runs(runs: &[Run], available: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for run in runs {
        for word in run.text.split_inclusive(' ') {
            let width = text_width(word, &run.style);
            if !current.is_empty() && current.width + width > available {
                lines.push(std::mem::take(&mut current));
            }
            current.push(word, &run.style);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Accumulates content-stream operations, breaking pages at the bottom
/// margin.
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Top of the unused area on the current page.
    y: f32,
    page_width: f32,
    page_height: f32,
    top: f32,
    bottom: f32,
    left: f32,
    right: f32,
}

impl PageLayout {
    fn new(geometry: &PageGeometry) -> PageLayout {
        let (w, h) = geometry.page_points();
        let (top, bottom, left, right) = geometry.margins_points();
        let mut layout = PageLayout {
            pages: Vec::new(),
            current: Vec::new(),
            y: 0.0,
            page_width: w as f32,
            page_height: h as f32,
            top: top as f32,
            bottom: bottom as f32,
            left: left as f32,
            right: right as f32,
        };
        layout.y = layout.page_height - layout.top;
        layout
    }

    fn content_width(&self) -> f32 {
        self.page_width - self.left - self.right
    }

    fn into_pages(mut self) -> Vec<Vec<Operation>> {
        // Always emit at least one page, even for a document of blank
        // paragraphs.
        self.pages.push(std::mem::take(&mut self.current));
        self.pages
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.page_height - self.top;
    }

    /// Reserve vertical room, breaking the page if it does not fit.
    fn ensure_room(&mut self, height: f32) {
        if self.y - height < self.bottom && self.y < self.page_height - self.top {
            self.break_page();
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let indent = if paragraph.list.is_some() {
            LIST_INDENT
        } else {
            0.0
        };
        let available = self.content_width() - indent;
        let lines = wrap_runs(&paragraph.runs, available);

        if lines.is_empty() {
            // A blank line still consumes a text row.
            let advance = 12.0 * LEADING;
            self.ensure_room(advance);
            self.y -= advance;
            return;
        }

        for (i, line) in lines.iter().enumerate() {
            let advance = line.size * LEADING;
            self.ensure_room(advance);
            let baseline = self.y - line.size;

            if i == 0 {
                if let Some(item) = paragraph.list {
                    self.list_marker(&item, baseline);
                }
            }

            let x = match paragraph.alignment {
                Alignment::Left | Alignment::Justify => self.left + indent,
                Alignment::Center => self.left + indent + (available - line.width).max(0.0) / 2.0,
                Alignment::Right => self.page_width - self.right - line.width,
            };
            self.line(line, x, baseline);
            self.y = baseline - line.size * (LEADING - 1.0);
        }
    }

    fn list_marker(&mut self, item: &ListItem, baseline: f32) {
        let marker = match item.number {
            Some(n) => format!("{}.", n),
            None => "\u{2022}".to_string(),
        };
        let style = RunStyle::default();
        self.text_fragment(&marker, &style, self.left, baseline);
    }

    fn line(&mut self, line: &Line, x: f32, baseline: f32) {
        let mut cursor = x;
        for fragment in &line.fragments {
            self.fragment(fragment, cursor, baseline);
            cursor += fragment.width;
        }
    }

    fn fragment(&mut self, fragment: &Fragment, x: f32, baseline: f32) {
        let style = &fragment.style;
        let size = font_size(style);

        if let Some(background) = style.background {
            let (r, g, b) = background.rgb_components();
            self.current.push(Operation::new(
                "rg",
                vec![Object::Real(r), Object::Real(g), Object::Real(b)],
            ));
            self.current.push(Operation::new(
                "re",
                vec![
                    Object::Real(x),
                    Object::Real(baseline - size * 0.25),
                    Object::Real(fragment.width),
                    Object::Real(size * 1.2),
                ],
            ));
            self.current.push(Operation::new("f", vec![]));
        }

        self.text_fragment(&fragment.text, style, x, baseline);

        let color = style.color.unwrap_or(crate::style::Color::BLACK);
        let (r, g, b) = color.rgb_components();
        let mut rule = |line_y: f32| {
            self.current.push(Operation::new(
                "RG",
                vec![Object::Real(r), Object::Real(g), Object::Real(b)],
            ));
            self.current
                .push(Operation::new("w", vec![Object::Real(size * 0.06)]));
            self.current.push(Operation::new(
                "m",
                vec![Object::Real(x), Object::Real(line_y)],
            ));
            self.current.push(Operation::new(
                "l",
                vec![Object::Real(x + fragment.width), Object::Real(line_y)],
            ));
            self.current.push(Operation::new("S", vec![]));
        };
        if style.underline {
            rule(baseline - size * 0.15);
        }
        if style.strike {
            rule(baseline + size * 0.28);
        }
    }

    fn text_fragment(&mut self, text: &str, style: &RunStyle, x: f32, baseline: f32) {
        let size = font_size(style);
        let color = style.color.unwrap_or(crate::style::Color::BLACK);
        let (r, g, b) = color.rgb_components();
        let rise = baseline_rise(style);

        self.current.push(Operation::new("BT", vec![]));
        self.current.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font_resource(style).as_bytes().to_vec()),
                Object::Real(size),
            ],
        ));
        self.current.push(Operation::new(
            "rg",
            vec![Object::Real(r), Object::Real(g), Object::Real(b)],
        ));
        if rise != 0.0 {
            self.current
                .push(Operation::new("Ts", vec![Object::Real(rise)]));
        }
        self.current.push(Operation::new(
            "Td",
            vec![Object::Real(x), Object::Real(baseline)],
        ));
        self.current.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_winansi(text),
                lopdf::StringFormat::Literal,
            )],
        ));
        self.current.push(Operation::new("ET", vec![]));
    }

    fn table(&mut self, table: &crate::model::Table) {
        if table.is_empty() {
            return;
        }
        let col_width = self.content_width() / table.columns as f32;

        for row in &table.rows {
            self.ensure_room(TABLE_ROW_HEIGHT);
            let top = self.y;
            let bottom = top - TABLE_ROW_HEIGHT;

            for (j, cell) in row.iter().enumerate() {
                let x = self.left + j as f32 * col_width;
                self.cell_border(x, bottom, col_width);
                self.cell_text(cell, x, bottom, col_width);
            }
            self.y = bottom;
        }
    }

    fn cell_border(&mut self, x: f32, bottom: f32, width: f32) {
        self.current.push(Operation::new(
            "RG",
            vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
        ));
        self.current
            .push(Operation::new("w", vec![Object::Real(0.75)]));
        self.current.push(Operation::new(
            "re",
            vec![
                Object::Real(x),
                Object::Real(bottom),
                Object::Real(width),
                Object::Real(TABLE_ROW_HEIGHT),
            ],
        ));
        self.current.push(Operation::new("S", vec![]));
    }

    /// Cell text, middle-aligned vertically, clipped to one line.
    fn cell_text(&mut self, cell: &Cell, x: f32, bottom: f32, width: f32) {
        let mut cursor = x + CELL_PADDING;
        let limit = x + width - CELL_PADDING;
        for run in &cell.runs {
            let size = font_size(&run.style);
            let baseline = bottom + (TABLE_ROW_HEIGHT - size) / 2.0 + size * 0.12;
            let advance = text_width(&run.text, &run.style);
            if cursor >= limit {
                break;
            }
            self.text_fragment(&run.text, &run.style, cursor, baseline);
            cursor += advance;
        }
    }
}

/// Assemble the object tree and serialize.
fn write_document(pages: Vec<Vec<Operation>>, page_box: (f64, f64)) -> Result<Vec<u8>> {
    let (width, height) = page_box;
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let faces = [
        ("F1", "Helvetica"),
        ("F2", "Helvetica-Bold"),
        ("F3", "Helvetica-Oblique"),
        ("F4", "Helvetica-BoldOblique"),
    ];
    let mut font_dict = lopdf::Dictionary::new();
    for (resource, base_font) in faces {
        let font_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Font".to_vec()),
            "Subtype" => Object::Name(b"Type1".to_vec()),
            "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
        });
        font_dict.set(resource, Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => Object::Dictionary(font_dict),
    });

    let page_count = pages.len() as i64;
    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let data = content
            .encode()
            .map_err(|e| Error::ConversionFailed(e.to_string()))?;
        let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, data)));
        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ]),
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(page_count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    let creation_date = format!("D:{}Z", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("deltadoc"),
        "CreationDate" => Object::string_literal(creation_date),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut std::io::Cursor::new(&mut bytes))?;
    Ok(bytes)
}
