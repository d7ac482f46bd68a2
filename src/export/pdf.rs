// src/export/pdf.rs
//! Single-page A4 PDF rendering of editor HTML.
//!
//! The fragment is flattened into text blocks, laid out at 2x device units
//! inside the 20 mm margins, and drawn through a 0.5 scale transform under a
//! clip rectangle. Lines that start below the bottom margin are dropped, so
//! overflowing content is clipped to the one page.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::{debug, info};

use crate::editor::document::{Element, Fragment, Node};
use crate::error::ExportError;
use crate::template_system::TemplateStyle;

pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;
/// 20 mm
pub const MARGIN_PT: f32 = 56.69;
const SCALE: f32 = 2.0;
const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
const LIST_INDENT_PT: f32 = 18.0;
const LINK_COLOR: [f32; 3] = [0.11, 0.31, 0.85];

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, style: &TemplateStyle) -> Result<Vec<u8>, ExportError>;
}

/// Vector renderer built on lopdf's standard Type1 fonts
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfRenderer;

#[async_trait]
impl PdfRenderer for LopdfRenderer {
    async fn render(&self, html: &str, style: &TemplateStyle) -> Result<Vec<u8>, ExportError> {
        let html = html.to_string();
        let style = style.clone();
        tokio::task::spawn_blocking(move || render_page(&html, &style))
            .await
            .map_err(|e| ExportError::Aborted(e.to_string()))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Sans,
    Serif,
    Mono,
}

impl Family {
    fn from_css(css: &str) -> Self {
        let lower = css.to_lowercase();
        if lower.contains("mono") || lower.contains("courier") {
            Family::Mono
        } else if lower.contains("sans")
            || lower.contains("arial")
            || lower.contains("helvetica")
            || lower.contains("verdana")
        {
            Family::Sans
        } else if lower.contains("serif") || lower.contains("times") || lower.contains("georgia") {
            Family::Serif
        } else {
            Family::Sans
        }
    }

    fn index(self) -> usize {
        match self {
            Family::Sans => 0,
            Family::Serif => 1,
            Family::Mono => 2,
        }
    }
}

const FONT_NAMES: [[&str; 4]; 3] = [
    ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique", "Helvetica-BoldOblique"],
    ["Times-Roman", "Times-Bold", "Times-Italic", "Times-BoldItalic"],
    ["Courier", "Courier-Bold", "Courier-Oblique", "Courier-BoldOblique"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "left" | "justify" | "start" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RunStyle {
    family: Family,
    bold: bool,
    italic: bool,
    underline: bool,
    size_pt: f32,
    color: [f32; 3],
}

impl RunStyle {
    fn font_key(&self) -> String {
        format!("F{}", self.family.index() * 4 + self.variant() + 1)
    }

    fn variant(&self) -> usize {
        match (self.bold, self.italic) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| char_width_em(c, self.family, self.bold))
            .sum::<f32>()
            * self.size_pt
    }

    /// Apply inline CSS declarations and legacy font attributes
    fn apply_element(&mut self, el: &Element) {
        if let Some(color) = el.attr("color").and_then(parse_color) {
            self.color = color;
        }
        if let Some(face) = el.attr("face") {
            self.family = Family::from_css(face);
        }
        if let Some(style) = el.attr("style") {
            for (property, value) in crate::editor::document::parse_style(style) {
                match property.as_str() {
                    "font-size" => {
                        if let Some(size) = parse_length_pt(&value, self.size_pt) {
                            self.size_pt = size;
                        }
                    }
                    "color" => {
                        if let Some(color) = parse_color(&value) {
                            self.color = color;
                        }
                    }
                    "font-family" => self.family = Family::from_css(&value),
                    "font-weight" => self.bold = value == "bold" || value.parse::<u16>().is_ok_and(|w| w >= 600),
                    "font-style" => self.italic = value == "italic" || value == "oblique",
                    "text-decoration" => self.underline = value.contains("underline"),
                    _ => {}
                }
            }
        }
    }
}

/// Approximate advance widths, in em
fn char_width_em(c: char, family: Family, bold: bool) -> f32 {
    if family == Family::Mono {
        return 0.6;
    }
    let base = match c {
        ' ' => 0.28,
        'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '!' | '\'' | '|' | 'í' | 'ì' | 'î' | 'ï' => 0.24,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '’' => 0.34,
        'm' | 'w' | 'M' | 'W' | '—' | 'Œ' | 'œ' | 'æ' => 0.84,
        '0'..='9' => 0.56,
        c if c.is_uppercase() => 0.68,
        _ => 0.52,
    };
    let base = if family == Family::Serif { base * 0.92 } else { base };
    if bold {
        base * 1.06
    } else {
        base
    }
}

fn parse_length_pt(value: &str, current_pt: f32) -> Option<f32> {
    let value = value.trim();
    let (number, factor) = if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 0.75)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, current_pt)
    } else {
        (value, 1.0)
    };
    number
        .trim()
        .parse::<f32>()
        .ok()
        .map(|n| n * factor)
        .filter(|size| *size > 0.0)
}

fn parse_color(value: &str) -> Option<[f32; 3]> {
    let value = value.trim().to_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        return match hex.len() {
            3 => {
                let expanded: Vec<String> = hex.chars().map(|c| format!("{}{}", c, c)).collect();
                Some([
                    channel(&expanded[0])?,
                    channel(&expanded[1])?,
                    channel(&expanded[2])?,
                ])
            }
            6 => Some([
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            ]),
            _ => None,
        };
    }
    if let Some(args) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<f32> = args
            .split(',')
            .filter_map(|p| p.trim().parse::<f32>().ok())
            .collect();
        return match parts.as_slice() {
            [r, g, b] => Some([r / 255.0, g / 255.0, b / 255.0]),
            _ => None,
        };
    }
    match value.as_str() {
        "black" => Some([0.0, 0.0, 0.0]),
        "white" => Some([1.0, 1.0, 1.0]),
        "red" => Some([1.0, 0.0, 0.0]),
        "green" => Some([0.0, 0.5, 0.0]),
        "blue" => Some([0.0, 0.0, 1.0]),
        "gray" | "grey" => Some([0.5, 0.5, 0.5]),
        _ => None,
    }
}

/// Map a char to its WinAnsi (cp1252) byte
fn win_ansi_byte(c: char) -> u8 {
    match c as u32 {
        0x20..=0x7E => c as u8,
        0xA0..=0xFF => c as u32 as u8,
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String, RunStyle),
    Break,
}

#[derive(Debug)]
struct Block {
    pieces: Vec<Piece>,
    align: Align,
    indent_pt: f32,
    marker: Option<(String, RunStyle)>,
    space_after_pt: f32,
}

#[derive(Debug, Clone)]
struct Context {
    style: RunStyle,
    align: Align,
    indent_pt: f32,
}

struct ListState {
    ordered: bool,
    next: u32,
}

/// Flattens the fragment into a sequence of text blocks
struct BlockCollector {
    blocks: Vec<Block>,
    pending: Vec<Piece>,
    marker: Option<(String, RunStyle)>,
    lists: Vec<ListState>,
}

impl BlockCollector {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            pending: Vec::new(),
            marker: None,
            lists: Vec::new(),
        }
    }

    fn collect(&mut self, nodes: &[Node], ctx: &Context) {
        for node in nodes {
            match node {
                Node::Text(text) => self.push_text(text, &ctx.style),
                Node::Element(el) => self.collect_element(el, ctx),
            }
        }
    }

    fn collect_element(&mut self, el: &Element, ctx: &Context) {
        match el.tag.as_str() {
            "script" | "style" | "head" | "title" | "meta" | "link" => {}
            "br" => self.pending.push(Piece::Break),
            "img" => {
                let mut style = ctx.style.clone();
                style.italic = true;
                let alt = el.attr("alt").unwrap_or("Image");
                self.push_text(&format!("[{}]", alt), &style);
            }
            "ul" | "ol" => {
                self.flush(ctx);
                self.lists.push(ListState {
                    ordered: el.tag == "ol",
                    next: 1,
                });
                let mut inner = block_context(el, ctx);
                inner.indent_pt += LIST_INDENT_PT;
                self.collect(&el.children, &inner);
                self.lists.pop();
                self.flush(ctx);
            }
            "li" => {
                self.flush(ctx);
                let inner = block_context(el, ctx);
                let marker = match self.lists.last_mut() {
                    Some(list) if list.ordered => {
                        let label = format!("{}.", list.next);
                        list.next += 1;
                        label
                    }
                    _ => "•".to_string(),
                };
                self.marker = Some((marker, inner.style.clone()));
                self.collect(&el.children, &inner);
                self.flush(&inner);
            }
            _ if el.is_block() => {
                self.flush(ctx);
                let inner = block_context(el, ctx);
                self.collect(&el.children, &inner);
                self.flush(&inner);
            }
            _ => {
                let inner = inline_context(el, ctx);
                self.collect(&el.children, &inner);
            }
        }
    }

    fn push_text(&mut self, text: &str, style: &RunStyle) {
        let mut collapsed = String::with_capacity(text.len());
        let mut last_space = false;
        for c in text.chars() {
            if c.is_whitespace() {
                if !last_space {
                    collapsed.push(' ');
                }
                last_space = true;
            } else {
                collapsed.push(c);
                last_space = false;
            }
        }
        if !collapsed.is_empty() {
            self.pending.push(Piece::Text(collapsed, style.clone()));
        }
    }

    fn flush(&mut self, ctx: &Context) {
        let has_content = self.pending.iter().any(|p| match p {
            Piece::Text(text, _) => !text.trim().is_empty(),
            Piece::Break => true,
        });
        if !has_content {
            self.pending.clear();
            return;
        }

        self.blocks.push(Block {
            pieces: std::mem::take(&mut self.pending),
            align: ctx.align,
            indent_pt: ctx.indent_pt,
            marker: self.marker.take(),
            space_after_pt: ctx.style.size_pt * 0.6,
        });
    }

    fn finish(mut self, ctx: &Context) -> Vec<Block> {
        self.flush(ctx);
        self.blocks
    }
}

fn heading_scale(tag: &str) -> Option<f32> {
    match tag {
        "h1" => Some(2.0),
        "h2" => Some(1.5),
        "h3" => Some(1.17),
        "h4" => Some(1.0),
        "h5" => Some(0.83),
        "h6" => Some(0.67),
        _ => None,
    }
}

fn block_context(el: &Element, parent: &Context) -> Context {
    let mut ctx = parent.clone();
    if let Some(scale) = heading_scale(&el.tag) {
        ctx.style.size_pt *= scale;
        ctx.style.bold = true;
    }
    if el.tag == "blockquote" {
        ctx.indent_pt += LIST_INDENT_PT;
    }
    ctx.style.apply_element(el);
    if let Some(align) = el
        .style_property("text-align")
        .as_deref()
        .or(el.attr("align"))
        .and_then(Align::parse)
    {
        ctx.align = align;
    }
    ctx
}

fn inline_context(el: &Element, parent: &Context) -> Context {
    let mut ctx = parent.clone();
    match el.tag.as_str() {
        "b" | "strong" => ctx.style.bold = true,
        "i" | "em" => ctx.style.italic = true,
        "u" | "ins" => ctx.style.underline = true,
        "a" => {
            ctx.style.underline = true;
            ctx.style.color = LINK_COLOR;
        }
        _ => {}
    }
    ctx.style.apply_element(el);
    ctx
}

#[derive(Debug)]
struct LineItem {
    text: String,
    style: RunStyle,
    width_pt: f32,
}

#[derive(Debug, Default)]
struct Line {
    items: Vec<LineItem>,
    width_pt: f32,
}

impl Line {
    fn push(&mut self, text: &str, style: &RunStyle) {
        let width = style.text_width(text);
        self.width_pt += width;
        match self.items.last_mut() {
            Some(last) if last.style == *style => {
                last.text.push_str(text);
                last.width_pt += width;
            }
            _ => self.items.push(LineItem {
                text: text.to_string(),
                style: style.clone(),
                width_pt: width,
            }),
        }
    }

    fn trim_end(&mut self) {
        if let Some(last) = self.items.last_mut() {
            let trimmed = last.text.trim_end().to_string();
            let removed = last.width_pt - last.style.text_width(&trimmed);
            last.text = trimmed;
            last.width_pt -= removed;
            self.width_pt -= removed;
        }
    }

    fn height_pt(&self, base: &RunStyle, line_height: f32) -> f32 {
        self.max_size(base) * line_height
    }

    fn max_size(&self, base: &RunStyle) -> f32 {
        self.items
            .iter()
            .map(|i| i.style.size_pt)
            .fold(0.0_f32, f32::max)
            .max(if self.items.is_empty() { base.size_pt } else { 0.0 })
    }
}

/// Greedy word wrap of a block into lines fitting `width_pt`
fn wrap_block(block: &Block, width_pt: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for piece in &block.pieces {
        match piece {
            Piece::Break => {
                line.trim_end();
                lines.push(std::mem::take(&mut line));
            }
            Piece::Text(text, style) => {
                for chunk in text.split_inclusive(' ') {
                    if line.items.is_empty() && chunk.trim().is_empty() {
                        continue;
                    }
                    let word_width = style.text_width(chunk.trim_end());
                    if !line.items.is_empty() && line.width_pt + word_width > width_pt {
                        line.trim_end();
                        lines.push(std::mem::take(&mut line));
                        if chunk.trim().is_empty() {
                            continue;
                        }
                    }
                    line.push(chunk, style);
                }
            }
        }
    }

    line.trim_end();
    if !line.items.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn real(value: f32) -> Object {
    value.into()
}

fn set_fill(color: [f32; 3]) -> Operation {
    op("rg", vec![real(color[0]), real(color[1]), real(color[2])])
}

/// Build the page content stream; returns the operations and the number of clipped lines
fn layout_operations(html: &str, template: &TemplateStyle) -> (Vec<Operation>, usize) {
    let base = RunStyle {
        family: Family::from_css(&template.font_family),
        bold: false,
        italic: false,
        underline: false,
        size_pt: template.font_size_pt,
        color: parse_color(&template.color).unwrap_or([0.0, 0.0, 0.0]),
    };
    let root = Context {
        style: base.clone(),
        align: Align::Left,
        indent_pt: 0.0,
    };

    let fragment = Fragment::parse(html);
    let mut collector = BlockCollector::new();
    collector.collect(fragment.nodes(), &root);
    let blocks = collector.finish(&root);

    let page_height = PAGE_HEIGHT_PT * SCALE;
    let left = MARGIN_PT * SCALE;
    let top = MARGIN_PT * SCALE;
    let bottom = (PAGE_HEIGHT_PT - MARGIN_PT) * SCALE;

    let mut ops = vec![
        op("q", vec![]),
        op(
            "cm",
            vec![real(0.5), real(0.0), real(0.0), real(0.5), real(0.0), real(0.0)],
        ),
        op(
            "re",
            vec![
                real(left),
                real(MARGIN_PT * SCALE),
                real(CONTENT_WIDTH_PT * SCALE),
                real((PAGE_HEIGHT_PT - 2.0 * MARGIN_PT) * SCALE),
            ],
        ),
        op("W", vec![]),
        op("n", vec![]),
    ];

    let mut y = top;
    let mut clipped = 0;

    for block in &blocks {
        let available_pt = CONTENT_WIDTH_PT - block.indent_pt;
        let lines = wrap_block(block, available_pt);

        for (index, line) in lines.iter().enumerate() {
            if y >= bottom {
                clipped += 1;
                continue;
            }

            let max_size = line.max_size(&base);
            let height = line.height_pt(&base, template.line_height) * SCALE;
            let baseline = y + (height - max_size * SCALE) / 2.0 + max_size * SCALE * 0.8;
            let pdf_y = page_height - baseline;

            let line_left = left + block.indent_pt * SCALE;
            let slack = (available_pt - line.width_pt).max(0.0) * SCALE;
            let mut x = match block.align {
                Align::Left => line_left,
                Align::Center => line_left + slack / 2.0,
                Align::Right => line_left + slack,
            };

            if index == 0 {
                if let Some((marker, style)) = &block.marker {
                    let marker_x = line_left - (LIST_INDENT_PT - 4.0) * SCALE;
                    push_text_ops(&mut ops, marker, style, marker_x, pdf_y);
                }
            }

            for item in &line.items {
                push_text_ops(&mut ops, &item.text, &item.style, x, pdf_y);
                if item.style.underline && !item.text.trim().is_empty() {
                    ops.push(set_fill(item.style.color));
                    ops.push(op(
                        "re",
                        vec![
                            real(x),
                            real(pdf_y - item.style.size_pt * 0.15 * SCALE),
                            real(item.width_pt * SCALE),
                            real((item.style.size_pt * 0.06).max(0.5) * SCALE),
                        ],
                    ));
                    ops.push(op("f", vec![]));
                }
                x += item.width_pt * SCALE;
            }

            y += height;
        }

        y += block.space_after_pt * SCALE;
    }

    ops.push(op("Q", vec![]));
    (ops, clipped)
}

fn push_text_ops(ops: &mut Vec<Operation>, text: &str, style: &RunStyle, x: f32, y: f32) {
    if text.is_empty() {
        return;
    }
    ops.push(op("BT", vec![]));
    ops.push(set_fill(style.color));
    ops.push(op(
        "Tf",
        vec![
            Object::Name(style.font_key().into_bytes()),
            real(style.size_pt * SCALE),
        ],
    ));
    ops.push(op("Td", vec![real(x), real(y)]));
    ops.push(op(
        "Tj",
        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(op("ET", vec![]));
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let mut fonts = Dictionary::new();
    for (family_index, names) in FONT_NAMES.iter().enumerate() {
        for (variant, base_font) in names.iter().enumerate() {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *base_font,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(format!("F{}", family_index * 4 + variant + 1), font_id);
        }
    }
    fonts
}

/// Lay out `html` on one A4 page and serialize the PDF
pub fn render_page(html: &str, style: &TemplateStyle) -> Result<Vec<u8>, ExportError> {
    let (operations, clipped) = layout_operations(html, style);
    if clipped > 0 {
        info!("Content exceeds one page, {} lines clipped", clipped);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fonts = font_resources(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| ExportError::Render(format!("content stream: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH_PT), real(PAGE_HEIGHT_PT)],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ExportError::Render(format!("serialization: {}", e)))?;

    debug!("Rendered PDF ({} bytes)", buffer.len());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(bytes: &[u8]) -> (Document, lopdf::ObjectId) {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        (doc, page_id)
    }

    /// Strings shown by `Tj` operators, plus the decoded operations
    fn shown_text(doc: &Document, page_id: lopdf::ObjectId) -> (Vec<Vec<u8>>, Vec<Operation>) {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let texts = content
            .operations
            .iter()
            .filter(|o| o.operator == "Tj")
            .filter_map(|o| match o.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        (texts, content.operations)
    }

    #[tokio::test]
    async fn test_single_paragraph_is_one_a4_page() {
        let bytes = LopdfRenderer
            .render("<p>Madame, Monsieur,</p>", &TemplateStyle::default())
            .await
            .unwrap();
        let (doc, page_id) = page_of(&bytes);

        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let width_mm = media_box[2].as_float().unwrap() / 72.0 * 25.4;
        let height_mm = media_box[3].as_float().unwrap() / 72.0 * 25.4;
        assert!((width_mm - 210.0).abs() < 0.1);
        assert!((height_mm - 297.0).abs() < 0.1);

        let (texts, operations) = shown_text(&doc, page_id);
        assert!(texts.iter().any(|t| t == b"Madame, Monsieur,"));

        let transform = operations.iter().find(|o| o.operator == "cm").unwrap();
        assert_eq!(transform.operands[0].as_float().unwrap(), 0.5);
        assert_eq!(transform.operands[3].as_float().unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_overflow_is_clipped_to_one_page() {
        let html: String = (0..200)
            .map(|i| format!("<p>Paragraphe numéro {}</p>", i))
            .collect();
        let bytes = LopdfRenderer
            .render(&html, &TemplateStyle::default())
            .await
            .unwrap();
        let (doc, page_id) = page_of(&bytes);

        let (texts, _) = shown_text(&doc, page_id);
        assert!(texts.iter().any(|t| t == b"Paragraphe num\xe9ro 0"));
        assert!(!texts.iter().any(|t| t == b"Paragraphe num\xe9ro 199"));
    }

    #[test]
    fn test_operations_clip_and_count() {
        let (ops, clipped) = layout_operations("<p>court</p>", &TemplateStyle::default());
        assert_eq!(clipped, 0);
        assert_eq!(ops.first().map(|o| o.operator.as_str()), Some("q"));
        assert!(ops.iter().any(|o| o.operator == "W"));
        assert_eq!(ops.last().map(|o| o.operator.as_str()), Some("Q"));
    }

    #[test]
    fn test_wrap_respects_width() {
        let style = RunStyle {
            family: Family::Mono,
            bold: false,
            italic: false,
            underline: false,
            size_pt: 10.0,
            color: [0.0; 3],
        };
        let block = Block {
            pieces: vec![Piece::Text("aaaa bbbb cccc".to_string(), style)],
            align: Align::Left,
            indent_pt: 0.0,
            marker: None,
            space_after_pt: 0.0,
        };
        // 6pt per mono char: "aaaa bbbb" is 54pt wide
        let lines = wrap_block(&block, 60.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].items[0].text, "aaaa bbbb");
        assert_eq!(lines[1].items[0].text, "cccc");
    }

    #[test]
    fn test_lists_get_markers() {
        let mut collector = BlockCollector::new();
        let root = Context {
            style: RunStyle {
                family: Family::Sans,
                bold: false,
                italic: false,
                underline: false,
                size_pt: 12.0,
                color: [0.0; 3],
            },
            align: Align::Left,
            indent_pt: 0.0,
        };
        let fragment = Fragment::parse(
            r#"<ol><li>un</li><li>deux</li></ol><p style="text-align: center"><b>fin</b></p>"#,
        );
        collector.collect(fragment.nodes(), &root);
        let blocks = collector.finish(&root);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].marker.as_ref().map(|m| m.0.as_str()), Some("2."));
        assert_eq!(blocks[1].indent_pt, LIST_INDENT_PT);
        assert_eq!(blocks[2].align, Align::Center);
        assert!(matches!(&blocks[2].pieces[0], Piece::Text(_, style) if style.bold));
    }

    #[test]
    fn test_style_helpers() {
        assert_eq!(Family::from_css("Georgia, 'Times New Roman', serif"), Family::Serif);
        assert_eq!(Family::from_css("'Helvetica Neue', Arial, sans-serif"), Family::Sans);
        assert_eq!(Family::from_css("'Courier New', monospace"), Family::Mono);
        assert_eq!(parse_color("#fff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_length_pt("16px", 12.0), Some(12.0));
        assert_eq!(parse_length_pt("1.5em", 12.0), Some(18.0));
        assert_eq!(encode_win_ansi("é€’"), vec![0xE9, 0x80, 0x92]);
    }
}
