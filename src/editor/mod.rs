// src/editor/mod.rs
//! Rich text editing surface.
//!
//! `EditingSurface` is the primitive that executes `{kind, value}` commands on
//! markup; `RichTextEditor` builds the letter-editing operations on top of it
//! (point-size fonts, links, images, templates, preview mode).

pub mod commands;
pub mod document;

use serde::Serialize;
use std::ops::Range;
use tracing::debug;

pub use commands::{CommandKind, EditorCommand};
pub use document::{Element, Fragment, Node};

use crate::error::EditorError;
use crate::template_processor::LetterFields;
use crate::template_system::{LoadedTemplate, TemplateRegistry};
use crate::utils::word_count;

/// Size the native command space reserves as the point-size marker
const FONT_SIZE_MARKER: &str = "7";
const MAX_FONT_SIZE_PT: f32 = 400.0;
const DEFAULT_IMAGE_ALT: &str = "Image";

const INLINE_FORMAT_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "strike", "font", "span", "sub", "sup",
];

/// Editable markup primitive with a text selection
pub trait EditingSurface: Send {
    fn execute(&mut self, command: &EditorCommand) -> Result<(), EditorError>;
    /// Replace the selection with `node` and move the caret after it
    fn replace_selection(&mut self, node: Node);
    /// Visit every element, children before parents
    fn rewrite_elements(&mut self, f: &mut dyn FnMut(&mut Element));
    fn html(&self) -> String;
    fn set_html(&mut self, html: &str);
    fn text_content(&self) -> String;
    /// Text with block boundaries kept as whitespace
    fn word_text(&self) -> String;
    fn select(&mut self, start: usize, end: usize);
    fn selection(&self) -> Range<usize>;
}

/// `EditingSurface` over an in-memory HTML fragment
#[derive(Debug, Default)]
pub struct HtmlSurface {
    fragment: Fragment,
    selection: Range<usize>,
}

impl HtmlSurface {
    pub fn new(html: &str) -> Self {
        Self {
            fragment: Fragment::parse(html),
            selection: 0..0,
        }
    }

    fn toggle_inline(&mut self, tag: &str, matches_tag: fn(&Element) -> bool) {
        let range = self.selection.clone();
        if self.fragment.range_has_ancestor(range.clone(), &matches_tag) {
            self.fragment.strip_range(range, &matches_tag);
        } else {
            self.fragment.wrap_range(range, &Element::new(tag));
        }
    }

    fn wrap_styled(&mut self, property: &str, value: &str) {
        let wrapper = Element::new("span").with_attr("style", &format!("{}: {}", property, value));
        self.fragment.wrap_range(self.selection.clone(), &wrapper);
    }
}

fn is_bold(el: &Element) -> bool {
    el.tag == "b" || el.tag == "strong"
}

fn is_italic(el: &Element) -> bool {
    el.tag == "i" || el.tag == "em"
}

fn is_underline(el: &Element) -> bool {
    el.tag == "u"
}

fn is_inline_format(el: &Element) -> bool {
    INLINE_FORMAT_TAGS.contains(&el.tag.as_str())
}

impl EditingSurface for HtmlSurface {
    fn execute(&mut self, command: &EditorCommand) -> Result<(), EditorError> {
        let range = self.selection.clone();
        match command.kind {
            CommandKind::Bold => self.toggle_inline("b", is_bold),
            CommandKind::Italic => self.toggle_inline("i", is_italic),
            CommandKind::Underline => self.toggle_inline("u", is_underline),
            CommandKind::ForeColor => {
                let color = command.required_value()?.to_string();
                self.wrap_styled("color", &color);
            }
            CommandKind::FontName => {
                let family = command.required_value()?.to_string();
                self.wrap_styled("font-family", &family);
            }
            CommandKind::FontSize => {
                let size = command.required_value()?;
                match size.parse::<u8>() {
                    Ok(1..=7) => {
                        let marker = Element::new("font").with_attr("size", size);
                        self.fragment.wrap_range(range, &marker);
                    }
                    _ => return Err(EditorError::InvalidFontSize(size.to_string())),
                }
            }
            CommandKind::JustifyLeft
            | CommandKind::JustifyCenter
            | CommandKind::JustifyRight
            | CommandKind::JustifyFull => {
                if let Some(alignment) = command.kind.alignment() {
                    self.fragment.set_block_style(range, "text-align", alignment);
                }
            }
            CommandKind::InsertUnorderedList => self.fragment.toggle_list(range, "ul"),
            CommandKind::InsertOrderedList => self.fragment.toggle_list(range, "ol"),
            CommandKind::RemoveFormat => self.fragment.strip_range(range, &is_inline_format),
        }
        Ok(())
    }

    fn replace_selection(&mut self, node: Node) {
        let start = self.selection.start;
        let inserted_len = node.text_len();
        self.fragment.delete_range(self.selection.clone());
        self.fragment.insert_node(start, node);
        let caret = start + inserted_len;
        self.selection = caret..caret;
    }

    fn rewrite_elements(&mut self, f: &mut dyn FnMut(&mut Element)) {
        self.fragment.for_each_element_mut(f);
    }

    fn html(&self) -> String {
        self.fragment.to_html()
    }

    fn set_html(&mut self, html: &str) {
        self.fragment = Fragment::parse(html);
        self.selection = 0..0;
    }

    fn text_content(&self) -> String {
        self.fragment.text_content()
    }

    fn word_text(&self) -> String {
        self.fragment.text_with_breaks()
    }

    fn select(&mut self, start: usize, end: usize) {
        let len = self.fragment.text_len();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = start.min(len)..end.min(len);
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

/// Snapshot of the live document for display
#[derive(Debug, Clone, Serialize)]
pub struct EditorDocument {
    pub html: String,
    pub template_id: Option<String>,
    pub char_count: usize,
    pub word_count: usize,
    pub preview: bool,
    pub selection: SelectionRange,
}

pub struct RichTextEditor<S: EditingSurface = HtmlSurface> {
    surface: S,
    template_id: Option<String>,
    preview: bool,
}

impl Default for RichTextEditor<HtmlSurface> {
    fn default() -> Self {
        Self::new()
    }
}

impl RichTextEditor<HtmlSurface> {
    pub fn new() -> Self {
        Self::with_surface(HtmlSurface::default())
    }
}

impl<S: EditingSurface> RichTextEditor<S> {
    pub fn with_surface(surface: S) -> Self {
        Self {
            surface,
            template_id: None,
            preview: false,
        }
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        if self.preview {
            Err(EditorError::ReadOnly)
        } else {
            Ok(())
        }
    }

    pub fn apply_inline_style(
        &mut self,
        kind: CommandKind,
        value: Option<&str>,
    ) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let command = EditorCommand {
            kind,
            value: value.map(str::to_string),
        };
        debug!("Applying editor command {}", kind);

        if kind == CommandKind::FontSize {
            return self.apply_font_size(command.required_value()?);
        }
        self.surface.execute(&command)
    }

    /// Point sizes go through the marker size, then every marker is rewritten
    /// into a span carrying the explicit size
    fn apply_font_size(&mut self, value: &str) -> Result<(), EditorError> {
        let points = parse_point_size(value)?;
        let size_css = format!("{}pt", format_points(points));

        self.surface.execute(&EditorCommand::with_value(
            CommandKind::FontSize,
            FONT_SIZE_MARKER,
        ))?;

        self.surface.rewrite_elements(&mut |el: &mut Element| {
            if el.tag == "font" && el.attr("size") == Some(FONT_SIZE_MARKER) {
                replace_font_marker(el, &size_css);
            }
            collapse_redundant_span(el);
        });
        Ok(())
    }

    pub fn insert_link(&mut self, url: &str, display_text: &str) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let url = url.trim();
        if url.is_empty() {
            debug!("Ignoring link insertion without url");
            return Ok(());
        }

        let text = match display_text.trim() {
            "" => url,
            text => text,
        };
        let anchor = Element::new("a")
            .with_attr("href", url)
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener noreferrer")
            .with_children(vec![Node::Text(text.to_string())]);
        self.surface.replace_selection(Node::Element(anchor));
        Ok(())
    }

    pub fn insert_image(&mut self, url: &str, alt_text: &str) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let url = url.trim();
        if url.is_empty() {
            debug!("Ignoring image insertion without url");
            return Ok(());
        }

        let alt = match alt_text.trim() {
            "" => DEFAULT_IMAGE_ALT,
            alt => alt,
        };
        let image = Element::new("img").with_attr("src", url).with_attr("alt", alt);
        self.surface.replace_selection(Node::Element(image));
        Ok(())
    }

    pub fn get_content(&self) -> String {
        self.surface.html()
    }

    pub fn set_content(&mut self, html: &str) {
        self.surface.set_html(html);
    }

    /// Replace the document with a template resolved against `fields`
    pub fn load_template(
        &mut self,
        registry: &TemplateRegistry,
        template_id: &str,
        fields: &LetterFields,
    ) -> Result<LoadedTemplate, EditorError> {
        let loaded = registry.load(template_id, fields)?;
        self.surface.set_html(&loaded.html);
        self.template_id = Some(loaded.id.clone());
        Ok(loaded)
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn set_template_id(&mut self, template_id: Option<String>) {
        self.template_id = template_id;
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.surface.select(start, end);
    }

    pub fn selection(&self) -> Range<usize> {
        self.surface.selection()
    }

    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn char_count(&self) -> usize {
        self.surface.text_content().chars().count()
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.surface.word_text())
    }

    pub fn document(&self) -> EditorDocument {
        let selection = self.selection();
        EditorDocument {
            html: self.get_content(),
            template_id: self.template_id.clone(),
            char_count: self.char_count(),
            word_count: self.word_count(),
            preview: self.preview,
            selection: SelectionRange {
                start: selection.start,
                end: selection.end,
            },
        }
    }
}

fn parse_point_size(value: &str) -> Result<f32, EditorError> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("pt").unwrap_or(trimmed).trim();
    match number.parse::<f32>() {
        Ok(points) if points > 0.0 && points <= MAX_FONT_SIZE_PT => Ok(points),
        _ => Err(EditorError::InvalidFontSize(value.to_string())),
    }
}

fn format_points(points: f32) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as u32)
    } else {
        format!("{}", points)
    }
}

/// Turn a `<font size=marker>` element into a span with an explicit point size,
/// folding any face/color attributes into its style
fn replace_font_marker(el: &mut Element, size_css: &str) {
    let mut span = Element::new("span");
    if let Some(face) = el.attr("face") {
        span.set_style_property("font-family", face);
    }
    if let Some(color) = el.attr("color") {
        span.set_style_property("color", color);
    }
    span.set_style_property("font-size", size_css);
    span.children = std::mem::take(&mut el.children);
    *el = span;
}

fn collapse_redundant_span(el: &mut Element) {
    if el.tag != "span" || el.children.len() != 1 {
        return;
    }
    let inner = match &el.children[0] {
        Node::Element(child) if child.tag == "span" && child.attrs == el.attrs => {
            child.children.clone()
        }
        _ => return,
    };
    el.children = inner;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> RichTextEditor {
        let mut editor = RichTextEditor::new();
        editor.set_content(html);
        editor
    }

    #[test]
    fn test_content_roundtrip_is_dom_equivalent() {
        let html = "<p>Madame, <b>Monsieur</b>,</p>\n<ul><li>un</li><li>deux</li></ul>";
        let editor = editor_with(html);
        assert_eq!(
            Fragment::parse(&editor.get_content()),
            Fragment::parse(html)
        );
    }

    #[test]
    fn test_bold_toggles() {
        let mut editor = editor_with("<p>Bonjour monde</p>");
        editor.select(0, 7);
        editor.apply_inline_style(CommandKind::Bold, None).unwrap();
        assert_eq!(editor.get_content(), "<p><b>Bonjour</b> monde</p>");

        editor.apply_inline_style(CommandKind::Bold, None).unwrap();
        assert_eq!(editor.get_content(), "<p>Bonjour monde</p>");
    }

    #[test]
    fn test_collapsed_selection_leaves_markup() {
        let mut editor = editor_with("<p>Bonjour</p>");
        editor.select(3, 3);
        editor.apply_inline_style(CommandKind::Italic, None).unwrap();
        assert_eq!(editor.get_content(), "<p>Bonjour</p>");
    }

    #[test]
    fn test_font_size_uses_point_style() {
        let mut editor = editor_with("<p>Bonjour monde</p>");
        editor.select(0, 7);
        editor
            .apply_inline_style(CommandKind::FontSize, Some("14"))
            .unwrap();
        let html = editor.get_content();
        assert_eq!(
            html,
            r#"<p><span style="font-size: 14pt">Bonjour</span> monde</p>"#
        );
        assert!(!html.contains("<font"));
    }

    #[test]
    fn test_font_size_is_idempotent() {
        let mut editor = editor_with("<p>Bonjour monde</p>");
        editor.select(0, 13);
        editor
            .apply_inline_style(CommandKind::FontSize, Some("10.5"))
            .unwrap();
        let once = editor.get_content();

        editor.select(0, 13);
        editor
            .apply_inline_style(CommandKind::FontSize, Some("10.5"))
            .unwrap();
        assert_eq!(editor.get_content(), once);
        assert!(once.contains("font-size: 10.5pt"));
    }

    #[test]
    fn test_font_size_rejects_garbage() {
        let mut editor = editor_with("<p>Bonjour</p>");
        editor.select(0, 3);
        assert!(matches!(
            editor.apply_inline_style(CommandKind::FontSize, Some("énorme")),
            Err(EditorError::InvalidFontSize(_))
        ));
        assert!(matches!(
            editor.apply_inline_style(CommandKind::FontSize, None),
            Err(EditorError::MissingValue("fontSize"))
        ));
    }

    #[test]
    fn test_color_and_font_name_wrap_in_spans() {
        let mut editor = editor_with("<p>abc</p>");
        editor.select(0, 3);
        editor
            .apply_inline_style(CommandKind::ForeColor, Some("#ff0000"))
            .unwrap();
        assert_eq!(
            editor.get_content(),
            r#"<p><span style="color: #ff0000">abc</span></p>"#
        );
    }

    #[test]
    fn test_alignment_and_lists() {
        let mut editor = editor_with("<p>un</p><p>deux</p>");
        editor.select(0, 0);
        editor
            .apply_inline_style(CommandKind::JustifyCenter, None)
            .unwrap();
        assert_eq!(
            editor.get_content(),
            r#"<p style="text-align: center">un</p><p>deux</p>"#
        );

        editor.select(0, 6);
        editor
            .apply_inline_style(CommandKind::InsertOrderedList, None)
            .unwrap();
        assert_eq!(
            editor.get_content(),
            r#"<ol><li style="text-align: center">un</li><li>deux</li></ol>"#
        );
    }

    #[test]
    fn test_remove_format() {
        let mut editor = editor_with("<p><b>gras</b> et <i>italique</i></p>");
        editor.select(0, 16);
        editor
            .apply_inline_style(CommandKind::RemoveFormat, None)
            .unwrap();
        assert_eq!(editor.get_content(), "<p>gras et italique</p>");
    }

    #[test]
    fn test_insert_link() {
        let mut editor = editor_with("<p>Voir ici</p>");
        editor.select(5, 8);
        editor.insert_link("https://example.com", "").unwrap();
        assert_eq!(
            editor.get_content(),
            r#"<p>Voir <a href="https://example.com" target="_blank" rel="noopener noreferrer">https://example.com</a></p>"#
        );
    }

    #[test]
    fn test_insert_link_without_url_is_noop() {
        let mut editor = editor_with("<p>Voir ici</p>");
        editor.select(5, 8);
        editor.insert_link("   ", "ici").unwrap();
        assert_eq!(editor.get_content(), "<p>Voir ici</p>");
    }

    #[test]
    fn test_insert_image_alt_fallback() {
        let mut editor = editor_with("<p>Photo</p>");
        editor.select(5, 5);
        editor.insert_image("https://example.com/a.png", "").unwrap();
        assert_eq!(
            editor.get_content(),
            r#"<p>Photo<img src="https://example.com/a.png" alt="Image"></p>"#
        );
    }

    #[test]
    fn test_preview_rejects_commands() {
        let mut editor = editor_with("<p>abc</p>");
        editor.set_preview(true);
        editor.select(0, 3);
        assert!(matches!(
            editor.apply_inline_style(CommandKind::Bold, None),
            Err(EditorError::ReadOnly)
        ));
        assert!(matches!(
            editor.insert_link("https://x.io", "x"),
            Err(EditorError::ReadOnly)
        ));

        editor.set_preview(false);
        editor.apply_inline_style(CommandKind::Bold, None).unwrap();
        assert_eq!(editor.get_content(), "<p><b>abc</b></p>");
    }

    #[test]
    fn test_load_template_replaces_content() {
        let registry = TemplateRegistry::new();
        let mut editor = editor_with("<p>brouillon</p>");
        let loaded = editor
            .load_template(&registry, "moderne", &LetterFields::default())
            .unwrap();
        assert_eq!(editor.template_id(), Some("moderne"));
        assert!(!editor.get_content().contains("brouillon"));
        assert_eq!(
            Fragment::parse(&editor.get_content()),
            Fragment::parse(&loaded.html)
        );

        assert!(matches!(
            editor.load_template(&registry, "inconnu", &LetterFields::default()),
            Err(EditorError::Template(_))
        ));
        assert_eq!(editor.template_id(), Some("moderne"));
    }

    #[test]
    fn test_counts_and_selection_clamp() {
        let mut editor = editor_with("<p>Deux mots</p>");
        assert_eq!(editor.char_count(), 9);
        assert_eq!(editor.word_count(), 2);

        editor.select(20, 4);
        assert_eq!(editor.selection(), 4..9);

        editor.set_content("<p>Madame,</p><p>Monsieur</p>");
        assert_eq!(editor.word_count(), 2);
        assert_eq!(editor.char_count(), 15);
        editor.select(0, 99);
        assert_eq!(editor.selection(), 0..15);
    }
}
