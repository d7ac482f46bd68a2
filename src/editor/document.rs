// src/editor/document.rs
//! Editable HTML fragment.
//!
//! Positions are character offsets into the fragment's text content (the
//! concatenation of every text node in document order), the same coordinates a
//! browser selection reports through `textContent`.

use scraper::{ElementRef, Html};
use std::ops::Range;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "footer", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.attr("style").and_then(|style| {
            parse_style(style)
                .into_iter()
                .find(|(k, _)| k == property)
                .map(|(_, v)| v)
        })
    }

    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let mut decls = self.attr("style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(k, _)| k == property) {
            Some((_, v)) => *v = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr("style", &format_style(&decls));
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }
}

impl Node {
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Element(el) => el.text_len(),
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    fn collect_text_with_breaks(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.tag == "br" => out.push('\n'),
            Node::Element(el) => {
                let block = el.is_block() || el.tag == "li";
                if block {
                    out.push('\n');
                }
                el.children
                    .iter()
                    .for_each(|c| c.collect_text_with_breaks(out));
                if block {
                    out.push('\n');
                }
            }
        }
    }

    fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value.to_string()))
            }
        })
        .collect()
}

pub fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether a node spanning `start..end` is touched by `range`. A caret belongs to
/// the node that ends at or after it, so a boundary between two blocks selects
/// only the first; a caret at offset 0 belongs to the leading node.
fn touches(start: usize, end: usize, range: &Range<usize>) -> bool {
    if range.start == range.end {
        let caret = range.start;
        (start < caret && caret <= end) || (caret == 0 && start == 0)
    } else {
        start < range.end && range.start < end
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn split3(text: &str, from: usize, to: usize) -> (String, String, String) {
    let a = byte_index(text, from);
    let b = byte_index(text, to);
    (
        text[..a].to_string(),
        text[a..b].to_string(),
        text[b..].to_string(),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        Self {
            nodes: convert_children(parsed.root_element()),
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(node, false, &mut out);
        }
        out
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.collect_text(&mut out));
        out
    }

    /// Text with a line break at block and `<br>` edges, for word counting;
    /// offsets into it do not match `text_content`
    pub fn text_with_breaks(&self) -> String {
        let mut out = String::new();
        self.nodes
            .iter()
            .for_each(|n| n.collect_text_with_breaks(&mut out));
        out
    }

    pub fn text_len(&self) -> usize {
        self.nodes.iter().map(Node::text_len).sum()
    }

    /// Wrap every non-blank text run inside `range` in a clone of `wrapper`
    pub fn wrap_range(&mut self, range: Range<usize>, wrapper: &Element) {
        if range.start >= range.end {
            return;
        }
        let mut cursor = 0;
        wrap_nodes(&mut self.nodes, &mut cursor, &range, wrapper);
    }

    /// True when every non-blank text run inside `range` has an ancestor matching `pred`
    pub fn range_has_ancestor(&self, range: Range<usize>, pred: &dyn Fn(&Element) -> bool) -> bool {
        if range.start >= range.end {
            return false;
        }
        let mut cursor = 0;
        let mut seen = false;
        let covered = covered_nodes(&self.nodes, &mut cursor, &range, false, pred, &mut seen);
        covered && seen
    }

    /// Remove elements matching `pred` from `range`, splitting them at the range edges
    pub fn strip_range(&mut self, range: Range<usize>, pred: &dyn Fn(&Element) -> bool) {
        if range.start >= range.end {
            return;
        }
        let nodes = std::mem::take(&mut self.nodes);
        let mut cursor = 0;
        self.nodes = strip_nodes(nodes, &mut cursor, &range, pred);
    }

    pub fn delete_range(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let mut cursor = 0;
        delete_nodes(&mut self.nodes, &mut cursor, &range);
    }

    /// Insert `node` at a text offset; with no text to anchor on, append to the last block
    pub fn insert_node(&mut self, offset: usize, node: Node) {
        let mut pending = Some(node);
        let mut cursor = 0;
        insert_into(&mut self.nodes, &mut cursor, offset, &mut pending);

        if let Some(node) = pending {
            match self.nodes.iter_mut().rev().find(|n| !n.is_blank_text()) {
                Some(Node::Element(last)) if last.is_block() && !last.is_void() => {
                    last.children.push(node)
                }
                _ => self.nodes.push(node),
            }
        }
    }

    /// Visit every element, children before parents
    pub fn for_each_element_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        visit_elements(&mut self.nodes, f);
    }

    /// Set a style property on the innermost blocks touched by `range`
    pub fn set_block_style(&mut self, range: Range<usize>, property: &str, value: &str) {
        self.wrap_loose_inline_runs(&range);
        let mut cursor = 0;
        style_leaf_blocks(&mut self.nodes, &mut cursor, &range, property, value);
    }

    /// Turn the top-level blocks touched by `range` into one list, or back into
    /// paragraphs when they already all are lists of that kind
    pub fn toggle_list(&mut self, range: Range<usize>, list_tag: &str) {
        self.wrap_loose_inline_runs(&range);

        let mut cursor = 0;
        let mut touched = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let start = cursor;
            cursor += node.text_len();
            if let Node::Element(_) = node {
                if touches(start, cursor, &range) {
                    touched.push(index);
                }
            }
        }

        let (Some(&first), Some(&last)) = (touched.first(), touched.last()) else {
            return;
        };

        let already_listed = touched
            .iter()
            .all(|&i| matches!(&self.nodes[i], Node::Element(el) if el.tag == list_tag));

        let selected: Vec<Node> = self.nodes.drain(first..=last).collect();
        let replacement = if already_listed {
            unlist(selected)
        } else {
            vec![Node::Element(build_list(selected, list_tag))]
        };
        self.nodes.splice(first..first, replacement);
    }

    /// Wrap top-level inline runs touched by `range` in a `div`, so block-level
    /// commands have a block to act on
    fn wrap_loose_inline_runs(&mut self, range: &Range<usize>) {
        let nodes = std::mem::take(&mut self.nodes);
        let mut out = Vec::with_capacity(nodes.len());
        let mut run: Vec<Node> = Vec::new();
        let mut run_start = 0;
        let mut cursor = 0;

        for node in nodes {
            let len = node.text_len();
            let inline = match &node {
                Node::Text(_) => true,
                Node::Element(el) => !el.is_block(),
            };

            if inline {
                if run.is_empty() {
                    run_start = cursor;
                }
                run.push(node);
            } else {
                flush_inline_run(&mut out, &mut run, run_start..cursor, range);
                out.push(node);
            }
            cursor += len;
        }
        flush_inline_run(&mut out, &mut run, run_start..cursor, range);

        self.nodes = out;
    }
}

fn flush_inline_run(
    out: &mut Vec<Node>,
    run: &mut Vec<Node>,
    span: Range<usize>,
    range: &Range<usize>,
) {
    if run.is_empty() {
        return;
    }
    let meaningful = run.iter().any(|n| !n.is_blank_text());
    if meaningful && touches(span.start, span.end, range) {
        let div = Element::new("div").with_children(std::mem::take(run));
        out.push(Node::Element(div));
    } else {
        out.append(run);
    }
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            let value = element.value();
            nodes.push(Node::Element(Element {
                tag: value.name().to_string(),
                attrs: value
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                children: convert_children(element),
            }));
        } else if let scraper::Node::Text(text) = child.value() {
            nodes.push(Node::Text(text.text.to_string()));
        }
    }
    nodes
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => escape_text(text, out),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
            for child in &el.children {
                write_node(child, raw, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn wrap_nodes(nodes: &mut Vec<Node>, cursor: &mut usize, range: &Range<usize>, wrapper: &Element) {
    let mut i = 0;
    while i < nodes.len() {
        let replacement = match &mut nodes[i] {
            Node::Text(text) => {
                let start = *cursor;
                let len = text.chars().count();
                *cursor += len;

                let lo = range.start.max(start);
                let hi = range.end.min(start + len);
                if lo >= hi {
                    None
                } else {
                    let (before, middle, after) = split3(text, lo - start, hi - start);
                    if middle.trim().is_empty() {
                        None
                    } else {
                        let mut parts = Vec::with_capacity(3);
                        if !before.is_empty() {
                            parts.push(Node::Text(before));
                        }
                        let mut wrapped = wrapper.clone();
                        wrapped.children = vec![Node::Text(middle)];
                        parts.push(Node::Element(wrapped));
                        if !after.is_empty() {
                            parts.push(Node::Text(after));
                        }
                        Some(parts)
                    }
                }
            }
            Node::Element(el) => {
                let start = *cursor;
                let len = el.text_len();
                if start + len <= range.start || start >= range.end {
                    *cursor += len;
                } else {
                    wrap_nodes(&mut el.children, cursor, range, wrapper);
                }
                None
            }
        };

        match replacement {
            Some(parts) => {
                let count = parts.len();
                nodes.splice(i..i + 1, parts);
                i += count;
            }
            None => i += 1,
        }
    }
}

fn covered_nodes(
    nodes: &[Node],
    cursor: &mut usize,
    range: &Range<usize>,
    inside: bool,
    pred: &dyn Fn(&Element) -> bool,
    seen: &mut bool,
) -> bool {
    for node in nodes {
        match node {
            Node::Text(text) => {
                let start = *cursor;
                let len = text.chars().count();
                *cursor += len;

                let lo = range.start.max(start);
                let hi = range.end.min(start + len);
                if lo < hi {
                    let (_, segment, _) = split3(text, lo - start, hi - start);
                    if segment.trim().is_empty() {
                        continue;
                    }
                    *seen = true;
                    if !inside {
                        return false;
                    }
                }
            }
            Node::Element(el) => {
                let inside_here = inside || pred(el);
                if !covered_nodes(&el.children, cursor, range, inside_here, pred, seen) {
                    return false;
                }
            }
        }
    }
    true
}

fn slice_nodes(nodes: &[Node], from: usize, to: usize) -> Vec<Node> {
    let mut cursor = 0;
    let mut out = Vec::new();
    slice_into(nodes, &mut cursor, from, to, &mut out);
    out
}

fn slice_into(nodes: &[Node], cursor: &mut usize, from: usize, to: usize, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                let start = *cursor;
                let len = text.chars().count();
                *cursor += len;

                let lo = from.max(start);
                let hi = to.min(start + len);
                if lo < hi {
                    let (_, segment, _) = split3(text, lo - start, hi - start);
                    out.push(Node::Text(segment));
                }
            }
            Node::Element(el) => {
                let start = *cursor;
                if el.text_len() == 0 {
                    if start >= from && start < to {
                        out.push(Node::Element(el.clone()));
                    }
                    continue;
                }

                let mut children = Vec::new();
                slice_into(&el.children, cursor, from, to, &mut children);
                if !children.is_empty() {
                    out.push(Node::Element(Element {
                        tag: el.tag.clone(),
                        attrs: el.attrs.clone(),
                        children,
                    }));
                }
            }
        }
    }
}

fn strip_nodes(
    nodes: Vec<Node>,
    cursor: &mut usize,
    range: &Range<usize>,
    pred: &dyn Fn(&Element) -> bool,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            Node::Text(text) => {
                *cursor += text.chars().count();
                out.push(Node::Text(text));
            }
            Node::Element(mut el) => {
                let start = *cursor;
                let end = start + el.text_len();

                if !(range.start < end && start < range.end) {
                    *cursor = end;
                    out.push(Node::Element(el));
                    continue;
                }

                let children = std::mem::take(&mut el.children);
                if pred(&el) {
                    let lo = range.start.max(start) - start;
                    let hi = range.end.min(end) - start;

                    let before = slice_nodes(&children, 0, lo);
                    let inside = slice_nodes(&children, lo, hi);
                    let after = slice_nodes(&children, hi, usize::MAX);

                    if !before.is_empty() {
                        out.push(Node::Element(Element {
                            children: before,
                            ..el.clone()
                        }));
                    }
                    let mut inner_cursor = start + lo;
                    out.extend(strip_nodes(inside, &mut inner_cursor, range, pred));
                    if !after.is_empty() {
                        out.push(Node::Element(Element {
                            children: after,
                            ..el
                        }));
                    }
                    *cursor = end;
                } else {
                    el.children = strip_nodes(children, cursor, range, pred);
                    *cursor = end;
                    out.push(Node::Element(el));
                }
            }
        }
    }

    out
}

fn delete_nodes(nodes: &mut Vec<Node>, cursor: &mut usize, range: &Range<usize>) {
    let mut i = 0;
    while i < nodes.len() {
        let remove = match &mut nodes[i] {
            Node::Text(text) => {
                let start = *cursor;
                let len = text.chars().count();
                *cursor += len;

                let lo = range.start.max(start);
                let hi = range.end.min(start + len);
                if lo < hi {
                    let (before, _, after) = split3(text, lo - start, hi - start);
                    *text = before + &after;
                    text.is_empty()
                } else {
                    false
                }
            }
            Node::Element(el) => {
                let start = *cursor;
                let len = el.text_len();
                if len == 0 {
                    el.is_void() && range.start < start && start < range.end
                } else if start + len <= range.start || start >= range.end {
                    *cursor += len;
                    false
                } else {
                    delete_nodes(&mut el.children, cursor, range);
                    el.children.is_empty()
                }
            }
        };

        if remove {
            nodes.remove(i);
        } else {
            i += 1;
        }
    }
}

fn insert_into(nodes: &mut Vec<Node>, cursor: &mut usize, offset: usize, pending: &mut Option<Node>) {
    let mut i = 0;
    while i < nodes.len() && pending.is_some() {
        let split = match &mut nodes[i] {
            Node::Text(text) => {
                let start = *cursor;
                let len = text.chars().count();
                *cursor += len;
                if offset >= start && offset <= start + len {
                    let (before, _, after) = split3(text, offset - start, offset - start);
                    Some((before, after))
                } else {
                    None
                }
            }
            Node::Element(el) => {
                insert_into(&mut el.children, cursor, offset, pending);
                None
            }
        };

        if let Some((before, after)) = split {
            let mut parts = Vec::with_capacity(3);
            if !before.is_empty() {
                parts.push(Node::Text(before));
            }
            if let Some(node) = pending.take() {
                parts.push(node);
            }
            if !after.is_empty() {
                parts.push(Node::Text(after));
            }
            let count = parts.len();
            nodes.splice(i..i + 1, parts);
            i += count;
        } else {
            i += 1;
        }
    }
}

fn visit_elements(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            visit_elements(&mut el.children, f);
            f(el);
        }
    }
}

fn style_leaf_blocks(
    nodes: &mut [Node],
    cursor: &mut usize,
    range: &Range<usize>,
    property: &str,
    value: &str,
) {
    for node in nodes.iter_mut() {
        match node {
            Node::Text(text) => *cursor += text.chars().count(),
            Node::Element(el) => {
                let start = *cursor;
                let end = start + el.text_len();

                if el.is_block() && touches(start, end, range) {
                    let has_inner_blocks = el
                        .children
                        .iter()
                        .any(|c| matches!(c, Node::Element(inner) if inner.is_block()));
                    if has_inner_blocks {
                        style_leaf_blocks(&mut el.children, cursor, range, property, value);
                    } else {
                        el.set_style_property(property, value);
                    }
                }
                *cursor = end;
            }
        }
    }
}

fn build_list(nodes: Vec<Node>, list_tag: &str) -> Element {
    let mut items = Vec::new();

    for node in nodes {
        match node {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(text) => {
                items.push(Node::Element(
                    Element::new("li").with_children(vec![Node::Text(text)]),
                ));
            }
            Node::Element(el) if el.tag == "ul" || el.tag == "ol" => {
                items.extend(
                    el.children
                        .into_iter()
                        .filter(|c| matches!(c, Node::Element(item) if item.tag == "li")),
                );
            }
            Node::Element(el) if el.is_block() => {
                let mut item = Element::new("li").with_children(el.children);
                if let Some(style) = el.attrs.iter().find(|(k, _)| k == "style") {
                    item.set_attr("style", &style.1);
                }
                items.push(Node::Element(item));
            }
            Node::Element(el) => {
                items.push(Node::Element(
                    Element::new("li").with_children(vec![Node::Element(el)]),
                ));
            }
        }
    }

    Element::new(list_tag).with_children(items)
}

fn unlist(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Element(list) if list.tag == "ul" || list.tag == "ol" => {
                for child in list.children {
                    if let Node::Element(item) = child {
                        if item.tag == "li" {
                            out.push(Node::Element(Element {
                                tag: "p".to_string(),
                                attrs: item.attrs,
                                children: item.children,
                            }));
                        }
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold() -> Element {
        Element::new("b")
    }

    fn is_bold(el: &Element) -> bool {
        el.tag == "b" || el.tag == "strong"
    }

    #[test]
    fn test_parse_serialize_roundtrip() {
        let html = r#"<p style="text-align: right">Bonjour <b>le</b> monde &amp; co<br>suite</p><ul><li>un</li></ul><img src="a.png">"#;
        let fragment = Fragment::parse(html);
        assert_eq!(fragment.to_html(), html);

        let multi = Fragment::parse(r#"<a href="x" target="_blank" rel="noopener">l</a>"#);
        assert_eq!(Fragment::parse(&multi.to_html()), multi);
    }

    #[test]
    fn test_text_content_spans_nodes() {
        let fragment = Fragment::parse("<p>ab<i>cd</i></p><p>é</p>");
        assert_eq!(fragment.text_content(), "abcdé");
        assert_eq!(fragment.text_len(), 5);
    }

    #[test]
    fn test_wrap_range_across_elements() {
        let mut fragment = Fragment::parse("<p>Hello <i>big</i> world</p>");
        fragment.wrap_range(4..11, &bold());
        assert_eq!(
            fragment.to_html(),
            "<p>Hell<b>o </b><i><b>big</b></i><b> w</b>orld</p>"
        );
    }

    #[test]
    fn test_wrap_range_skips_blank_runs() {
        let mut fragment = Fragment::parse("<p>a</p>\n<p>b</p>");
        fragment.wrap_range(0..3, &bold());
        assert_eq!(fragment.to_html(), "<p><b>a</b></p>\n<p><b>b</b></p>");
    }

    #[test]
    fn test_range_has_ancestor() {
        let fragment = Fragment::parse("<p><b>abc</b>def</p>");
        assert!(fragment.range_has_ancestor(0..3, &is_bold));
        assert!(fragment.range_has_ancestor(1..2, &is_bold));
        assert!(!fragment.range_has_ancestor(2..4, &is_bold));
        assert!(!fragment.range_has_ancestor(1..1, &is_bold));
    }

    #[test]
    fn test_strip_range_splits_element() {
        let mut fragment = Fragment::parse("<p><b>abcdef</b></p>");
        fragment.strip_range(2..4, &is_bold);
        assert_eq!(fragment.to_html(), "<p><b>ab</b>cd<b>ef</b></p>");
    }

    #[test]
    fn test_strip_range_keeps_nested_formatting() {
        let mut fragment = Fragment::parse("<p><b>a<i>bc</i>d</b></p>");
        fragment.strip_range(0..4, &is_bold);
        assert_eq!(fragment.to_html(), "<p>a<i>bc</i>d</p>");
    }

    #[test]
    fn test_delete_and_insert() {
        let mut fragment = Fragment::parse("<p>Hello <b>big</b> world</p>");
        fragment.delete_range(6..10);
        assert_eq!(fragment.to_html(), "<p>Hello world</p>");

        let link = Element::new("a")
            .with_attr("href", "https://x.io")
            .with_children(vec![Node::Text("X".to_string())]);
        fragment.insert_node(6, Node::Element(link));
        assert_eq!(
            fragment.to_html(),
            r#"<p>Hello <a href="https://x.io">X</a>world</p>"#
        );
    }

    #[test]
    fn test_insert_into_empty_fragment() {
        let mut fragment = Fragment::default();
        fragment.insert_node(0, Node::Element(Element::new("img").with_attr("src", "a.png")));
        assert_eq!(fragment.to_html(), r#"<img src="a.png">"#);

        let mut blank_para = Fragment::parse("<p></p>");
        blank_para.insert_node(0, Node::Text("x".to_string()));
        assert_eq!(blank_para.to_html(), "<p>x</p>");
    }

    #[test]
    fn test_block_style_on_touched_blocks() {
        let mut fragment = Fragment::parse("<p>one</p><p>two</p><p>three</p>");
        fragment.set_block_style(4..5, "text-align", "center");
        assert_eq!(
            fragment.to_html(),
            r#"<p>one</p><p style="text-align: center">two</p><p>three</p>"#
        );
    }

    #[test]
    fn test_block_style_wraps_loose_text() {
        let mut fragment = Fragment::parse("loose text");
        fragment.set_block_style(0..0, "text-align", "right");
        assert_eq!(
            fragment.to_html(),
            r#"<div style="text-align: right">loose text</div>"#
        );
    }

    #[test]
    fn test_toggle_list_on_and_off() {
        let mut fragment = Fragment::parse("<p>a</p><p>b</p><p>c</p>");
        fragment.toggle_list(0..2, "ul");
        assert_eq!(
            fragment.to_html(),
            "<ul><li>a</li><li>b</li></ul><p>c</p>"
        );

        fragment.toggle_list(0..1, "ul");
        assert_eq!(fragment.to_html(), "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn test_caret_at_block_boundary_picks_one_block() {
        let mut fragment = Fragment::parse("<p>ab</p><p>cd</p>");
        fragment.toggle_list(2..2, "ul");
        assert_eq!(fragment.to_html(), "<ul><li>ab</li></ul><p>cd</p>");

        let mut fragment = Fragment::parse("<p>ab</p><p>cd</p>");
        fragment.set_block_style(2..2, "text-align", "center");
        assert_eq!(
            fragment.to_html(),
            r#"<p style="text-align: center">ab</p><p>cd</p>"#
        );

        let mut fragment = Fragment::parse("<p>ab</p><p>cd</p>");
        fragment.toggle_list(0..0, "ol");
        assert_eq!(fragment.to_html(), "<ol><li>ab</li></ol><p>cd</p>");

        let mut fragment = Fragment::parse("<p>ab</p><p>cd</p>");
        fragment.toggle_list(3..3, "ul");
        assert_eq!(fragment.to_html(), "<p>ab</p><ul><li>cd</li></ul>");
    }

    #[test]
    fn test_text_with_breaks_separates_blocks() {
        let fragment = Fragment::parse("<p>Madame,</p><p>Monsieur<br>Dupont</p><ul><li>un</li><li>deux</li></ul>");
        assert_eq!(fragment.text_content(), "Madame,MonsieurDupontundeux");
        let binding = fragment.text_with_breaks();
        let words: Vec<&str> = binding.split_whitespace().collect::<Vec<_>>();
        assert_eq!(words, vec!["Madame,", "Monsieur", "Dupont", "un", "deux"]);
    }

    #[test]
    fn test_toggle_list_switches_kind() {
        let mut fragment = Fragment::parse("<ul><li>a</li><li>b</li></ul>");
        fragment.toggle_list(0..1, "ol");
        assert_eq!(fragment.to_html(), "<ol><li>a</li><li>b</li></ol>");
    }

    #[test]
    fn test_style_helpers() {
        let mut el = Element::new("span").with_attr("style", "color: red;font-size:12pt");
        assert_eq!(el.style_property("font-size").as_deref(), Some("12pt"));
        el.set_style_property("color", "blue");
        assert_eq!(el.attr("style"), Some("color: blue; font-size: 12pt"));
    }
}
