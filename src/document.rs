//! Transformed-document DOM.
//!
//! The upstream pipeline emits XHTML (or close-to-XML HTML) whose headers are
//! `h1`..`h6` elements. This module parses it into an index arena, exposes the
//! structural queries the matcher and the section extractor need, and writes
//! it back out.
//!
//! # Parsing mode
//!
//! Parsing is lenient in the ways HTML exported by layout tools tends to need:
//! - void elements (`br`, `img`, `meta`, ...) never take children
//! - an end tag closes up to the nearest open element with the same name, an
//!   end tag with no open counterpart is dropped
//! - HTML named and numeric entities (`&nbsp;`, `&eacute;`, `&#233;`) are
//!   resolved

use anyhow::{Context, Result, anyhow};
use html_escape::decode_html_entities;
use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use crate::text::condense_whitespace;

pub type NodeId = usize;

pub const DOCUMENT_ROOT: NodeId = 0;

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A header element found in a document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub node: NodeId,
    pub depth: u8,
    pub text: String,
    pub position_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<DomNode>,
    has_declaration: bool,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![DomNode {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            has_declaration: false,
            doctype: None,
        }
    }
}

impl Document {
    pub fn parse(markup: &str) -> Result<Self> {
        let mut reader = Reader::from_str(markup);
        reader.trim_text(false);
        reader.check_end_names(false);

        let mut doc = Self::default();
        let mut open = vec![DOCUMENT_ROOT];

        loop {
            let current = open.last().copied().unwrap_or(DOCUMENT_ROOT);
            let event = reader.read_event().map_err(|err| {
                anyhow!(err).context(format!(
                    "malformed markup near byte {}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Decl(_) => doc.has_declaration = true,
                Event::DocType(text) => {
                    doc.doctype = Some(String::from_utf8_lossy(&text).trim().to_string());
                }
                Event::Start(start) => {
                    let (name, attributes) = element_parts(&start);
                    let is_void = is_void_element(&name);
                    let id = doc.append_element(current, name, attributes);
                    if !is_void {
                        open.push(id);
                    }
                }
                Event::Empty(start) => {
                    let (name, attributes) = element_parts(&start);
                    doc.append_element(current, name, attributes);
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                    let position = open.iter().rposition(|&id| {
                        doc.element_name(id)
                            .is_some_and(|open_name| open_name.eq_ignore_ascii_case(&name))
                    });
                    if let Some(position) = position {
                        open.truncate(position.max(1));
                    }
                }
                Event::Text(text) => {
                    // text outside the root element carries no content
                    if current == DOCUMENT_ROOT {
                        continue;
                    }
                    let value = decode_entities(&text);
                    if !value.is_empty() {
                        doc.append_node(current, NodeKind::Text(value));
                    }
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data).to_string();
                    doc.append_node(current, NodeKind::CData(value));
                }
                Event::Comment(text) => {
                    let value = String::from_utf8_lossy(&text).to_string();
                    doc.append_node(current, NodeKind::Comment(value));
                }
                Event::PI(_) => {}
                Event::Eof => break,
            }
        }

        if doc.document_element().is_none() {
            return Err(anyhow!("markup contains no root element"));
        }

        Ok(doc)
    }

    /// New standalone XHTML document with a `head` carrying `title`.
    /// Returns the document and its `body` node.
    pub fn standalone(title: &str) -> (Self, NodeId) {
        let mut doc = Self {
            has_declaration: true,
            ..Self::default()
        };

        let html = doc.append_element(
            DOCUMENT_ROOT,
            "html".to_string(),
            vec![("xmlns".to_string(), XHTML_NAMESPACE.to_string())],
        );
        let head = doc.append_element(html, "head".to_string(), Vec::new());
        doc.append_element(
            head,
            "meta".to_string(),
            vec![("charset".to_string(), "UTF-8".to_string())],
        );
        let title_node = doc.append_element(head, "title".to_string(), Vec::new());
        doc.append_node(title_node, NodeKind::Text(title.to_string()));
        let body = doc.append_element(html, "body".to_string(), Vec::new());

        (doc, body)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element { .. })
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Header depth (1-6) when `id` is an `h1`..`h6` element.
    pub fn heading_depth(&self, id: NodeId) -> Option<u8> {
        self.element_name(id).and_then(heading_depth_of)
    }

    pub fn set_element_name(&mut self, id: NodeId, new_name: String) {
        if let NodeKind::Element { name, .. } = &mut self.nodes[id].kind {
            *name = new_name;
        }
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: String,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        self.append_node(parent, NodeKind::Element { name, attributes })
    }

    #[cfg(test)]
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_node(parent, NodeKind::Text(text.to_string()))
    }

    fn append_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Deep-copies `node` from `source` as the last child of `parent`.
    pub fn import_subtree(&mut self, parent: NodeId, source: &Document, node: NodeId) -> NodeId {
        let copied_root = self.append_node(parent, source.nodes[node].kind.clone());
        let mut stack: Vec<(NodeId, NodeId)> = source.nodes[node]
            .children
            .iter()
            .rev()
            .map(|&child| (child, copied_root))
            .collect();

        while let Some((source_id, target_parent)) = stack.pop() {
            let copied = self.append_node(target_parent, source.nodes[source_id].kind.clone());
            for &child in source.nodes[source_id].children.iter().rev() {
                stack.push((child, copied));
            }
        }

        copied_root
    }

    /// `id` followed by all of its descendants in document order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            for &child in self.nodes[current].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = self.subtree(id);
        order.remove(0);
        order
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes[node].parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }

    /// Concatenation of all descendant text.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.subtree(id) {
            match &self.nodes[node].kind {
                NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
                _ => {}
            }
        }
        out
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes[DOCUMENT_ROOT]
            .children
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn find_ancestor_element(&self, id: NodeId, local: &str) -> Option<NodeId> {
        let mut current = self.nodes[id].parent;
        while let Some(node) = current {
            if self
                .element_name(node)
                .is_some_and(|name| local_name(name).eq_ignore_ascii_case(local))
            {
                return Some(node);
            }
            current = self.nodes[node].parent;
        }
        None
    }

    #[cfg(test)]
    pub fn first_element(&self, local: &str) -> Option<NodeId> {
        self.subtree(DOCUMENT_ROOT).into_iter().find(|&id| {
            self.element_name(id)
                .is_some_and(|name| local_name(name).eq_ignore_ascii_case(local))
        })
    }

    /// All header elements in document order.
    pub fn headers(&self) -> Vec<DocumentHeader> {
        self.subtree(DOCUMENT_ROOT)
            .into_iter()
            .filter_map(|id| {
                let depth = self.heading_depth(id)?;
                Some(DocumentHeader {
                    node: id,
                    depth,
                    text: condense_whitespace(&self.text_content(id)),
                    position_path: self.position_path(id),
                })
            })
            .collect()
    }

    /// Stable locator such as `/html[1]/body[1]/div[2]/h2[1]`.
    pub fn position_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);

        while let Some(node) = current {
            let Some(name) = self.element_name(node) else {
                current = self.nodes[node].parent;
                continue;
            };

            let ordinal = match self.nodes[node].parent {
                Some(parent) => {
                    self.nodes[parent]
                        .children
                        .iter()
                        .take_while(|&&sibling| sibling != node)
                        .filter(|&&sibling| self.element_name(sibling) == Some(name))
                        .count()
                        + 1
                }
                None => 1,
            };

            segments.push(format!("{name}[{ordinal}]"));
            current = self.nodes[node].parent;
        }

        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub fn resolve_position_path(&self, path: &str) -> Option<NodeId> {
        let mut current = DOCUMENT_ROOT;

        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let (name, ordinal) = match segment.split_once('[') {
                Some((name, rest)) => (name, rest.trim_end_matches(']').parse::<usize>().ok()?),
                None => (segment, 1),
            };

            current = self.nodes[current]
                .children
                .iter()
                .copied()
                .filter(|&child| self.element_name(child) == Some(name))
                .nth(ordinal.checked_sub(1)?)?;
        }

        (current != DOCUMENT_ROOT).then_some(current)
    }

    pub fn serialize(&self) -> String {
        enum Visit {
            Open(NodeId),
            Close(NodeId),
        }

        let mut out = String::new();
        if self.has_declaration {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        }
        if let Some(doctype) = &self.doctype {
            out.push_str(&format!("<!DOCTYPE {doctype}>\n"));
        }

        let mut stack: Vec<Visit> = self.nodes[DOCUMENT_ROOT]
            .children
            .iter()
            .rev()
            .map(|&child| Visit::Open(child))
            .collect();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Open(id) => match &self.nodes[id].kind {
                    NodeKind::Document => {}
                    NodeKind::Element { name, attributes } => {
                        out.push('<');
                        out.push_str(name);
                        for (key, value) in attributes {
                            out.push_str(&format!(" {key}=\"{}\"", escape(value.as_str())));
                        }

                        let children = &self.nodes[id].children;
                        if children.is_empty() && is_void_element(name) {
                            out.push_str(" />");
                        } else if children.is_empty() {
                            out.push_str(&format!("></{name}>"));
                        } else {
                            out.push('>');
                            stack.push(Visit::Close(id));
                            for &child in children.iter().rev() {
                                stack.push(Visit::Open(child));
                            }
                        }
                    }
                    NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
                    NodeKind::CData(text) => out.push_str(&format!("<![CDATA[{text}]]>")),
                    NodeKind::Comment(text) => out.push_str(&format!("<!--{text}-->")),
                },
                Visit::Close(id) => {
                    if let Some(name) = self.element_name(id) {
                        out.push_str(&format!("</{name}>"));
                    }
                }
            }
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

pub fn parse_file(path: &std::path::Path) -> Result<Document> {
    let markup = crate::util::read_text(path)?;
    Document::parse(&markup).with_context(|| format!("failed to parse {}", path.display()))
}

/// Element name without a namespace prefix.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

pub fn heading_depth_of(name: &str) -> Option<u8> {
    let local = local_name(name);
    let mut chars = local.chars();
    let (Some(prefix), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    if !prefix.eq_ignore_ascii_case(&'h') {
        return None;
    }
    let depth = digit.to_digit(10)? as u8;
    (1..=6).contains(&depth).then_some(depth)
}

/// Same element name at another header depth, keeping prefix and case.
pub fn heading_name_with_depth(name: &str, depth: u8) -> String {
    let cut = name.len() - 1;
    format!("{}{}", &name[..cut], depth.clamp(1, 6))
}

fn is_void_element(name: &str) -> bool {
    let local = local_name(name);
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(local))
}

fn element_parts(start: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let attributes = start
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            (key, decode_entities(&attr.value))
        })
        .collect();
    (name, attributes)
}

/// Resolves XML and HTML named or numeric entities. Unknown entities are kept
/// as written.
fn decode_entities(raw: &[u8]) -> String {
    decode_html_entities(&String::from_utf8_lossy(raw)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Report</title><meta charset="utf-8"></head><body>
<h1>Annual  Report</h1>
<p>Intro &amp; scope&nbsp;text</p>
<div class="page"><h2>Balance
Sheet</h2><p>Assets<br>Liabilities</p></div>
</body></html>"#;

    #[test]
    fn parse_collects_headers_in_document_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let headers = doc.headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].text, "Annual Report");
        assert_eq!(headers[0].depth, 1);
        assert_eq!(headers[1].text, "Balance Sheet");
        assert_eq!(headers[1].depth, 2);
        assert_eq!(headers[1].position_path, "/html[1]/body[1]/div[1]/h2[1]");
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let doc = Document::parse(SAMPLE).unwrap();
        let body = doc.first_element("body").unwrap();
        let names: Vec<&str> = doc
            .children(body)
            .iter()
            .filter_map(|&id| doc.element_name(id))
            .collect();
        assert_eq!(names, vec!["h1", "p", "div"]);
    }

    #[test]
    fn entities_are_resolved() {
        let doc = Document::parse(SAMPLE).unwrap();
        let paragraph = doc.first_element("p").unwrap();
        assert_eq!(doc.text_content(paragraph), "Intro & scope\u{a0}text");
    }

    #[test]
    fn named_html_entities_decode_once() {
        let doc = Document::parse(
            "<html><body><h1 title=\"Caf&eacute;\">Caf&eacute; &amp; Bar</h1><p>x &lt; y &aacute; &frac12; &#233;</p></body></html>",
        )
        .unwrap();
        let header = &doc.headers()[0];
        assert_eq!(header.text, "Caf\u{e9} & Bar");
        let paragraph = doc.first_element("p").unwrap();
        assert_eq!(doc.text_content(paragraph), "x < y \u{e1} \u{bd} \u{e9}");

        let written = doc.serialize();
        assert!(written.contains("title=\"Caf\u{e9}\""));
        assert!(written.contains("<h1 title=\"Caf\u{e9}\">Caf\u{e9} &amp; Bar</h1>"));
        assert!(written.contains("<p>x &lt; y \u{e1} \u{bd} \u{e9}</p>"));
    }

    #[test]
    fn position_paths_resolve_back_to_nodes() {
        let doc = Document::parse(SAMPLE).unwrap();
        for header in doc.headers() {
            assert_eq!(
                doc.resolve_position_path(&header.position_path),
                Some(header.node)
            );
        }
        assert_eq!(doc.resolve_position_path("/html[1]/body[1]/h3[1]"), None);
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let doc = Document::parse("<body><p>one</span></p><p>two</p></body>").unwrap();
        let body = doc.document_element().unwrap();
        assert_eq!(doc.children(body).len(), 2);
    }

    #[test]
    fn serialize_round_trips_through_parse() {
        let doc = Document::parse(SAMPLE).unwrap();
        let written = doc.serialize();
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(written.contains("<br />"));
        assert!(written.contains("Intro &amp; scope"));

        let reparsed = Document::parse(&written).unwrap();
        assert_eq!(reparsed.serialize(), written);
        assert_eq!(reparsed.headers().len(), 2);
    }

    #[test]
    fn standalone_document_has_title_and_body() {
        let (mut doc, body) = Document::standalone("Notes");
        doc.append_text(body, "x");
        let written = doc.serialize();
        assert!(written.contains("<title>Notes</title>"));
        assert!(written.contains("<body>x</body>"));
    }

    #[test]
    fn heading_names_keep_prefix_and_case() {
        assert_eq!(heading_depth_of("h3"), Some(3));
        assert_eq!(heading_depth_of("H6"), Some(6));
        assert_eq!(heading_depth_of("x:h2"), Some(2));
        assert_eq!(heading_depth_of("h7"), None);
        assert_eq!(heading_depth_of("hr"), None);
        assert_eq!(heading_name_with_depth("H3", 1), "H1");
        assert_eq!(heading_name_with_depth("x:h2", 9), "x:h6");
    }

    #[test]
    fn parse_rejects_markup_without_elements() {
        assert!(Document::parse("just text").is_err());
    }
}
