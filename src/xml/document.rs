//! Minimal read-only XML tree with path queries.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

use crate::core::InvoiceError;

/// Remove every character XML 1.0 does not allow:
/// anything outside tab, LF, CR, U+0020–U+D7FF and U+E000–U+FFFD.
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(|&c| is_xml_char(c)).collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
}

#[derive(Debug)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<usize>,
}

/// Parsed invoice document.
///
/// Elements are matched by local name, so namespace prefixes in the source
/// do not affect lookups.
#[derive(Debug)]
pub struct Document {
    // nodes[0] is a virtual root holding the document element.
    nodes: Vec<Node>,
}

fn malformed(e: impl std::fmt::Display) -> InvoiceError {
    InvoiceError::MalformedDocument(e.to_string())
}

impl Document {
    /// Read and parse a file. Bytes that are not valid UTF-8 are replaced
    /// before sanitizing.
    pub fn load(path: &Path) -> Result<Self, InvoiceError> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Self::parse(text.trim_start_matches('\u{FEFF}'))
    }

    /// Sanitize and parse XML text.
    pub fn parse(xml: &str) -> Result<Self, InvoiceError> {
        let clean = sanitize(xml);
        let mut reader = Reader::from_str(&clean);
        reader.config_mut().trim_text(true);

        let mut nodes = vec![Node {
            kind: NodeKind::Element(String::new()),
            children: Vec::new(),
        }];
        let mut stack: Vec<usize> = vec![0];

        loop {
            let parent = stack.last().copied().unwrap_or(0);
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())
                        .map_err(malformed)?
                        .to_string();
                    let id = push_node(&mut nodes, parent, NodeKind::Element(name))?;
                    stack.push(id);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())
                        .map_err(malformed)?
                        .to_string();
                    push_node(&mut nodes, parent, NodeKind::Element(name))?;
                }
                Ok(Event::End(_)) => {
                    if stack.len() <= 1 {
                        return Err(malformed("unexpected closing tag"));
                    }
                    stack.pop();
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(malformed)?;
                    if !text.is_empty() {
                        push_node(&mut nodes, parent, NodeKind::Text(text.into_owned()))?;
                    }
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e).into_owned();
                    if !text.is_empty() {
                        push_node(&mut nodes, parent, NodeKind::Text(text))?;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(InvoiceError::MalformedDocument(format!(
                        "{e} (at byte {})",
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(malformed("unexpected end of document"));
        }
        if nodes[0].children.is_empty() {
            return Err(malformed("no root element"));
        }
        Ok(Self { nodes })
    }

    /// The document element.
    pub fn root(&self) -> Element<'_> {
        let id = self.nodes[0].children.first().copied().unwrap_or(0);
        Element { doc: self, id }
    }

    /// First element matching `path` anywhere in the document.
    ///
    /// The first segment matches at any depth; the remaining segments are
    /// child steps, so `"NBan/Ten"` behaves like the XPath `//NBan/Ten`.
    pub fn select_first(&self, path: &str) -> Option<Element<'_>> {
        self.select_all(path).into_iter().next()
    }

    /// All elements matching `path` (see [`select_first`](Self::select_first)),
    /// in document order.
    pub fn select_all(&self, path: &str) -> Vec<Element<'_>> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        let rest: Vec<&str> = segments.collect();

        let mut out = Vec::new();
        for id in self.descendants(0) {
            if self.is_element_named(id, first) {
                self.collect_children(id, &rest, &mut out);
            }
        }
        out
    }

    /// Text of the first match, `""` when absent.
    pub fn text(&self, path: &str) -> String {
        self.select_first(path)
            .map(|e| e.inner_text())
            .unwrap_or_default()
    }

    /// Number of elements matching `path`.
    pub fn count(&self, path: &str) -> usize {
        self.select_all(path).len()
    }

    fn descendants(&self, from: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut pending: Vec<usize> = self.nodes[from].children.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            out.push(id);
            pending.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn is_element_named(&self, id: usize, name: &str) -> bool {
        matches!(&self.nodes[id].kind, NodeKind::Element(n) if n == name)
    }

    fn collect_children<'a>(&'a self, id: usize, steps: &[&str], out: &mut Vec<Element<'a>>) {
        match steps.split_first() {
            None => out.push(Element { doc: self, id }),
            Some((step, rest)) => {
                for &child in &self.nodes[id].children {
                    if self.is_element_named(child, step) {
                        self.collect_children(child, rest, out);
                    }
                }
            }
        }
    }
}

fn push_node(nodes: &mut Vec<Node>, parent: usize, kind: NodeKind) -> Result<usize, InvoiceError> {
    if parent == 0 {
        match kind {
            NodeKind::Text(_) => return Err(malformed("text outside the root element")),
            NodeKind::Element(_) if !nodes[0].children.is_empty() => {
                return Err(malformed("more than one root element"));
            }
            NodeKind::Element(_) => {}
        }
    }
    let id = nodes.len();
    nodes.push(Node {
        kind,
        children: Vec::new(),
    });
    nodes[parent].children.push(id);
    Ok(id)
}

/// An element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: usize,
}

impl<'a> Element<'a> {
    /// Local name (prefix stripped).
    pub fn name(&self) -> &'a str {
        match &self.doc.nodes[self.id].kind {
            NodeKind::Element(n) => n,
            NodeKind::Text(_) => "",
        }
    }

    /// First element reached by following child steps from here.
    pub fn select_first(&self, path: &str) -> Option<Element<'a>> {
        self.select_all(path).into_iter().next()
    }

    /// All elements reached by following child steps from here.
    pub fn select_all(&self, path: &str) -> Vec<Element<'a>> {
        let steps: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::new();
        if !steps.is_empty() {
            self.doc.collect_children(self.id, &steps, &mut out);
        }
        out
    }

    /// Text of the first child-path match, `""` when absent.
    pub fn text(&self, path: &str) -> String {
        self.select_first(path)
            .map(|e| e.inner_text())
            .unwrap_or_default()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        for id in self.doc.descendants(self.id) {
            if let NodeKind::Text(t) = &self.doc.nodes[id].kind {
                out.push_str(t);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HDon>
  <DLHDon>
    <TTChung><SHDon>42</SHDon><NLap>2024-03-15</NLap></TTChung>
    <NDHDon>
      <NBan><Ten>Seller &amp; Co</Ten></NBan>
      <DSHHDVu>
        <HHDVu><STT>1</STT><THHDVu><![CDATA[Bánh <mì>]]></THHDVu></HHDVu>
        <HHDVu><STT>2</STT><THHDVu>Cà phê</THHDVu></HHDVu>
      </DSHHDVu>
    </NDHDon>
  </DLHDon>
</HDon>"#;

    #[test]
    fn descendant_first_path_queries() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.root().name(), "HDon");
        assert_eq!(doc.text("SHDon"), "42");
        assert_eq!(doc.text("NBan/Ten"), "Seller & Co");
        assert_eq!(doc.text("NMua/Ten"), "");
        assert_eq!(doc.count("HHDVu/STT"), 2);

        let items = doc.select_all("HHDVu");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text("THHDVu"), "Bánh <mì>");
        assert_eq!(items[1].text("STT"), "2");
        assert_eq!(items[1].text("Missing"), "");
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(sanitize("a\u{1}b\u{B}c\td\u{FFFE}"), "abc\td");
        let doc = Document::parse("<HDon><SHDon>4\u{2}2</SHDon></HDon>").unwrap();
        assert_eq!(doc.text("SHDon"), "42");
    }

    #[test]
    fn prefixed_names_match_by_local_name() {
        let doc = Document::parse(r#"<inv:HDon xmlns:inv="urn:x"><inv:SHDon>7</inv:SHDon></inv:HDon>"#)
            .unwrap();
        assert_eq!(doc.text("SHDon"), "7");
    }

    #[test]
    fn broken_documents_are_rejected() {
        for xml in [
            "",
            "<HDon><SHDon>1</SHDon>",
            "<HDon></SHDon>",
            "<HDon/><HDon/>",
            "just text",
            "<HDon>&bogus;</HDon>",
        ] {
            let err = Document::parse(xml).unwrap_err();
            assert!(matches!(err, InvoiceError::MalformedDocument(_)), "{xml:?}");
        }
    }
}
