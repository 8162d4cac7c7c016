//! Structured rich-text field values.
//!
//! A [`RichText`] is an XML fragment parsed into a small node tree. It is
//! stored as its serialized text in snapshots and re-validated on load.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static LINK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<link\s+url_id="\d+">"#).expect("valid link regex"));
static LINK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</link>").expect("valid link regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RichTextError {
    #[error("malformed markup: {0}")]
    Malformed(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("{0} is not supported in rich text")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<name/>` when it has no children.
    pub self_closing: bool,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    declaration: Option<Declaration>,
    nodes: Vec<Node>,
}

impl RichText {
    pub fn parse(xml: &str) -> Result<Self, RichTextError> {
        let mut reader = Reader::from_str(xml);
        let mut declaration = None;
        let mut open: Vec<Element> = Vec::new();
        let mut roots: Vec<Node> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| RichTextError::Malformed(e.to_string()))?;
            match event {
                Event::Start(start) => open.push(element_from(&start, false)?),
                Event::Empty(start) => {
                    let element = element_from(&start, true)?;
                    attach(&mut open, &mut roots, Node::Element(element));
                },
                Event::End(_) => {
                    let element = open.pop().ok_or_else(|| {
                        RichTextError::Malformed("closing tag without opening tag".to_string())
                    })?;
                    attach(&mut open, &mut roots, Node::Element(element));
                },
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| RichTextError::Malformed(e.to_string()))?;
                    if !text.is_empty() {
                        attach(&mut open, &mut roots, Node::Text(text.into_owned()));
                    }
                },
                Event::CData(data) => {
                    let data = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| RichTextError::Malformed(e.to_string()))?;
                    attach(&mut open, &mut roots, Node::CData(data));
                },
                Event::Comment(comment) => {
                    let comment = String::from_utf8(comment.into_inner().into_owned())
                        .map_err(|e| RichTextError::Malformed(e.to_string()))?;
                    attach(&mut open, &mut roots, Node::Comment(comment));
                },
                Event::Decl(decl) => {
                    if declaration.is_some() || !roots.is_empty() || !open.is_empty() {
                        return Err(RichTextError::Malformed(
                            "XML declaration must come first".to_string(),
                        ));
                    }
                    let malformed = |e: &dyn fmt::Display| RichTextError::Malformed(e.to_string());
                    let version = decl.version().map_err(|e| malformed(&e))?;
                    let encoding = match decl.encoding() {
                        Some(value) => Some(lossy(&value.map_err(|e| malformed(&e))?)),
                        None => None,
                    };
                    let standalone = match decl.standalone() {
                        Some(value) => Some(lossy(&value.map_err(|e| malformed(&e))?)),
                        None => None,
                    };
                    declaration = Some(Declaration {
                        version: lossy(&version),
                        encoding,
                        standalone,
                    });
                },
                Event::PI(_) => return Err(RichTextError::Unsupported("processing instruction")),
                Event::DocType(_) => return Err(RichTextError::Unsupported("document type")),
                Event::Eof => break,
            }
        }

        if let Some(element) = open.pop() {
            return Err(RichTextError::Unclosed(element.name));
        }

        Ok(Self {
            declaration,
            nodes: roots,
        })
    }

    /// True when the document holds no elements and only whitespace text.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Text(text) => text.trim().is_empty(),
            Node::Comment(_) => true,
            Node::Element(_) | Node::CData(_) => false,
        })
    }

    /// Serialize back to markup.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str("<?xml version=\"");
            out.push_str(&decl.version);
            out.push('"');
            if let Some(encoding) = &decl.encoding {
                out.push_str(" encoding=\"");
                out.push_str(encoding);
                out.push('"');
            }
            if let Some(standalone) = &decl.standalone {
                out.push_str(" standalone=\"");
                out.push_str(standalone);
                out.push('"');
            }
            out.push_str("?>");
        }
        for node in &self.nodes {
            write_node(&mut out, node);
        }
        out
    }

    /// Number of elements accepted by `matches`, nested ones included.
    pub fn count_elements(&self, matches: impl Fn(&Element) -> bool) -> usize {
        fn count(nodes: &[Node], matches: &dyn Fn(&Element) -> bool) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Element(el) => usize::from(matches(el)) + count(&el.children, matches),
                    _ => 0,
                })
                .sum()
        }
        count(&self.nodes, &matches)
    }

    /// Remove every element accepted by `matches`, splicing its children
    /// into the parent in place. Returns the cleaned document and the number
    /// of elements removed.
    pub fn unwrap_elements(&self, matches: impl Fn(&Element) -> bool) -> (Self, usize) {
        let mut removed = 0;
        let nodes = unwrap_nodes(&self.nodes, &matches, &mut removed);
        (
            Self {
                declaration: self.declaration.clone(),
                nodes,
            },
            removed,
        )
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

impl Serialize for RichText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_xml())
    }
}

impl<'de> Deserialize<'de> for RichText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let xml = String::deserialize(deserializer)?;
        Self::parse(&xml).map_err(de::Error::custom)
    }
}

/// Strip `<link url_id="N">` and `</link>` from serialized markup with two
/// regular expressions. Assumes links are flat and well formed; the result
/// must be re-parsed to find out whether that held. Returns the text and the
/// number of opening tags removed.
pub fn strip_link_tags(xml: &str) -> (String, usize) {
    let removed = LINK_OPEN.find_iter(xml).count();
    let without_open = LINK_OPEN.replace_all(xml, "");
    let cleaned = LINK_CLOSE.replace_all(&without_open, "");
    (cleaned.into_owned(), removed)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn element_from(start: &BytesStart<'_>, self_closing: bool) -> Result<Element, RichTextError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| RichTextError::Malformed(e.to_string()))?
        .to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| RichTextError::Malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| RichTextError::Malformed(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| RichTextError::Malformed(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        self_closing,
    })
}

fn attach(open: &mut [Element], roots: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn unwrap_nodes(
    nodes: &[Node],
    matches: &dyn Fn(&Element) -> bool,
    removed: &mut usize,
) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) if matches(el) => {
                *removed += 1;
                for child in unwrap_nodes(&el.children, matches, removed) {
                    push_merged(&mut out, child);
                }
            },
            Node::Element(el) => {
                let mut el = el.clone();
                el.children = unwrap_nodes(&el.children, matches, removed);
                out.push(Node::Element(el));
            },
            other => push_merged(&mut out, other.clone()),
        }
    }
    out
}

// Adjacent text runs left behind by an unwrapped element become one node.
fn push_merged(out: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &node) {
        prev.push_str(next);
        return;
    }
    out.push(node);
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        },
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        },
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value.as_str()));
                out.push('"');
            }
            if el.children.is_empty() && el.self_closing {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        },
    }
}
