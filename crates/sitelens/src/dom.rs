//! Owned DOM tree built from a `scraper` parse.
//!
//! `scraper::Html` is neither `Send` nor cheap to mutate, so every pass
//! converts it once into this plain tree. Removal and serialization are pure
//! operations that produce new trees or strings; nodes are addressed by
//! their child-index path from the root.

use scraper::{ElementRef, Html};

/// Nodes nested deeper than this are dropped during conversion.
pub const MAX_DEPTH: usize = 512;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose text never counts as readable content.
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Child-index address of a node relative to some root element.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Parse markup and convert the document into an owned tree rooted at `<html>`.
pub fn parse(html: &str) -> Element {
    let document = Html::parse_document(html);
    from_html(&document)
}

/// Convert an already parsed document.
pub fn from_html(document: &Html) -> Element {
    convert(document.root_element(), 0)
}

fn convert(el: ElementRef<'_>, depth: usize) -> Element {
    let value = el.value();
    let mut element = Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children: Vec::new(),
    };
    if depth >= MAX_DEPTH {
        return element;
    }
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            element
                .children
                .push(Node::Element(convert(child_el, depth + 1)));
        } else if let scraper::Node::Text(text) = child.value() {
            let content: &str = text;
            element.children.push(Node::Text(content.to_string()));
        }
    }
    element
}

impl Element {
    pub fn with_children(tag: &str, children: Vec<Node>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Attribute lookup, ASCII case-insensitive on the name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document (pre-)order, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            out.push(child);
            child.collect_descendants(out);
        }
    }

    /// Descendants whose tag is one of `tags`, in document order.
    pub fn find_all(&self, tags: &[&str]) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| tags.contains(&el.tag.as_str()))
            .collect()
    }

    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|el| el.is(tag))
    }

    pub fn contains_any(&self, tags: &[&str]) -> bool {
        self.descendants()
            .iter()
            .any(|el| tags.contains(&el.tag.as_str()))
    }

    /// Readable text: each text node whitespace-collapsed, empties skipped,
    /// joined with single spaces.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        if NON_TEXT_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            match child {
                Node::Element(el) => el.collect_text(out),
                Node::Text(t) => {
                    let collapsed = t.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !collapsed.is_empty() {
                        out.push(collapsed);
                    }
                }
            }
        }
    }

    /// Whether the element holds any text or child elements at all.
    pub fn has_content(&self) -> bool {
        self.children.iter().any(|c| match c {
            Node::Element(_) => true,
            Node::Text(t) => !t.trim().is_empty(),
        })
    }

    /// Resolve a child-index path relative to this element.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let node = self.children.get(*first)?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            Node::Element(el) => el.node_at(rest),
            Node::Text(_) => None,
        }
    }

    /// Copy of this tree with the nodes at `paths` (and their subtrees) removed.
    pub fn without(&self, paths: &[NodePath]) -> Element {
        let mut prefix = Vec::new();
        self.without_at(&mut prefix, paths)
    }

    fn without_at(&self, prefix: &mut Vec<usize>, paths: &[NodePath]) -> Element {
        let mut copy = Element {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: Vec::with_capacity(self.children.len()),
        };
        for (i, child) in self.children.iter().enumerate() {
            prefix.push(i);
            if !paths.iter().any(|p| p.as_slice() == prefix.as_slice()) {
                let kept = match child {
                    Node::Element(el) if paths.iter().any(|p| p.starts_with(prefix.as_slice())) => {
                        Node::Element(el.without_at(prefix, paths))
                    }
                    other => other.clone(),
                };
                copy.children.push(kept);
            }
            prefix.pop();
        }
        copy
    }

    /// Serialize this element and its subtree to markup.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(value, true, out);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_html(out),
                Node::Text(t) if raw => out.push_str(t),
                Node::Text(t) => escape_into(t, false, out),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
