//! Document capability used by the element processor.
//!
//! The host page is an external collaborator. Processing only needs to find
//! nodes, read an attribute, write markup and keep an opaque marker per node,
//! so that is all [`Document`] asks for. [`MemoryDocument`] is a small
//! in-memory implementation for tests and offline rendering.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// Tags whose content is never rendered; such elements always write to a
/// resolved target instead of themselves.
pub const SCRIPT_LIKE_TAGS: &[&str] = &["script", "template", "noscript", "style"];

pub fn is_script_like(tag: &str) -> bool {
    SCRIPT_LIKE_TAGS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(tag.trim()))
}

/// The subset of a page the processor touches.
///
/// Methods take `&self`: concurrent element pipelines share one document.
pub trait Document {
    type Node: Clone;

    /// All nodes carrying `attribute`, in document order.
    fn nodes_with_attribute(&self, attribute: &str) -> Vec<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn tag_name(&self, node: &Self::Node) -> String;

    /// Nodes matching a selector list (`a, b`), in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Node>;

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    fn has_mark(&self, node: &Self::Node, mark: &str) -> bool;

    fn set_mark(&self, node: &Self::Node, mark: &str);
}

/// Handle to an element of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element of a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub inner_html: String,
    marks: BTreeSet<String>,
    writes: usize,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.inner_html = html.to_string();
        self
    }
}

/// Flat in-memory document supporting `tag`, `#id` and `.class` selectors
/// (and compounds such as `span.badge`).
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: RefCell<Vec<Element>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element and return its handle.
    pub fn push(&self, element: Element) -> NodeId {
        let mut elements = self.elements.borrow_mut();
        elements.push(element);
        NodeId(elements.len() - 1)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        self.elements
            .borrow()
            .get(node.0)
            .map(|e| e.inner_html.clone())
            .unwrap_or_default()
    }

    /// How many times a node's content was written.
    pub fn writes(&self, node: NodeId) -> usize {
        self.elements.borrow().get(node.0).map_or(0, |e| e.writes)
    }

    /// Total number of content writes across the document.
    pub fn total_writes(&self) -> usize {
        self.elements.borrow().iter().map(|e| e.writes).sum()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn nodes_with_attribute(&self, attribute: &str) -> Vec<NodeId> {
        self.elements
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.attributes.contains_key(attribute))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.elements
            .borrow()
            .get(node.0)
            .and_then(|e| e.attributes.get(name).cloned())
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.elements
            .borrow()
            .get(node.0)
            .map(|e| e.tag.clone())
            .unwrap_or_default()
    }

    fn select_all(&self, selector: &str) -> Vec<NodeId> {
        let selectors: Vec<SimpleSelector> = selector
            .split(',')
            .filter_map(SimpleSelector::parse)
            .collect();

        self.elements
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, e)| selectors.iter().any(|s| s.matches(e)))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        if let Some(element) = self.elements.borrow_mut().get_mut(node.0) {
            element.inner_html = html.to_string();
            element.writes += 1;
        }
    }

    fn has_mark(&self, node: &NodeId, mark: &str) -> bool {
        self.elements
            .borrow()
            .get(node.0)
            .is_some_and(|e| e.marks.contains(mark))
    }

    fn set_mark(&self, node: &NodeId, mark: &str) {
        if let Some(element) = self.elements.borrow_mut().get_mut(node.0) {
            element.marks.insert(mark.to_string());
        }
    }
}

/// `tag#id.class.class`, every part optional.
#[derive(Debug, Default, PartialEq, Eq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SimpleSelector {
    fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        let mut parsed = Self::default();
        let mut kind = '\0';
        let mut current = String::new();
        for c in selector.chars().chain(std::iter::once('\0')) {
            if c == '#' || c == '.' || c == '\0' {
                if !current.is_empty() {
                    match kind {
                        '#' => parsed.id = Some(std::mem::take(&mut current)),
                        '.' => parsed.classes.push(std::mem::take(&mut current)),
                        _ => parsed.tag = Some(std::mem::take(&mut current).to_ascii_lowercase()),
                    }
                }
                kind = c;
            } else {
                current.push(c);
            }
        }
        Some(parsed)
    }

    fn matches(&self, element: &Element) -> bool {
        self.tag.as_ref().is_none_or(|t| *t == element.tag)
            && self
                .id
                .as_ref()
                .is_none_or(|id| element.id.as_ref() == Some(id))
            && self.classes.iter().all(|c| element.classes.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_like() {
        assert!(is_script_like("script"));
        assert!(is_script_like("SCRIPT"));
        assert!(is_script_like("template"));
        assert!(!is_script_like("span"));
    }

    #[test]
    fn test_selector_parse() {
        let s = SimpleSelector::parse("span#status.badge.big").unwrap();
        assert_eq!(s.tag.as_deref(), Some("span"));
        assert_eq!(s.id.as_deref(), Some("status"));
        assert_eq!(s.classes, vec!["badge", "big"]);
        assert_eq!(SimpleSelector::parse("  "), None);
    }

    #[test]
    fn test_select_all_multi_match() {
        let doc = MemoryDocument::new();
        let a = doc.push(Element::new("div").with_id("pkgstamp"));
        let _ = doc.push(Element::new("div").with_class("other"));
        let c = doc.push(Element::new("span").with_class("pkgstamp"));
        let d = doc.push(Element::new("p").with_id("pkgstamp").with_class("pkgstamp"));

        assert_eq!(doc.select_all("#pkgstamp, .pkgstamp"), vec![a, c, d]);
        assert_eq!(doc.select_all("span.pkgstamp"), vec![c]);
        assert_eq!(doc.select_all("P"), vec![d]);
        assert!(doc.select_all("#missing").is_empty());
    }

    #[test]
    fn test_marks_and_writes() {
        let doc = MemoryDocument::new();
        let node = doc.push(Element::new("span").with_html("loading"));
        assert_eq!(doc.inner_html(node), "loading");
        assert!(!doc.has_mark(&node, "done"));

        doc.set_inner_html(&node, "1.0.0");
        doc.set_mark(&node, "done");
        assert!(doc.has_mark(&node, "done"));
        assert_eq!(doc.inner_html(node), "1.0.0");
        assert_eq!(doc.writes(node), 1);
    }

    #[test]
    fn test_nodes_with_attribute() {
        let doc = MemoryDocument::new();
        let _ = doc.push(Element::new("div"));
        let b = doc.push(Element::new("span").with_attr("data-pkgstamp", "left-pad"));
        assert_eq!(doc.nodes_with_attribute("data-pkgstamp"), vec![b]);
        assert_eq!(doc.attribute(&b, "data-pkgstamp").as_deref(), Some("left-pad"));
        assert_eq!(doc.tag_name(&b), "span");
    }
}
