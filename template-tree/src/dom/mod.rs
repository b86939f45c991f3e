//! In-memory document model
//!
//! The document is the boundary templates render into: element creation,
//! `innerHTML`, `querySelector`/`querySelectorAll`, listener registration and
//! inline style mutation. Nodes live in an arena owned by the [`Document`];
//! [`Element`] and [`Fragment`] are cheap handles into it.
//!
//! Detached nodes stay in the arena. A document lives as long as the viewer
//! that owns it, so the arena is never compacted.
//!
//! # Example
//!
//! ```rust
//! use template_tree::dom::Document;
//!
//! let document = Document::new();
//! let body = document.body();
//! body.set_inner_html(r#"<div id="viewer"><canvas></canvas></div>"#);
//!
//! let viewer = document.get_element_by_id("viewer").unwrap();
//! assert!(viewer.query_selector("canvas").is_some());
//! ```

mod event;
mod parser;
mod selector;

pub use event::{DomEvent, ListenerId};
pub use parser::ParseError;
pub use selector::{Selector, SelectorError};

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use parser::{escape_attribute, escape_text, ParsedNode, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use selector::Matchable;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Fragment,
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    event_type: String,
    callback: Listener,
}

struct ElementView<'a> {
    tag: &'a str,
    attributes: &'a [(String, String)],
}

impl Matchable for ElementView<'_> {
    fn local_name(&self) -> &str {
        self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

struct DocumentInner {
    nodes: Vec<Node>,
    body: NodeId,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
}

impl DocumentInner {
    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn view(&self, id: NodeId) -> Option<ElementView<'_>> {
        match &self.node(id).data {
            NodeData::Element { tag, attributes } => Some(ElementView { tag, attributes }),
            _ => None,
        }
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.view(id).and_then(|view| {
            view.attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        })
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            let name = name.to_ascii_lowercase();
            match attributes.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => value.clone_into(existing),
                None => attributes.push((name, value.to_string())),
            }
        }
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn build(&mut self, parent: NodeId, parsed: Vec<ParsedNode>) -> Vec<NodeId> {
        let mut created = Vec::with_capacity(parsed.len());
        for node in parsed {
            let id = match node {
                ParsedNode::Element {
                    tag,
                    attributes,
                    children,
                } => {
                    let id = self.alloc(NodeData::Element { tag, attributes });
                    self.build(id, children);
                    id
                }
                ParsedNode::Text(text) => self.alloc(NodeData::Text(text)),
                ParsedNode::Comment(text) => self.alloc(NodeData::Comment(text)),
            };
            self.append(parent, id);
            created.push(id);
        }
        created
    }

    /// Element descendants of `root` in document order, excluding `root`
    fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if matches!(node.data, NodeData::Element { .. }) {
                found.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// Element ancestors of `id`, nearest first
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if self.view(parent).is_some() {
                found.push(parent);
            }
            current = self.node(parent).parent;
        }
        found
    }

    fn is_inclusive_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        candidate == of || self.ancestors(of).contains(&candidate)
    }

    fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.body, id)
    }

    fn select(&self, root: NodeId, selector: &Selector, first_only: bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        for id in self.descendant_elements(root) {
            let Some(view) = self.view(id) else { continue };
            let matched = selector.matches_with(&view, || {
                self.ancestors(id)
                    .into_iter()
                    .filter_map(|ancestor| self.view(ancestor))
                    .collect()
            });
            if matched {
                found.push(id);
                if first_only {
                    break;
                }
            }
        }
        found
    }

    fn serialize_children(&self, id: NodeId, out: &mut String) {
        let raw = self
            .view(id)
            .is_some_and(|view| RAW_TEXT_ELEMENTS.contains(&view.tag));
        for child in &self.node(id).children {
            if raw {
                if let NodeData::Text(text) = &self.node(*child).data {
                    out.push_str(text);
                    continue;
                }
            }
            self.serialize(*child, out);
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                self.serialize_children(id, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Fragment => self.serialize_children(id, out),
        }
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        for child in &self.node(id).children {
            match &self.node(*child).data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element { .. } | NodeData::Fragment => self.text_content(*child, out),
                NodeData::Comment(_) => {}
            }
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim();
            (!property.is_empty()).then(|| (property.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn render_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shared handle to a document tree
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Document {
    /// Create an empty document with a `body` root
    #[must_use]
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            nodes: Vec::new(),
            body: NodeId(0),
            listeners: Vec::new(),
            next_listener: 0,
        };
        inner.body = inner.alloc(NodeData::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// The `body` element every connected node descends from
    #[must_use]
    pub fn body(&self) -> Element {
        let body = self.inner.read().body;
        self.element(body)
    }

    /// Create a detached element
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.inner.write().alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        });
        self.element(id)
    }

    /// Find a connected element by its `id` attribute
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        let inner = self.inner.read();
        inner
            .descendant_elements(inner.body)
            .into_iter()
            .find(|node| inner.attribute(*node, "id") == Some(id))
            .map(|node| self.element(node))
    }

    /// Parse markup into a detached fragment
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the markup is not well balanced. Use
    /// [`Element::set_inner_html`] for permissive parsing.
    pub fn parse_fragment(&self, markup: &str) -> Result<Fragment, ParseError> {
        let parsed = parser::parse_strict(markup)?;
        let mut inner = self.inner.write();
        let node = inner.alloc(NodeData::Fragment);
        inner.build(node, parsed);
        Ok(Fragment {
            document: self.clone(),
            node,
        })
    }

    /// Number of registered event listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.read().listeners.len()
    }

    /// Whether two handles refer to the same document
    #[must_use]
    pub fn same_document(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Dispatch `event` at `target`; see [`Element::dispatch_event`]
    pub fn dispatch_event(&self, target: &Element, event: DomEvent) {
        if self.same_document(&target.document) {
            target.dispatch_event(event);
        }
    }

    /// Remove a listener by id, wherever it is registered
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.listeners.len();
        inner.listeners.retain(|entry| entry.id != id);
        inner.listeners.len() != before
    }

    fn element(&self, node: NodeId) -> Element {
        Element {
            document: self.clone(),
            node,
        }
    }

    fn elements(&self, nodes: Vec<NodeId>) -> Vec<Element> {
        nodes.into_iter().map(|node| self.element(node)).collect()
    }
}

/// Handle to an element node
#[derive(Clone)]
pub struct Element {
    document: Document,
    node: NodeId,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.document.same_document(&other.document)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.document.inner.read();
        let tag = inner.view(self.node).map_or("?", |view| view.tag);
        match inner.attribute(self.node, "id") {
            Some(id) => write!(f, "Element(<{tag}#{id}>)"),
            None => write!(f, "Element(<{tag}>)"),
        }
    }
}

impl Element {
    /// Owning document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Arena id of this element
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node
    }

    /// Upper-case tag name, as `Element.tagName` reports it
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.local_name().to_ascii_uppercase()
    }

    /// Lower-case tag name
    #[must_use]
    pub fn local_name(&self) -> String {
        self.document
            .inner
            .read()
            .view(self.node)
            .map(|view| view.tag.to_string())
            .unwrap_or_default()
    }

    /// Value of the `id` attribute; `None` when absent or empty
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// Set the `id` attribute
    pub fn set_id(&self, id: &str) {
        self.set_attribute("id", id);
    }

    /// Attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document
            .inner
            .read()
            .attribute(self.node, &name.to_ascii_lowercase())
            .map(ToString::to_string)
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.document.inner.write().set_attribute(self.node, name, value);
    }

    /// Remove an attribute
    pub fn remove_attribute(&self, name: &str) {
        self.document.inner.write().remove_attribute(self.node, name);
    }

    /// Whitespace-separated entries of the `class` attribute
    #[must_use]
    pub fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|classes| classes.split_ascii_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether the `class` attribute contains `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Inline style property value
    #[must_use]
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.attribute("style")?;
        parse_style(&style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set an inline style property; an empty value removes it
    pub fn set_style(&self, property: &str, value: &str) {
        let mut inner = self.document.inner.write();
        let mut declarations = parse_style(inner.attribute(self.node, "style").unwrap_or_default());
        let property = property.to_ascii_lowercase();
        declarations.retain(|(name, _)| *name != property);
        if !value.is_empty() {
            declarations.push((property, value.to_string()));
        }
        if declarations.is_empty() {
            inner.remove_attribute(self.node, "style");
        } else {
            inner.set_attribute(self.node, "style", &render_style(&declarations));
        }
    }

    /// Serialized children
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.document.inner.read().serialize_children(self.node, &mut out);
        out
    }

    /// Serialized element including its own tag
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.document.inner.read().serialize(self.node, &mut out);
        out
    }

    /// Concatenated text of all descendants
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.document.inner.read().text_content(self.node, &mut out);
        out
    }

    /// Replace the children with permissively parsed markup
    pub fn set_inner_html(&self, markup: &str) {
        let parsed = parser::parse_lenient(markup);
        let mut inner = self.document.inner.write();
        inner.clear_children(self.node);
        inner.build(self.node, parsed);
    }

    /// Append permissively parsed markup after the last child
    ///
    /// Returns the ids of the inserted top-level nodes.
    pub fn insert_adjacent_html_beforeend(&self, markup: &str) -> Vec<NodeId> {
        let parsed = parser::parse_lenient(markup);
        self.document.inner.write().build(self.node, parsed)
    }

    /// Append `child`, moving it from its current parent
    ///
    /// Returns `false` (and does nothing) if `child` belongs to another
    /// document or is an ancestor of this element.
    pub fn append_child(&self, child: &Self) -> bool {
        if !self.document.same_document(&child.document) {
            return false;
        }
        let mut inner = self.document.inner.write();
        if inner.is_inclusive_ancestor(child.node, self.node) {
            return false;
        }
        inner.append(self.node, child.node);
        true
    }

    /// Move every child of `fragment` to the end of this element
    ///
    /// Like a `DocumentFragment`, the fragment is left empty. Returns the ids
    /// of the moved nodes.
    pub fn append_fragment(&self, fragment: &Fragment) -> Vec<NodeId> {
        if !self.document.same_document(&fragment.document) {
            return Vec::new();
        }
        let mut inner = self.document.inner.write();
        let moved = std::mem::take(&mut inner.nodes[fragment.node.0].children);
        for child in &moved {
            inner.nodes[child.0].parent = None;
            inner.append(self.node, *child);
        }
        moved
    }

    /// Remove every child (`innerHTML = ""`)
    pub fn clear_children(&self) {
        self.document.inner.write().clear_children(self.node);
    }

    /// Detach the given nodes if they are still children of this element
    ///
    /// Returns how many were removed; nodes attached elsewhere are left alone.
    pub fn remove_children(&self, nodes: &[NodeId]) -> usize {
        let mut inner = self.document.inner.write();
        let mut removed = 0;
        for node in nodes {
            if node.0 < inner.nodes.len() && inner.node(*node).parent == Some(self.node) {
                inner.detach(*node);
                removed += 1;
            }
        }
        removed
    }

    /// Detach this element from its parent
    pub fn remove(&self) {
        self.document.inner.write().detach(self.node);
    }

    /// Parent element, if any
    #[must_use]
    pub fn parent_element(&self) -> Option<Self> {
        let parent = self.document.inner.read().ancestors(self.node).first().copied();
        parent.map(|node| self.document.element(node))
    }

    /// Whether this element descends from the document body
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.document.inner.read().is_connected(self.node)
    }

    /// Direct element children
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let children: Vec<NodeId> = {
            let inner = self.document.inner.read();
            inner
                .node(self.node)
                .children
                .iter()
                .copied()
                .filter(|child| inner.view(*child).is_some())
                .collect()
        };
        self.document.elements(children)
    }

    /// Element descendants in document order
    #[must_use]
    pub fn descendants(&self) -> Vec<Self> {
        let nodes = self.document.inner.read().descendant_elements(self.node);
        self.document.elements(nodes)
    }

    /// First descendant satisfying `predicate`, in document order
    pub fn find_descendant<F>(&self, predicate: F) -> Option<Self>
    where
        F: Fn(&Self) -> bool,
    {
        self.descendants().into_iter().find(|element| predicate(element))
    }

    /// First descendant matching `selector`; invalid selectors match nothing
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<Self> {
        self.select(selector, true).into_iter().next()
    }

    /// Every descendant matching `selector`; invalid selectors match nothing
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        self.select(selector, false)
    }

    fn select(&self, selector: &str, first_only: bool) -> Vec<Self> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(selector, error = %err, "invalid selector");
                return Vec::new();
            }
        };
        let nodes = self.document.inner.read().select(self.node, &parsed, first_only);
        self.document.elements(nodes)
    }

    /// Register a listener for `event_type` on this element
    pub fn add_event_listener<F>(&self, event_type: &str, callback: F) -> ListenerId
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        let mut inner = self.document.inner.write();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push(ListenerEntry {
            id,
            node: self.node,
            event_type: event_type.to_string(),
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a listener registered on this element
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.document.inner.write();
        let before = inner.listeners.len();
        inner
            .listeners
            .retain(|entry| !(entry.id == id && entry.node == self.node));
        inner.listeners.len() != before
    }

    /// Number of listeners registered on this element
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.document
            .inner
            .read()
            .listeners
            .iter()
            .filter(|entry| entry.node == self.node)
            .count()
    }

    /// Dispatch `event` at this element and bubble it to every ancestor
    ///
    /// Listeners run without any document lock held, so they may mutate the
    /// document.
    pub fn dispatch_event(&self, event: DomEvent) {
        let mut event = event;
        event.target = Some(self.clone());

        let path: Vec<NodeId> = {
            let inner = self.document.inner.read();
            std::iter::once(self.node).chain(inner.ancestors(self.node)).collect()
        };

        for node in path {
            let listeners: Vec<Listener> = self
                .document
                .inner
                .read()
                .listeners
                .iter()
                .filter(|entry| entry.node == node && entry.event_type == event.event_type())
                .map(|entry| Arc::clone(&entry.callback))
                .collect();
            if listeners.is_empty() {
                continue;
            }
            event.current_target = Some(self.document.element(node));
            for listener in listeners {
                listener(&event);
            }
        }
    }
}

/// Detached container produced by [`Document::parse_fragment`]
#[derive(Clone)]
pub struct Fragment {
    document: Document,
    node: NodeId,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment").field("markup", &self.inner_html()).finish()
    }
}

impl Fragment {
    /// Whether the fragment has no children left
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.inner.read().node(self.node).children.is_empty()
    }

    /// Element descendants in document order
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        let nodes = self.document.inner.read().descendant_elements(self.node);
        self.document.elements(nodes)
    }

    /// Every descendant matching `selector`; invalid selectors match nothing
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(parsed) = Selector::parse(selector) else {
            return Vec::new();
        };
        let nodes = self.document.inner.read().select(self.node, &parsed, false);
        self.document.elements(nodes)
    }

    /// Serialized content
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.document.inner.read().serialize_children(self.node, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inner_html_round_trip() {
        let document = Document::new();
        let body = document.body();
        body.set_inner_html(r#"<div id="a" class="x"><span>hi &amp; bye</span><br></div>"#);
        assert_eq!(
            body.inner_html(),
            r#"<div id="a" class="x"><span>hi &amp; bye</span><br></div>"#
        );
    }

    #[test]
    fn test_get_element_by_id_only_finds_connected() {
        let document = Document::new();
        let detached = document.create_element("div");
        detached.set_id("ghost");
        assert!(document.get_element_by_id("ghost").is_none());

        document.body().append_child(&detached);
        assert_eq!(document.get_element_by_id("ghost"), Some(detached));
    }

    #[test]
    fn test_fragment_append_moves_children() {
        let document = Document::new();
        let fragment = document.parse_fragment("<p>one</p><p>two</p>").unwrap();
        assert!(!fragment.is_empty());

        let body = document.body();
        let moved = body.append_fragment(&fragment);
        assert_eq!(moved.len(), 2);
        assert!(fragment.is_empty());
        assert_eq!(body.inner_html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_remove_children_tolerates_detached_nodes() {
        let document = Document::new();
        let body = document.body();
        let inserted = body.insert_adjacent_html_beforeend("<i>a</i><b>b</b>");
        body.clear_children();
        assert_eq!(body.remove_children(&inserted), 0);
    }

    #[test]
    fn test_query_selector_scoping() {
        let document = Document::new();
        let body = document.body();
        body.set_inner_html(
            r#"<nav><button class="btn">a</button></nav><main><button class="btn" id="b">b</button></main>"#,
        );
        let main = body.query_selector("main").unwrap();
        assert_eq!(main.query_selector_all(".btn").len(), 1);
        assert_eq!(body.query_selector_all(".btn").len(), 2);
        assert_eq!(body.query_selector("main .btn").unwrap().id().as_deref(), Some("b"));
        assert!(body.query_selector("#1bad").is_none());
    }

    #[test]
    fn test_style_mutation() {
        let document = Document::new();
        let el = document.create_element("div");
        el.set_style("display", "flex");
        el.set_style("color", "red");
        assert_eq!(el.style("display").as_deref(), Some("flex"));
        assert_eq!(el.attribute("style").as_deref(), Some("display: flex; color: red;"));

        el.set_style("display", "none");
        assert_eq!(el.style("display").as_deref(), Some("none"));
        el.set_style("display", "");
        el.set_style("color", "");
        assert!(el.attribute("style").is_none());
    }

    #[test]
    fn test_event_bubbles_to_ancestors() {
        let document = Document::new();
        let body = document.body();
        body.set_inner_html(r#"<div id="outer"><button id="inner"></button></div>"#);
        let outer = document.get_element_by_id("outer").unwrap();
        let inner = document.get_element_by_id("inner").unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let listener = outer.add_event_listener("click", move |event| {
            assert_eq!(event.target().and_then(Element::id).as_deref(), Some("inner"));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        inner.dispatch_event(DomEvent::new("click"));
        inner.dispatch_event(DomEvent::new("pointerdown"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(outer.remove_event_listener(listener));
        inner.dispatch_event(DomEvent::new("click"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(document.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let document = Document::new();
        let body = document.body();
        let target = body.clone();
        body.add_event_listener("click", move |_| target.set_inner_html("<p>clicked</p>"));
        body.dispatch_event(DomEvent::new("click"));
        assert_eq!(body.inner_html(), "<p>clicked</p>");
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let document = Document::new();
        let outer = document.create_element("div");
        let inner = document.create_element("span");
        assert!(outer.append_child(&inner));
        assert!(!inner.append_child(&outer));
        assert_eq!(inner.parent_element(), Some(outer));
    }

    #[test]
    fn test_tag_name_is_upper_case() {
        let document = Document::new();
        let el = document.create_element("Child-A");
        assert_eq!(el.local_name(), "child-a");
        assert_eq!(el.tag_name(), "CHILD-A");
    }
}
