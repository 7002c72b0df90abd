//! Simple in-memory arena tree implementing [`TreeCursor`], used in tests,
//! benchmarks and as a reference adapter.
//!
//! Nodes are stored in document order: an element is followed by its
//! attributes and then by its children, so arena index order *is* document
//! order. Namespace nodes are not stored; they are derived from the
//! declarations in scope and sort between their element and its attributes.
//!
//! ```
//! use xpath_cursor::simple_tree::{attr, doc, elem, ns, text};
//! use xpath_cursor::{NodeKind, TreeCursor};
//!
//! // <root xmlns:p="urn:one" id="r"><child>Hello</child></root>
//! let document = doc()
//!     .child(
//!         elem("root")
//!             .namespace(ns("p", "urn:one"))
//!             .attr(attr("id", "r"))
//!             .child(elem("child").child(text("Hello"))),
//!     )
//!     .build();
//!
//! let mut cursor = document.clone();
//! assert!(cursor.move_to_first_child());
//! assert_eq!(cursor.local_name(), "root");
//! assert_eq!(cursor.value(), "Hello");
//! assert!(cursor.move_to_first_namespace());
//! assert_eq!(cursor.node_kind(), NodeKind::Namespace);
//! assert_eq!(cursor.value(), "urn:one");
//! ```
use std::fmt;
use std::rc::Rc;

use crate::tree::{NodeKind, NodeOrder, TreeCursor};

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    local: String,
    ns_uri: String,
    value: String,
    parent: Option<usize>,
    first_child: Option<usize>,
    next_sibling: Option<usize>,
    attributes: Vec<usize>,
    /// `(prefix, uri)` declarations made on this element.
    ns_decls: Vec<(String, String)>,
}

/// Arena storage shared by every cursor over one document.
#[derive(Debug)]
pub struct SimpleTree {
    nodes: Vec<NodeData>,
}

impl SimpleTree {
    /// In-scope namespaces of `owner`, nearest declaration first. A
    /// declaration with an empty URI hides the prefix.
    fn in_scope_namespaces(&self, owner: usize) -> Vec<(&str, &str)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        let mut at = Some(owner);
        while let Some(idx) = at {
            let node = &self.nodes[idx];
            for (prefix, uri) in &node.ns_decls {
                if seen.contains(&prefix.as_str()) {
                    continue;
                }
                seen.push(prefix);
                if !uri.is_empty() {
                    out.push((prefix.as_str(), uri.as_str()));
                }
            }
            at = node.parent;
        }
        out
    }

    fn text_content(&self, idx: usize, out: &mut String) {
        let mut child = self.nodes[idx].first_child;
        while let Some(c) = child {
            match self.nodes[c].kind {
                NodeKind::Text => out.push_str(&self.nodes[c].value),
                NodeKind::Element => self.text_content(c, out),
                _ => {}
            }
            child = self.nodes[c].next_sibling;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NsPos {
    index: usize,
}

/// A position inside a [`SimpleTree`].
#[derive(Clone)]
pub struct SimpleCursor {
    tree: Rc<SimpleTree>,
    node: usize,
    /// Set while positioned on the `index`-th in-scope namespace of `node`.
    ns: Option<NsPos>,
}

impl SimpleCursor {
    fn data(&self) -> &NodeData {
        &self.tree.nodes[self.node]
    }

    fn namespace_entry(&self) -> Option<(&str, &str)> {
        let pos = self.ns?;
        self.tree.in_scope_namespaces(self.node).get(pos.index).copied()
    }

    /// Document-order key: `(arena index, 0, 0)` for stored nodes and
    /// `(owner, 1, index)` for namespace nodes.
    fn order_key(&self) -> (usize, u8, usize) {
        match self.ns {
            Some(pos) => (self.node, 1, pos.index),
            None => (self.node, 0, 0),
        }
    }

    /// First element named `local` in document order, starting from this
    /// cursor's document.
    pub fn find_element(&self, local: &str) -> Option<SimpleCursor> {
        self.find_all(local).into_iter().next()
    }

    /// All elements named `local`, in document order.
    pub fn find_all(&self, local: &str) -> Vec<SimpleCursor> {
        self.tree
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Element && n.local == local)
            .map(|(idx, _)| SimpleCursor { tree: self.tree.clone(), node: idx, ns: None })
            .collect()
    }

    /// Attribute `local` of the element under this cursor.
    pub fn attribute(&self, local: &str) -> Option<SimpleCursor> {
        if self.ns.is_some() {
            return None;
        }
        self.data()
            .attributes
            .iter()
            .find(|&&a| self.tree.nodes[a].local == local)
            .map(|&a| SimpleCursor { tree: self.tree.clone(), node: a, ns: None })
    }
}

impl PartialEq for SimpleCursor {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_position(other)
    }
}
impl Eq for SimpleCursor {}

impl fmt::Debug for SimpleCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.node_kind();
        match kind {
            NodeKind::Element | NodeKind::Attribute | NodeKind::Namespace | NodeKind::ProcessingInstruction => {
                write!(f, "{kind:?}({})#{}", self.local_name(), self.node)
            }
            _ => write!(f, "{kind:?}#{}", self.node),
        }
    }
}

impl TreeCursor for SimpleCursor {
    fn move_to_parent(&mut self) -> bool {
        if self.ns.is_some() {
            self.ns = None;
            return true;
        }
        match self.data().parent {
            Some(p) => {
                self.node = p;
                true
            }
            None => false,
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        if self.ns.is_some() {
            return false;
        }
        match self.data().first_child {
            Some(c) => {
                self.node = c;
                true
            }
            None => false,
        }
    }

    fn move_to_next_sibling(&mut self) -> bool {
        if self.ns.is_some() || self.data().kind == NodeKind::Attribute {
            return false;
        }
        match self.data().next_sibling {
            Some(s) => {
                self.node = s;
                true
            }
            None => false,
        }
    }

    fn move_to_first_attribute(&mut self) -> bool {
        if self.ns.is_some() {
            return false;
        }
        match self.data().attributes.first() {
            Some(&a) => {
                self.node = a;
                true
            }
            None => false,
        }
    }

    fn move_to_next_attribute(&mut self) -> bool {
        if self.ns.is_some() || self.data().kind != NodeKind::Attribute {
            return false;
        }
        let Some(owner) = self.data().parent else { return false };
        let attrs = &self.tree.nodes[owner].attributes;
        let next = attrs.iter().position(|&a| a == self.node).and_then(|i| attrs.get(i + 1)).copied();
        match next {
            Some(a) => {
                self.node = a;
                true
            }
            None => false,
        }
    }

    fn move_to_first_namespace(&mut self) -> bool {
        if self.ns.is_some() || self.data().kind != NodeKind::Element {
            return false;
        }
        if self.tree.in_scope_namespaces(self.node).is_empty() {
            return false;
        }
        self.ns = Some(NsPos { index: 0 });
        true
    }

    fn move_to_next_namespace(&mut self) -> bool {
        let Some(pos) = self.ns else { return false };
        if pos.index + 1 < self.tree.in_scope_namespaces(self.node).len() {
            self.ns = Some(NsPos { index: pos.index + 1 });
            true
        } else {
            false
        }
    }

    fn move_to(&mut self, other: &Self) -> bool {
        if !Rc::ptr_eq(&self.tree, &other.tree) {
            return false;
        }
        self.node = other.node;
        self.ns = other.ns;
        true
    }

    fn compare_position(&self, other: &Self) -> NodeOrder {
        if !Rc::ptr_eq(&self.tree, &other.tree) {
            return NodeOrder::Unknown;
        }
        match self.order_key().cmp(&other.order_key()) {
            std::cmp::Ordering::Less => NodeOrder::Before,
            std::cmp::Ordering::Equal => NodeOrder::Same,
            std::cmp::Ordering::Greater => NodeOrder::After,
        }
    }

    fn is_same_position(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.node == other.node && self.ns == other.ns
    }

    fn node_kind(&self) -> NodeKind {
        if self.ns.is_some() { NodeKind::Namespace } else { self.data().kind }
    }

    fn local_name(&self) -> &str {
        if self.ns.is_some() {
            return self.namespace_entry().map_or("", |(prefix, _)| prefix);
        }
        &self.data().local
    }

    fn namespace_uri(&self) -> &str {
        if self.ns.is_some() {
            return "";
        }
        &self.data().ns_uri
    }

    fn value(&self) -> String {
        if self.ns.is_some() {
            return self.namespace_entry().map_or_else(String::new, |(_, uri)| uri.to_string());
        }
        match self.data().kind {
            NodeKind::Document | NodeKind::Element => {
                let mut out = String::new();
                self.tree.text_content(self.node, &mut out);
                out
            }
            _ => self.data().value.clone(),
        }
    }
}

/// Builder for one node and, for documents and elements, its content.
#[derive(Debug, Clone)]
pub struct SimpleNodeBuilder {
    kind: NodeKind,
    local: String,
    ns_uri: String,
    value: String,
    attributes: Vec<SimpleNodeBuilder>,
    namespaces: Vec<SimpleNodeBuilder>,
    children: Vec<SimpleNodeBuilder>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, local: &str, ns_uri: &str, value: &str) -> Self {
        Self {
            kind,
            local: local.to_string(),
            ns_uri: ns_uri.to_string(),
            value: value.to_string(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: SimpleNodeBuilder) -> Self {
        debug_assert!(!child.kind.is_attribute_like() && child.kind != NodeKind::Document);
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = SimpleNodeBuilder>>(mut self, it: I) -> Self {
        for c in it {
            self = self.child(c);
        }
        self
    }

    pub fn attr(mut self, attr: SimpleNodeBuilder) -> Self {
        debug_assert!(attr.kind == NodeKind::Attribute);
        self.attributes.push(attr);
        self
    }

    pub fn namespace(mut self, ns: SimpleNodeBuilder) -> Self {
        debug_assert!(ns.kind == NodeKind::Namespace);
        self.namespaces.push(ns);
        self
    }

    /// Builds the tree and returns a cursor on its root.
    pub fn build(self) -> SimpleCursor {
        let mut nodes = Vec::new();
        push_node(&mut nodes, self, None);
        SimpleCursor { tree: Rc::new(SimpleTree { nodes }), node: 0, ns: None }
    }
}

fn push_node(nodes: &mut Vec<NodeData>, b: SimpleNodeBuilder, parent: Option<usize>) -> usize {
    let idx = nodes.len();
    nodes.push(NodeData {
        kind: b.kind,
        local: b.local,
        ns_uri: b.ns_uri,
        value: b.value,
        parent,
        first_child: None,
        next_sibling: None,
        attributes: Vec::new(),
        ns_decls: b.namespaces.into_iter().map(|n| (n.local, n.value)).collect(),
    });
    for a in b.attributes {
        let a_idx = push_node(nodes, a, Some(idx));
        nodes[idx].attributes.push(a_idx);
    }
    let mut prev: Option<usize> = None;
    for c in b.children {
        let c_idx = push_node(nodes, c, Some(idx));
        match prev {
            Some(p) => nodes[p].next_sibling = Some(c_idx),
            None => nodes[idx].first_child = Some(c_idx),
        }
        prev = Some(c_idx);
    }
    idx
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Document, "", "", "")
}
pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Element, name, "", "")
}
pub fn elem_ns(uri: &str, name: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Element, name, uri, "")
}
pub fn text(v: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Text, "", "", v)
}
pub fn attr(name: &str, v: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Attribute, name, "", v)
}
pub fn attr_ns(uri: &str, name: &str, v: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Attribute, name, uri, v)
}
pub fn ns(prefix: &str, uri: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Namespace, prefix, "", uri)
}
pub fn comment(v: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Comment, "", "", v)
}
pub fn pi(target: &str, data: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::ProcessingInstruction, target, "", data)
}
