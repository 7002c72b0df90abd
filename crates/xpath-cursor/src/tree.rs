//! The navigable-cursor capability every query is built on.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

impl NodeKind {
    /// Attributes and namespace nodes hang off an element without being its children.
    #[inline]
    pub fn is_attribute_like(self) -> bool {
        matches!(self, NodeKind::Attribute | NodeKind::Namespace)
    }
}

/// Relative position of two cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOrder {
    Before,
    Same,
    After,
    /// The cursors live in different documents.
    Unknown,
}

/// A movable position over a tree.
///
/// Cloning yields an independent cursor at the same position and never moves
/// the source. Identity is by position (`is_same_position`), not by instance.
/// Failed moves return `false` and leave the cursor where it was.
pub trait TreeCursor: Clone + fmt::Debug {
    fn move_to_parent(&mut self) -> bool;
    fn move_to_first_child(&mut self) -> bool;
    /// Moves to the next child of the same parent. Always `false` on
    /// attribute and namespace nodes.
    fn move_to_next_sibling(&mut self) -> bool;
    fn move_to_first_attribute(&mut self) -> bool;
    fn move_to_next_attribute(&mut self) -> bool;
    /// Moves to the first in-scope namespace node of an element.
    fn move_to_first_namespace(&mut self) -> bool;
    fn move_to_next_namespace(&mut self) -> bool;
    /// Moves onto the position of `other` if both belong to the same document.
    fn move_to(&mut self, other: &Self) -> bool;

    fn compare_position(&self, other: &Self) -> NodeOrder;
    fn is_same_position(&self, other: &Self) -> bool;

    fn node_kind(&self) -> NodeKind;
    fn local_name(&self) -> &str;
    fn namespace_uri(&self) -> &str;
    /// String value: text content for elements and documents, the literal
    /// value for every other node kind.
    fn value(&self) -> String;

    fn move_to_root(&mut self) {
        while self.move_to_parent() {}
    }

    /// `true` if `other` lies strictly inside the subtree rooted at `self`.
    fn is_descendant(&self, other: &Self) -> bool {
        let mut probe = other.clone();
        while probe.move_to_parent() {
            if probe.is_same_position(self) {
                return true;
            }
        }
        false
    }
}

/// Advances `cursor` to its pre-order successor without leaving the subtree
/// rooted at `anchor`. Attributes and namespaces are not visited.
pub(crate) fn next_in_subtree<C: TreeCursor>(cursor: &mut C, anchor: &C) -> bool {
    if cursor.move_to_first_child() {
        return true;
    }
    loop {
        if cursor.is_same_position(anchor) {
            return false;
        }
        if cursor.move_to_next_sibling() {
            return true;
        }
        if !cursor.move_to_parent() {
            return false;
        }
    }
}

/// Advances `cursor` to its pre-order successor in the whole document.
pub(crate) fn next_in_document<C: TreeCursor>(cursor: &mut C) -> bool {
    if cursor.move_to_first_child() {
        return true;
    }
    let mut probe = cursor.clone();
    loop {
        if probe.move_to_next_sibling() {
            *cursor = probe;
            return true;
        }
        if !probe.move_to_parent() {
            return false;
        }
    }
}
