//! Document order over cursors, including nodes from different documents.
use core::cmp::Ordering;

use crate::tree::{NodeOrder, TreeCursor};

/// Total order over cursors.
///
/// Nodes of one document compare by `compare_position`. Nodes of different
/// documents compare by the order in which their roots were first seen by
/// this comparer; that order never changes once assigned.
#[derive(Debug, Clone)]
pub struct DocumentOrderComparer<C> {
    roots: Vec<C>,
}

impl<C> Default for DocumentOrderComparer<C> {
    fn default() -> Self {
        Self { roots: Vec::new() }
    }
}

impl<C: TreeCursor> DocumentOrderComparer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(&mut self, a: &C, b: &C) -> Ordering {
        match a.compare_position(b) {
            NodeOrder::Before => Ordering::Less,
            NodeOrder::Same => Ordering::Equal,
            NodeOrder::After => Ordering::Greater,
            NodeOrder::Unknown => {
                let ia = self.document_index(a);
                let ib = self.document_index(b);
                ia.cmp(&ib)
            }
        }
    }

    /// Stable index of the document containing `node`, registering its root
    /// on first sight.
    pub fn document_index(&mut self, node: &C) -> usize {
        let mut root = node.clone();
        root.move_to_root();
        if let Some(i) = self.roots.iter().position(|r| r.is_same_position(&root)) {
            return i;
        }
        self.roots.push(root);
        let index = self.roots.len() - 1;
        tracing::debug!(index, "registered document root");
        index
    }
}

/// Inserts `node` into the sorted, duplicate-free `buffer`.
///
/// Returns `false` (and leaves the buffer untouched) when an equal position
/// is already present.
pub fn insert_sorted<C: TreeCursor>(buffer: &mut Vec<C>, node: C, comparer: &mut DocumentOrderComparer<C>) -> bool {
    if let Some(last) = buffer.last() {
        match comparer.compare(last, &node) {
            Ordering::Less => {}
            Ordering::Equal => return false,
            Ordering::Greater => {
                return match buffer.binary_search_by(|probe| comparer.compare(probe, &node)) {
                    Ok(_) => false,
                    Err(at) => {
                        buffer.insert(at, node);
                        true
                    }
                };
            }
        }
    }
    buffer.push(node);
    true
}

/// `true` when `seq` is strictly ascending in document order.
pub fn is_document_ordered<C: TreeCursor>(seq: &[C]) -> bool {
    let mut comparer = DocumentOrderComparer::new();
    seq.windows(2).all(|w| comparer.compare(&w[0], &w[1]) == Ordering::Less)
}
