//! Reverse and parent axes.
//!
//! Ancestor, parent and preceding-sibling materialize their whole output into
//! a sorted, duplicate-free buffer during `evaluate` and replay it from
//! `advance`. Preceding streams instead: it walks the document forward from
//! the root and uses the ancestor chain of the last upstream node as a stop
//! list.
use std::rc::Rc;

use smallvec::SmallVec;

use super::{Query, QueryCursor};
use crate::error::Error;
use crate::order::{insert_sorted, is_document_ordered, DocumentOrderComparer};
use crate::plan::StepShape;
use crate::tree::{next_in_document, TreeCursor};
use crate::value::Value;

#[derive(Debug, Clone)]
struct CacheBase<C: TreeCursor> {
    input: Box<Query<C>>,
    shape: Rc<StepShape>,
    buffer: Vec<C>,
    /// Index of the next buffered node to hand out.
    position: usize,
    comparer: DocumentOrderComparer<C>,
    bound: bool,
}

impl<C: TreeCursor> CacheBase<C> {
    fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self { input, shape, buffer: Vec::new(), position: 0, comparer: DocumentOrderComparer::new(), bound: false }
    }

    #[inline]
    fn matches(&self, node: &C) -> bool {
        self.shape.test.matches(node, self.shape.principal_kind())
    }

    fn insert(&mut self, node: C) -> bool {
        let inserted = insert_sorted(&mut self.buffer, node, &mut self.comparer);
        debug_assert!(is_document_ordered(&self.buffer));
        inserted
    }

    /// Rebinds the upstream and clears (without freeing) the buffer.
    fn begin(&mut self, context: &C) -> Result<(), Error> {
        self.input.evaluate(context)?;
        self.buffer.clear();
        self.position = 0;
        self.bound = true;
        Ok(())
    }

    fn filled(&self) {
        tracing::trace!(axis = ?self.shape.axis, buffered = self.buffer.len(), "cache axis filled");
    }

    fn advance(&mut self, what: &str) -> Result<Option<C>, Error> {
        if !self.bound {
            return Err(Error::context_undefined(what));
        }
        match self.buffer.get(self.position) {
            Some(node) => {
                self.position += 1;
                Ok(Some(node.clone()))
            }
            None => Ok(None),
        }
    }

    fn current(&self) -> Option<&C> {
        self.position.checked_sub(1).and_then(|i| self.buffer.get(i))
    }

    fn known_count(&self) -> Option<usize> {
        self.bound.then_some(self.buffer.len())
    }
}

macro_rules! cache_axis {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name<C: TreeCursor> {
            cache: CacheBase<C>,
        }

        impl<C: TreeCursor> $name<C> {
            pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
                Self { cache: CacheBase::new(input, shape) }
            }
        }

        impl<C: TreeCursor> QueryCursor<C> for $name<C> {
            /// Replays the buffer; the upstream is not consulted again.
            fn reset(&mut self) {
                self.cache.position = 0;
            }

            fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
                self.cache.begin(context)?;
                self.fill()?;
                self.cache.filled();
                Ok(Value::NodeSet)
            }

            fn advance(&mut self) -> Result<Option<C>, Error> {
                self.cache.advance($label)
            }

            fn current(&self) -> Option<&C> {
                self.cache.current()
            }

            fn current_position(&self) -> usize {
                self.cache.position
            }

            fn known_count(&self) -> Option<usize> {
                self.cache.known_count()
            }

            fn shape_name(&self) -> &'static str {
                $label
            }
        }
    };
}

cache_axis!(AncestorQuery, "ancestor axis");
cache_axis!(ParentQuery, "parent axis");
cache_axis!(PrecedingSiblingQuery, "preceding-sibling axis");

impl<C: TreeCursor> AncestorQuery<C> {
    fn fill(&mut self) -> Result<(), Error> {
        let cache = &mut self.cache;
        while let Some(input) = cache.input.advance()? {
            if cache.shape.match_self && cache.matches(&input) && !cache.insert(input.clone()) {
                // already buffered, and so is every ancestor above it
                continue;
            }
            let mut ancestor = input;
            while ancestor.move_to_parent() {
                if cache.matches(&ancestor) && !cache.insert(ancestor.clone()) {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl<C: TreeCursor> ParentQuery<C> {
    fn fill(&mut self) -> Result<(), Error> {
        let cache = &mut self.cache;
        while let Some(mut node) = cache.input.advance()? {
            if node.move_to_parent() && cache.matches(&node) {
                cache.insert(node);
            }
        }
        Ok(())
    }
}

impl<C: TreeCursor> PrecedingSiblingQuery<C> {
    /// Inputs are handled last to first: once a parent has been seen, every
    /// earlier input under it has a subset of the siblings already buffered.
    fn fill(&mut self) -> Result<(), Error> {
        let cache = &mut self.cache;
        let mut inputs = Vec::new();
        while let Some(input) = cache.input.advance()? {
            inputs.push(input);
        }
        let mut visited_parents: SmallVec<[C; 8]> = SmallVec::new();
        while let Some(input) = inputs.pop() {
            if input.node_kind().is_attribute_like() {
                continue;
            }
            let mut sibling = input.clone();
            if !sibling.move_to_parent() {
                continue;
            }
            if visited_parents.iter().any(|p| p.is_same_position(&sibling)) {
                continue;
            }
            visited_parents.push(sibling.clone());
            if !sibling.move_to_first_child() {
                continue;
            }
            while !sibling.is_same_position(&input) {
                if cache.matches(&sibling) {
                    cache.insert(sibling.clone());
                }
                if !sibling.move_to_next_sibling() {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// `preceding::`: every node before the upstream's last node in document
/// order, excluding its ancestors, attributes and namespace nodes.
#[derive(Debug, Clone)]
pub struct PrecedingQuery<C: TreeCursor> {
    input: Box<Query<C>>,
    shape: Rc<StepShape>,
    walker: Option<C>,
    /// Ancestor chain of the sentinel, root on top.
    stop: SmallVec<[C; 16]>,
    /// The walker sits on the root and has not been examined yet.
    fresh: bool,
    done: bool,
    position: usize,
    current: Option<C>,
}

impl<C: TreeCursor> PrecedingQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self { input, shape, walker: None, stop: SmallVec::new(), fresh: false, done: false, position: 0, current: None }
    }

    fn clear(&mut self) {
        self.walker = None;
        self.stop.clear();
        self.fresh = false;
        self.done = false;
        self.position = 0;
        self.current = None;
    }

    /// Drains the upstream and prepares the walk. `false` when the upstream
    /// was empty.
    fn start(&mut self) -> Result<bool, Error> {
        let Some(mut last) = self.input.advance()? else { return Ok(false) };
        while let Some(next) = self.input.advance()? {
            last = next;
        }
        if last.node_kind().is_attribute_like() {
            last.move_to_parent();
        }
        loop {
            self.stop.push(last.clone());
            if !last.move_to_parent() {
                break;
            }
        }
        tracing::trace!(depth = self.stop.len(), "preceding sentinel found");
        self.walker = Some(last);
        self.fresh = true;
        Ok(true)
    }
}

impl<C: TreeCursor> QueryCursor<C> for PrecedingQuery<C> {
    fn reset(&mut self) {
        self.clear();
        self.input.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.input.evaluate(context)?;
        self.clear();
        Ok(Value::NodeSet)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        if self.done {
            return Ok(None);
        }
        if self.walker.is_none() && !self.start()? {
            self.done = true;
            return Ok(None);
        }
        let principal = self.shape.principal_kind();
        while let Some(walker) = self.walker.as_mut() {
            if !std::mem::take(&mut self.fresh) && !next_in_document(walker) {
                break;
            }
            if self.stop.last().is_some_and(|top| top.is_same_position(walker)) {
                self.stop.pop();
                if self.stop.is_empty() {
                    break;
                }
                continue;
            }
            if self.shape.test.matches(walker, principal) {
                let node = walker.clone();
                self.position += 1;
                self.current = Some(node.clone());
                return Ok(Some(node));
            }
        }
        self.walker = None;
        self.done = true;
        Ok(None)
    }

    fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.position
    }

    fn shape_name(&self) -> &'static str {
        "preceding axis"
    }
}
