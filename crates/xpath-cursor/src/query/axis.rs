//! Forward axes: context/root, child, attribute, descendant,
//! following-sibling and namespace.
use std::rc::Rc;

use smallvec::SmallVec;

use super::{Query, QueryCursor};
use crate::error::Error;
use crate::plan::StepShape;
use crate::tree::{next_in_subtree, NodeKind, TreeCursor};
use crate::value::Value;

/// `.` or, with `root`, `/`.
#[derive(Debug, Clone)]
pub struct ContextQuery<C> {
    root: bool,
    context: Option<C>,
    position: usize,
}

impl<C: TreeCursor> ContextQuery<C> {
    pub(crate) fn new(root: bool) -> Self {
        Self { root, context: None, position: 0 }
    }
}

impl<C: TreeCursor> QueryCursor<C> for ContextQuery<C> {
    fn reset(&mut self) {
        self.position = 0;
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        let mut node = context.clone();
        if self.root {
            node.move_to_root();
        }
        self.context = Some(node);
        self.position = 0;
        Ok(Value::NodeSet)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        let Some(context) = &self.context else {
            return Err(Error::context_undefined(self.shape_name()));
        };
        if self.position == 0 {
            self.position = 1;
            return Ok(Some(context.clone()));
        }
        Ok(None)
    }

    fn current(&self) -> Option<&C> {
        if self.position == 0 { None } else { self.context.as_ref() }
    }

    fn current_position(&self) -> usize {
        self.position
    }

    fn known_count(&self) -> Option<usize> {
        self.context.as_ref().map(|_| 1)
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        if self.root && candidate.node_kind() != NodeKind::Document {
            return Ok(None);
        }
        Ok(Some(candidate.clone()))
    }

    fn shape_name(&self) -> &'static str {
        if self.root { "root" } else { "context" }
    }
}

/// State shared by every forward axis: upstream, step shape and output
/// position.
#[derive(Debug, Clone)]
struct AxisBase<C: TreeCursor> {
    input: Box<Query<C>>,
    shape: Rc<StepShape>,
    position: usize,
    current: Option<C>,
}

impl<C: TreeCursor> AxisBase<C> {
    fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self { input, shape, position: 0, current: None }
    }

    #[inline]
    fn matches(&self, node: &C) -> bool {
        self.shape.test.matches(node, self.shape.principal_kind())
    }

    fn emit(&mut self, node: &C) -> Option<C> {
        self.position += 1;
        self.current = Some(node.clone());
        Some(node.clone())
    }

    fn reset(&mut self) {
        self.position = 0;
        self.current = None;
        self.input.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.input.evaluate(context)?;
        self.position = 0;
        self.current = None;
        Ok(Value::NodeSet)
    }

    /// Hands the candidate's owner (its parent) to the upstream pattern.
    fn match_parent(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        let mut parent = candidate.clone();
        if parent.move_to_parent() { self.input.match_node(&parent) } else { Ok(None) }
    }
}

/// Expands each upstream node with `first`/`next` moves; positions restart
/// for every upstream node. The nodes reached this way precede the owner's
/// descendants, so nested upstream nodes keep the output ordered.
macro_rules! per_context_axis {
    ($name:ident, $first:ident, $next:ident, $label:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name<C: TreeCursor> {
            base: AxisBase<C>,
            walker: Option<C>,
        }

        impl<C: TreeCursor> $name<C> {
            pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
                Self { base: AxisBase::new(input, shape), walker: None }
            }
        }

        impl<C: TreeCursor> QueryCursor<C> for $name<C> {
            fn reset(&mut self) {
                self.walker = None;
                self.base.reset();
            }

            fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
                self.walker = None;
                self.base.evaluate(context)
            }

            fn advance(&mut self) -> Result<Option<C>, Error> {
                loop {
                    let moved = self.walker.as_mut().is_some_and(|walker| walker.$next());
                    if !moved {
                        loop {
                            let Some(mut input) = self.base.input.advance()? else {
                                self.walker = None;
                                return Ok(None);
                            };
                            self.base.position = 0;
                            if input.$first() {
                                self.walker = Some(input);
                                break;
                            }
                        }
                    }
                    if let Some(node) = self.walker.clone()
                        && self.accepts(&node)
                    {
                        return Ok(self.base.emit(&node));
                    }
                }
            }

            fn current(&self) -> Option<&C> {
                self.base.current.as_ref()
            }

            fn current_position(&self) -> usize {
                self.base.position
            }

            fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
                if !self.accepts_pattern(candidate) {
                    return Ok(None);
                }
                self.base.match_parent(candidate)
            }

            fn shape_name(&self) -> &'static str {
                $label
            }
        }
    };
}

per_context_axis!(AttributeQuery, move_to_first_attribute, move_to_next_attribute, "attribute axis");
per_context_axis!(NamespaceQuery, move_to_first_namespace, move_to_next_namespace, "namespace axis");

impl<C: TreeCursor> AttributeQuery<C> {
    fn accepts(&self, node: &C) -> bool {
        self.base.matches(node)
    }

    fn accepts_pattern(&self, candidate: &C) -> bool {
        candidate.node_kind() == NodeKind::Attribute && self.base.matches(candidate)
    }
}

impl<C: TreeCursor> NamespaceQuery<C> {
    /// Namespace nodes match on their prefix only; `xmlns=""` undeclarations
    /// never match.
    fn accepts(&self, node: &C) -> bool {
        !node.value().is_empty() && self.base.shape.test.matches_local(node, NodeKind::Namespace)
    }

    fn accepts_pattern(&self, candidate: &C) -> bool {
        candidate.node_kind() == NodeKind::Namespace && self.accepts(candidate)
    }
}

/// `child::`.
///
/// Children of an upstream node nested inside a child being produced come
/// before that child's next sibling: the outer run is parked on `pending`
/// together with its position and resumed afterwards.
#[derive(Debug, Clone)]
pub struct ChildrenQuery<C: TreeCursor> {
    base: AxisBase<C>,
    walker: Option<C>,
    pending: SmallVec<[(C, usize); 8]>,
    /// First child of the next upstream node that has children.
    next_input: Option<C>,
}

impl<C: TreeCursor> ChildrenQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self { base: AxisBase::new(input, shape), walker: None, pending: SmallVec::new(), next_input: None }
    }

    fn clear(&mut self) {
        self.walker = None;
        self.pending.clear();
        self.next_input = None;
    }

    fn fetch_input(&mut self) -> Result<Option<C>, Error> {
        while let Some(mut input) = self.base.input.advance()? {
            if input.move_to_first_child() {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }
}

impl<C: TreeCursor> QueryCursor<C> for ChildrenQuery<C> {
    fn reset(&mut self) {
        self.clear();
        self.base.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.clear();
        self.base.evaluate(context)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        loop {
            let walker = match self.walker.take() {
                Some(mut w) => {
                    // the next upstream node is `w` or lies below it
                    if let Some(inner) = self.next_input.take_if(|first| w.is_descendant(first)) {
                        self.pending.push((w, self.base.position));
                        self.base.position = 0;
                        self.next_input = self.fetch_input()?;
                        inner
                    } else if w.move_to_next_sibling() {
                        w
                    } else {
                        continue;
                    }
                }
                None => match self.pending.pop() {
                    Some((parked, position)) => {
                        self.base.position = position;
                        self.walker = Some(parked);
                        continue;
                    }
                    None => {
                        let first = match self.next_input.take() {
                            Some(first) => first,
                            None => match self.fetch_input()? {
                                Some(first) => first,
                                None => return Ok(None),
                            },
                        };
                        self.base.position = 0;
                        self.next_input = self.fetch_input()?;
                        first
                    }
                },
            };
            let out = if self.base.matches(&walker) { self.base.emit(&walker) } else { None };
            self.walker = Some(walker);
            if out.is_some() {
                return Ok(out);
            }
        }
    }

    fn current(&self) -> Option<&C> {
        self.base.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.base.position
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        if candidate.node_kind().is_attribute_like() || !self.base.matches(candidate) {
            return Ok(None);
        }
        self.base.match_parent(candidate)
    }

    fn shape_name(&self) -> &'static str {
        "child axis"
    }
}

/// `descendant::` and `descendant-or-self::`.
///
/// Upstream nodes inside the subtree of the previously expanded input are
/// skipped: their descendants were already produced.
#[derive(Debug, Clone)]
pub struct DescendantQuery<C: TreeCursor> {
    base: AxisBase<C>,
    anchor: Option<C>,
    walker: Option<C>,
    self_pending: bool,
}

impl<C: TreeCursor> DescendantQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self { base: AxisBase::new(input, shape), anchor: None, walker: None, self_pending: false }
    }

    fn next_anchor(&mut self) -> Result<Option<C>, Error> {
        loop {
            let Some(input) = self.base.input.advance()? else { return Ok(None) };
            if self.anchor.as_ref().is_some_and(|prev| prev.is_descendant(&input)) {
                continue;
            }
            return Ok(Some(input));
        }
    }
}

impl<C: TreeCursor> QueryCursor<C> for DescendantQuery<C> {
    fn reset(&mut self) {
        self.anchor = None;
        self.walker = None;
        self.self_pending = false;
        self.base.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.anchor = None;
        self.walker = None;
        self.self_pending = false;
        self.base.evaluate(context)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        loop {
            if self.walker.is_none() {
                let Some(anchor) = self.next_anchor()? else { return Ok(None) };
                self.base.position = 0;
                self.self_pending = self.base.shape.match_self;
                self.walker = Some(anchor.clone());
                self.anchor = Some(anchor);
            }
            if self.self_pending {
                self.self_pending = false;
                if let Some(node) = self.walker.clone()
                    && self.base.matches(&node)
                {
                    return Ok(self.base.emit(&node));
                }
                continue;
            }
            let (Some(walker), Some(anchor)) = (self.walker.as_mut(), self.anchor.as_ref()) else {
                return Ok(None);
            };
            if !next_in_subtree(walker, anchor) {
                // keep `anchor` so nested inputs are still recognized
                self.walker = None;
                continue;
            }
            let node = walker.clone();
            if self.base.matches(&node) {
                return Ok(self.base.emit(&node));
            }
        }
    }

    fn current(&self) -> Option<&C> {
        self.base.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.base.position
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        if !self.base.shape.abbreviated {
            return Err(Error::invalid_pattern(self.shape_name()));
        }
        if candidate.node_kind().is_attribute_like() || !self.base.matches(candidate) {
            return Ok(None);
        }
        if self.base.shape.match_self
            && let Some(hit) = self.base.input.match_node(candidate)?
        {
            return Ok(Some(hit));
        }
        let mut ancestor = candidate.clone();
        while ancestor.move_to_parent() {
            if let Some(hit) = self.base.input.match_node(&ancestor)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    fn shape_name(&self) -> &'static str {
        "descendant axis"
    }
}

/// `following-sibling::`.
///
/// Sibling runs are produced once even when several upstream nodes share a
/// parent, and stay in document order when an upstream node lies inside a
/// sibling being produced: the outer run is parked on `pending`, with its
/// position, until the nested one is done. Positions restart for every run.
#[derive(Debug, Clone)]
pub struct FollowingSiblingQuery<C: TreeCursor> {
    base: AxisBase<C>,
    walker: Option<C>,
    pending: SmallVec<[(C, usize); 8]>,
    visited_parents: SmallVec<[C; 8]>,
    next_input: Option<C>,
}

impl<C: TreeCursor> FollowingSiblingQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>, shape: Rc<StepShape>) -> Self {
        Self {
            base: AxisBase::new(input, shape),
            walker: None,
            pending: SmallVec::new(),
            visited_parents: SmallVec::new(),
            next_input: None,
        }
    }

    fn clear(&mut self) {
        self.walker = None;
        self.pending.clear();
        self.visited_parents.clear();
        self.next_input = None;
    }

    /// Next upstream node whose sibling run has not been started yet.
    fn fetch_input(&mut self) -> Result<Option<C>, Error> {
        loop {
            let Some(input) = self.base.input.advance()? else { return Ok(None) };
            if input.node_kind().is_attribute_like() {
                continue;
            }
            let mut parent = input.clone();
            if !parent.move_to_parent() {
                continue;
            }
            if self.visited_parents.iter().any(|p| p.is_same_position(&parent)) {
                continue;
            }
            self.visited_parents.push(parent);
            return Ok(Some(input));
        }
    }
}

impl<C: TreeCursor> QueryCursor<C> for FollowingSiblingQuery<C> {
    fn reset(&mut self) {
        self.clear();
        self.base.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.clear();
        self.base.evaluate(context)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        loop {
            let mut walker = match self.walker.take() {
                Some(w) => w,
                None => {
                    if self.next_input.is_none() {
                        self.next_input = self.fetch_input()?;
                    }
                    match self.pending.pop() {
                        Some((parked, position)) => {
                            self.base.position = position;
                            parked
                        }
                        None => {
                            let Some(start) = self.next_input.take() else { return Ok(None) };
                            self.base.position = 0;
                            self.next_input = self.fetch_input()?;
                            start
                        }
                    }
                }
            };
            loop {
                // an upstream node inside the walker's subtree runs first
                while let Some(inner) = self.next_input.take_if(|next| walker.is_descendant(next)) {
                    self.pending.push((std::mem::replace(&mut walker, inner), self.base.position));
                    self.base.position = 0;
                    self.next_input = self.fetch_input()?;
                }
                if !walker.move_to_next_sibling() {
                    break;
                }
                if self.base.matches(&walker) {
                    let out = self.base.emit(&walker);
                    self.walker = Some(walker);
                    return Ok(out);
                }
            }
        }
    }

    fn current(&self) -> Option<&C> {
        self.base.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.base.position
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        if candidate.node_kind().is_attribute_like() || !self.base.matches(candidate) {
            return Ok(None);
        }
        let mut sibling = candidate.clone();
        if !sibling.move_to_parent() || !sibling.move_to_first_child() {
            return Ok(None);
        }
        while !sibling.is_same_position(candidate) {
            if let Some(hit) = self.base.input.match_node(&sibling)? {
                return Ok(Some(hit));
            }
            if !sibling.move_to_next_sibling() {
                break;
            }
        }
        Ok(None)
    }

    fn shape_name(&self) -> &'static str {
        "following-sibling axis"
    }
}
