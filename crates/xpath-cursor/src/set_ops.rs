//! Union, intersection and difference of document-ordered node sequences.
//!
//! Each operation is an explicit state machine driven by its caller: the
//! machine says which side it needs next ([`SetIteratorResult`]) and the
//! caller feeds the next node of that side (or `None` at its end). Inputs
//! must be in document order and duplicate free; merges are linear in the
//! size of both inputs.
use core::cmp::Ordering;

use crate::error::Error;
use crate::order::DocumentOrderComparer;
use crate::plan::SetOp;
use crate::query::{Query, QueryCursor};
use crate::tree::TreeCursor;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetIteratorResult {
    NoMoreNodes,
    /// Feed the first node of the right input.
    InitRightIterator,
    NeedLeftNode,
    NeedRightNode,
    /// `current()` holds the next output node.
    HaveCurrentNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnionState {
    InitLeft,
    NeedLeft,
    NeedRight,
    LeftIsCurrent,
    RightIsCurrent,
}

/// Merges two sequences, collapsing nodes present in both.
#[derive(Debug, Clone)]
pub struct UnionIterator<C> {
    state: UnionState,
    current: Option<C>,
    other: Option<C>,
    comparer: DocumentOrderComparer<C>,
}

impl<C: TreeCursor> Default for UnionIterator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TreeCursor> UnionIterator<C> {
    pub fn new() -> Self {
        Self { state: UnionState::InitLeft, current: None, other: None, comparer: DocumentOrderComparer::new() }
    }

    pub fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    fn swap(&mut self) {
        core::mem::swap(&mut self.current, &mut self.other);
        self.state = if self.state == UnionState::LeftIsCurrent {
            UnionState::RightIsCurrent
        } else {
            UnionState::LeftIsCurrent
        };
    }

    pub fn move_next(&mut self, node: Option<C>) -> SetIteratorResult {
        match self.state {
            UnionState::InitLeft => {
                self.other = node;
                self.state = UnionState::NeedRight;
                return SetIteratorResult::InitRightIterator;
            }
            UnionState::NeedLeft => {
                self.current = node;
                self.state = UnionState::LeftIsCurrent;
            }
            UnionState::NeedRight => {
                self.current = node;
                self.state = UnionState::RightIsCurrent;
            }
            UnionState::LeftIsCurrent => {
                self.state = UnionState::NeedLeft;
                return SetIteratorResult::NeedLeftNode;
            }
            UnionState::RightIsCurrent => {
                self.state = UnionState::NeedRight;
                return SetIteratorResult::NeedRightNode;
            }
        }

        match (&self.current, &self.other) {
            (None, None) => return SetIteratorResult::NoMoreNodes,
            (None, Some(_)) => self.swap(),
            (Some(current), Some(other)) => match self.comparer.compare(other, current) {
                Ordering::Equal => {
                    // drop the duplicate and refill the side it came from
                    return if self.state == UnionState::LeftIsCurrent {
                        self.state = UnionState::NeedLeft;
                        SetIteratorResult::NeedLeftNode
                    } else {
                        self.state = UnionState::NeedRight;
                        SetIteratorResult::NeedRightNode
                    };
                }
                Ordering::Less => self.swap(),
                Ordering::Greater => {}
            },
            (Some(_), None) => {}
        }
        SetIteratorResult::HaveCurrentNode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    InitLeft,
    NeedLeft,
    NeedRight,
    NeedLeftAndRight,
    HaveCurrent,
}

/// Nodes present in both sequences.
#[derive(Debug, Clone)]
pub struct IntersectIterator<C> {
    state: FilterState,
    left: Option<C>,
    right: Option<C>,
    comparer: DocumentOrderComparer<C>,
}

impl<C: TreeCursor> Default for IntersectIterator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TreeCursor> IntersectIterator<C> {
    pub fn new() -> Self {
        Self { state: FilterState::InitLeft, left: None, right: None, comparer: DocumentOrderComparer::new() }
    }

    pub fn current(&self) -> Option<&C> {
        self.left.as_ref()
    }

    pub fn move_next(&mut self, node: Option<C>) -> SetIteratorResult {
        match self.state {
            FilterState::InitLeft => {
                self.left = node;
                self.state = FilterState::NeedRight;
                return SetIteratorResult::InitRightIterator;
            }
            FilterState::NeedLeft => self.left = node,
            FilterState::NeedRight => self.right = node,
            FilterState::NeedLeftAndRight => {
                self.left = node;
                self.state = FilterState::NeedRight;
                return SetIteratorResult::NeedRightNode;
            }
            FilterState::HaveCurrent => {
                self.state = FilterState::NeedLeftAndRight;
                return SetIteratorResult::NeedLeftNode;
            }
        }

        let (Some(left), Some(right)) = (&self.left, &self.right) else {
            return SetIteratorResult::NoMoreNodes;
        };
        match self.comparer.compare(left, right) {
            Ordering::Less => {
                self.state = FilterState::NeedLeft;
                SetIteratorResult::NeedLeftNode
            }
            Ordering::Greater => {
                self.state = FilterState::NeedRight;
                SetIteratorResult::NeedRightNode
            }
            Ordering::Equal => {
                self.state = FilterState::HaveCurrent;
                SetIteratorResult::HaveCurrentNode
            }
        }
    }
}

/// Nodes of the left sequence absent from the right one.
#[derive(Debug, Clone)]
pub struct DifferenceIterator<C> {
    state: FilterState,
    left: Option<C>,
    right: Option<C>,
    comparer: DocumentOrderComparer<C>,
}

impl<C: TreeCursor> Default for DifferenceIterator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TreeCursor> DifferenceIterator<C> {
    pub fn new() -> Self {
        Self { state: FilterState::InitLeft, left: None, right: None, comparer: DocumentOrderComparer::new() }
    }

    pub fn current(&self) -> Option<&C> {
        self.left.as_ref()
    }

    pub fn move_next(&mut self, node: Option<C>) -> SetIteratorResult {
        match self.state {
            FilterState::InitLeft => {
                self.left = node;
                self.state = FilterState::NeedRight;
                return SetIteratorResult::InitRightIterator;
            }
            FilterState::NeedLeft => self.left = node,
            FilterState::NeedRight => self.right = node,
            FilterState::NeedLeftAndRight => {
                self.left = node;
                self.state = FilterState::NeedRight;
                return SetIteratorResult::NeedRightNode;
            }
            FilterState::HaveCurrent => {
                self.state = FilterState::NeedLeft;
                return SetIteratorResult::NeedLeftNode;
            }
        }

        let Some(left) = &self.left else { return SetIteratorResult::NoMoreNodes };
        if let Some(right) = &self.right {
            match self.comparer.compare(left, right) {
                Ordering::Equal => {
                    self.state = FilterState::NeedLeftAndRight;
                    return SetIteratorResult::NeedLeftNode;
                }
                Ordering::Greater => {
                    self.state = FilterState::NeedRight;
                    return SetIteratorResult::NeedRightNode;
                }
                Ordering::Less => {}
            }
        }
        self.state = FilterState::HaveCurrent;
        SetIteratorResult::HaveCurrentNode
    }
}

#[derive(Debug, Clone)]
enum SetMachine<C> {
    Union(UnionIterator<C>),
    Intersect(IntersectIterator<C>),
    Difference(DifferenceIterator<C>),
}

impl<C: TreeCursor> SetMachine<C> {
    fn new(op: SetOp) -> Self {
        match op {
            SetOp::Union => SetMachine::Union(UnionIterator::new()),
            SetOp::Intersect => SetMachine::Intersect(IntersectIterator::new()),
            SetOp::Difference => SetMachine::Difference(DifferenceIterator::new()),
        }
    }

    fn move_next(&mut self, node: Option<C>) -> SetIteratorResult {
        match self {
            SetMachine::Union(m) => m.move_next(node),
            SetMachine::Intersect(m) => m.move_next(node),
            SetMachine::Difference(m) => m.move_next(node),
        }
    }

    fn current(&self) -> Option<&C> {
        match self {
            SetMachine::Union(m) => m.current(),
            SetMachine::Intersect(m) => m.current(),
            SetMachine::Difference(m) => m.current(),
        }
    }
}

/// Query cursor driving a set machine from two upstream queries.
#[derive(Debug, Clone)]
pub(crate) struct SetQuery<C: TreeCursor> {
    op: SetOp,
    left: Box<Query<C>>,
    right: Box<Query<C>>,
    machine: SetMachine<C>,
    /// Last node pulled from each side, for the ordering check.
    last_left: Option<C>,
    last_right: Option<C>,
    comparer: DocumentOrderComparer<C>,
    started: bool,
    finished: bool,
    position: usize,
    current: Option<C>,
}

impl<C: TreeCursor> SetQuery<C> {
    pub(crate) fn new(op: SetOp, left: Box<Query<C>>, right: Box<Query<C>>) -> Self {
        Self {
            op,
            left,
            right,
            machine: SetMachine::new(op),
            last_left: None,
            last_right: None,
            comparer: DocumentOrderComparer::new(),
            started: false,
            finished: false,
            position: 0,
            current: None,
        }
    }

    fn clear(&mut self) {
        self.machine = SetMachine::new(self.op);
        self.last_left = None;
        self.last_right = None;
        self.started = false;
        self.finished = false;
        self.position = 0;
        self.current = None;
    }

    fn pull_left(&mut self) -> Result<Option<C>, Error> {
        let node = self.left.advance()?;
        check_ascending(&mut self.comparer, &mut self.last_left, node.as_ref(), "left")?;
        Ok(node)
    }

    fn pull_right(&mut self) -> Result<Option<C>, Error> {
        let node = self.right.advance()?;
        check_ascending(&mut self.comparer, &mut self.last_right, node.as_ref(), "right")?;
        Ok(node)
    }

    fn op_name(&self) -> &'static str {
        match self.op {
            SetOp::Union => "union",
            SetOp::Intersect => "intersect",
            SetOp::Difference => "difference",
        }
    }
}

fn check_ascending<C: TreeCursor>(
    comparer: &mut DocumentOrderComparer<C>,
    last: &mut Option<C>,
    node: Option<&C>,
    side: &str,
) -> Result<(), Error> {
    let Some(node) = node else { return Ok(()) };
    if let Some(prev) = last.as_ref()
        && comparer.compare(prev, node) != Ordering::Less
    {
        return Err(Error::ordering_violation(format!(
            "{side} operand of a set operation is not in document order at {node:?}"
        )));
    }
    *last = Some(node.clone());
    Ok(())
}

impl<C: TreeCursor> QueryCursor<C> for SetQuery<C> {
    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.clear();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        for side in [&mut self.left, &mut self.right] {
            let value = side.evaluate(context)?;
            if !matches!(value, Value::NodeSet) {
                return Err(Error::type_error(format!(
                    "set operation needs node-set operands, got {:?}",
                    value.result_type()
                )));
            }
        }
        self.clear();
        Ok(Value::NodeSet)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        if self.finished {
            return Ok(None);
        }
        let mut feed = if self.started {
            None
        } else {
            self.started = true;
            self.pull_left()?
        };
        loop {
            match self.machine.move_next(feed.take()) {
                SetIteratorResult::NoMoreNodes => {
                    self.finished = true;
                    return Ok(None);
                }
                SetIteratorResult::InitRightIterator | SetIteratorResult::NeedRightNode => {
                    feed = self.pull_right()?;
                }
                SetIteratorResult::NeedLeftNode => feed = self.pull_left()?,
                SetIteratorResult::HaveCurrentNode => {
                    let Some(node) = self.machine.current().cloned() else {
                        self.finished = true;
                        return Ok(None);
                    };
                    self.position += 1;
                    self.current = Some(node.clone());
                    return Ok(Some(node));
                }
            }
        }
    }

    fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.position
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        if self.op != SetOp::Union {
            return Err(Error::invalid_pattern(self.op_name()));
        }
        if let Some(hit) = self.left.match_node(candidate)? {
            return Ok(Some(hit));
        }
        self.right.match_node(candidate)
    }

    fn shape_name(&self) -> &'static str {
        self.op_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple_tree::{doc, elem, SimpleCursor};

    /// Runs a machine to completion over two in-memory sequences.
    fn drive<C: TreeCursor>(
        mut step: impl FnMut(Option<C>) -> SetIteratorResult,
        current: impl Fn() -> Option<C>,
        left: &[C],
        right: &[C],
    ) -> Vec<C> {
        let mut l = left.iter().cloned();
        let mut r = right.iter().cloned();
        let mut out = Vec::new();
        let mut feed = l.next();
        loop {
            match step(feed.take()) {
                SetIteratorResult::NoMoreNodes => return out,
                SetIteratorResult::InitRightIterator | SetIteratorResult::NeedRightNode => feed = r.next(),
                SetIteratorResult::NeedLeftNode => feed = l.next(),
                SetIteratorResult::HaveCurrentNode => out.extend(current()),
            }
        }
    }

    fn nodes() -> Vec<SimpleCursor> {
        let root = doc().child(elem("r").child(elem("a")).child(elem("b")).child(elem("c")).child(elem("d"))).build();
        ["a", "b", "c", "d"].iter().map(|n| root.find_element(n).unwrap()).collect()
    }

    fn names(seq: &[SimpleCursor]) -> Vec<String> {
        seq.iter().map(|n| n.local_name().to_string()).collect()
    }

    #[test]
    fn union_intersect_difference() {
        let n = nodes();
        let (left, right) = (vec![n[1].clone(), n[2].clone()], vec![n[2].clone(), n[3].clone()]);

        let machine = std::cell::RefCell::new(UnionIterator::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &left, &right);
        assert_eq!(names(&out), ["b", "c", "d"]);

        let machine = std::cell::RefCell::new(IntersectIterator::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &left, &right);
        assert_eq!(names(&out), ["c"]);

        let machine = std::cell::RefCell::new(DifferenceIterator::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &left, &right);
        assert_eq!(names(&out), ["b"]);
    }

    #[test]
    fn empty_sides() {
        let n = nodes();
        let some = vec![n[0].clone(), n[3].clone()];

        let machine = std::cell::RefCell::new(UnionIterator::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &[], &some);
        assert_eq!(names(&out), ["a", "d"]);

        let machine = std::cell::RefCell::new(DifferenceIterator::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &some, &[]);
        assert_eq!(names(&out), ["a", "d"]);

        let machine = std::cell::RefCell::new(IntersectIterator::<SimpleCursor>::new());
        let out = drive(|x| machine.borrow_mut().move_next(x), || machine.borrow().current().cloned(), &some, &[]);
        assert!(out.is_empty());
    }
}
