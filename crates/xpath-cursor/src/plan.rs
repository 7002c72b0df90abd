//! Immutable query plans.
//!
//! A [`Plan`] is the compiled shape of a query: built once, shared through
//! `Rc`, and instantiated into any number of independent
//! [`Query`](crate::Query) cursors.
use std::rc::Rc;

use bitflags::bitflags;

use crate::node_test::NodeTest;
use crate::tree::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Attribute,
    Descendant,
    FollowingSibling,
    Namespace,
    Parent,
    Ancestor,
    Preceding,
    PrecedingSibling,
}

impl Axis {
    pub fn principal_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            Axis::Namespace => NodeKind::Namespace,
            _ => NodeKind::Element,
        }
    }

    /// Axes whose natural traversal runs against document order.
    pub fn is_reverse(self) -> bool {
        matches!(self, Axis::Ancestor | Axis::Preceding | Axis::PrecedingSibling)
    }

    /// Axes evaluated eagerly into a sorted buffer.
    pub fn is_cached(self) -> bool {
        matches!(self, Axis::Parent | Axis::Ancestor | Axis::PrecedingSibling)
    }
}

/// Axis, node test and flags of one location step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepShape {
    pub axis: Axis,
    pub test: NodeTest,
    /// `-or-self` variant (descendant, ancestor).
    pub match_self: bool,
    /// Descendant step written as `//`; only that form is usable as a pattern.
    pub abbreviated: bool,
}

impl StepShape {
    pub(crate) fn principal_kind(&self) -> NodeKind {
        self.axis.principal_kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    /// Operator to use after swapping the operands.
    pub fn invert(self) -> Op {
        match self {
            Op::Lt => Op::Gt,
            Op::Le => Op::Ge,
            Op::Gt => Op::Lt,
            Op::Ge => Op::Le,
            other => other,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Op::Eq | Op::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    Union,
    Intersect,
    Difference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

/// Static result type. The discriminant is the rank used by comparison
/// dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultType {
    Number = 0,
    String = 1,
    Boolean = 2,
    NodeSet = 3,
    Fragment = 4,
    Any = 5,
}

impl ResultType {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueryProps: u8 {
        /// Output positions are meaningful to predicates.
        const POSITION = 1;
        /// The size of the output is known once evaluated.
        const COUNT = 2;
        /// Output is materialized into a buffer during `evaluate`.
        const CACHED = 4;
        /// The axis runs against document order; output is still ascending.
        const REVERSE = 8;
        /// Output is document ordered and duplicate free.
        const MERGE = 16;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// `.`
    Context,
    /// `/`
    Root,
    Step { shape: Rc<StepShape>, input: Rc<Plan> },
    Filter { input: Rc<Plan>, cond: Rc<Plan>, no_position: bool },
    /// Renumbers a reverse-axis input so positions count outwards from the
    /// context node.
    ReversePosition { input: Rc<Plan> },
    Compare { op: Op, left: Rc<Plan>, right: Rc<Plan> },
    Literal(Literal),
    /// The context node viewed as a result tree fragment.
    Fragment,
    Set { op: SetOp, left: Rc<Plan>, right: Rc<Plan> },
}

impl Plan {
    pub fn context() -> Rc<Plan> {
        Rc::new(Plan::Context)
    }

    pub fn root() -> Rc<Plan> {
        Rc::new(Plan::Root)
    }

    fn step(input: &Rc<Plan>, axis: Axis, test: NodeTest, match_self: bool, abbreviated: bool) -> Rc<Plan> {
        Rc::new(Plan::Step { shape: Rc::new(StepShape { axis, test, match_self, abbreviated }), input: input.clone() })
    }

    pub fn child(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::Child, test, false, false)
    }

    pub fn attribute(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::Attribute, test, false, false)
    }

    /// `descendant::` (`match_self = false`) or `descendant-or-self::`.
    /// `abbreviated` marks the `//` form.
    pub fn descendant(input: &Rc<Plan>, test: NodeTest, match_self: bool, abbreviated: bool) -> Rc<Plan> {
        Self::step(input, Axis::Descendant, test, match_self, abbreviated)
    }

    pub fn following_sibling(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::FollowingSibling, test, false, false)
    }

    pub fn namespace(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::Namespace, test, false, false)
    }

    pub fn parent(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::Parent, test, false, false)
    }

    pub fn ancestor(input: &Rc<Plan>, test: NodeTest, match_self: bool) -> Rc<Plan> {
        Self::step(input, Axis::Ancestor, test, match_self, false)
    }

    pub fn preceding(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::Preceding, test, false, false)
    }

    pub fn preceding_sibling(input: &Rc<Plan>, test: NodeTest) -> Rc<Plan> {
        Self::step(input, Axis::PrecedingSibling, test, false, false)
    }

    /// `input[cond]`.
    ///
    /// A condition that may evaluate to a number is positional; over a
    /// reverse axis its positions are renumbered from the context outwards.
    pub fn filter(input: &Rc<Plan>, cond: &Rc<Plan>) -> Rc<Plan> {
        let no_position = !matches!(cond.static_type(), ResultType::Number | ResultType::Any);
        let input = if !no_position
            && input.properties().contains(QueryProps::REVERSE)
            && !matches!(**input, Plan::ReversePosition { .. })
        {
            Rc::new(Plan::ReversePosition { input: input.clone() })
        } else {
            input.clone()
        };
        Rc::new(Plan::Filter { input, cond: cond.clone(), no_position })
    }

    pub fn compare(op: Op, left: &Rc<Plan>, right: &Rc<Plan>) -> Rc<Plan> {
        Rc::new(Plan::Compare { op, left: left.clone(), right: right.clone() })
    }

    pub fn number(value: f64) -> Rc<Plan> {
        Rc::new(Plan::Literal(Literal::Number(value)))
    }

    pub fn string(value: &str) -> Rc<Plan> {
        Rc::new(Plan::Literal(Literal::String(value.to_string())))
    }

    pub fn boolean(value: bool) -> Rc<Plan> {
        Rc::new(Plan::Literal(Literal::Boolean(value)))
    }

    pub fn fragment() -> Rc<Plan> {
        Rc::new(Plan::Fragment)
    }

    pub fn union(left: &Rc<Plan>, right: &Rc<Plan>) -> Rc<Plan> {
        Self::set(SetOp::Union, left, right)
    }

    pub fn intersect(left: &Rc<Plan>, right: &Rc<Plan>) -> Rc<Plan> {
        Self::set(SetOp::Intersect, left, right)
    }

    pub fn difference(left: &Rc<Plan>, right: &Rc<Plan>) -> Rc<Plan> {
        Self::set(SetOp::Difference, left, right)
    }

    fn set(op: SetOp, left: &Rc<Plan>, right: &Rc<Plan>) -> Rc<Plan> {
        Rc::new(Plan::Set { op, left: left.clone(), right: right.clone() })
    }

    /// Left-deep union of all `plans`; `None` when empty.
    pub fn union_all<I: IntoIterator<Item = Rc<Plan>>>(plans: I) -> Option<Rc<Plan>> {
        plans.into_iter().reduce(|acc, next| Self::union(&acc, &next))
    }

    pub fn static_type(&self) -> ResultType {
        match self {
            Plan::Compare { .. } => ResultType::Boolean,
            Plan::Literal(Literal::Number(_)) => ResultType::Number,
            Plan::Literal(Literal::String(_)) => ResultType::String,
            Plan::Literal(Literal::Boolean(_)) => ResultType::Boolean,
            Plan::Fragment => ResultType::Fragment,
            _ => ResultType::NodeSet,
        }
    }

    pub fn properties(&self) -> QueryProps {
        match self {
            Plan::Context | Plan::Root => {
                QueryProps::POSITION | QueryProps::COUNT | QueryProps::CACHED | QueryProps::MERGE
            }
            Plan::Step { shape, .. } => {
                let mut props = QueryProps::POSITION | QueryProps::MERGE;
                if shape.axis.is_cached() {
                    props |= QueryProps::CACHED | QueryProps::COUNT;
                }
                if shape.axis.is_reverse() {
                    props |= QueryProps::REVERSE;
                }
                props
            }
            Plan::Filter { input, .. } => {
                QueryProps::POSITION | (input.properties() & (QueryProps::REVERSE | QueryProps::MERGE))
            }
            Plan::ReversePosition { input } => input.properties() | QueryProps::CACHED | QueryProps::COUNT,
            Plan::Set { .. } => QueryProps::MERGE,
            Plan::Compare { .. } | Plan::Literal(_) | Plan::Fragment => QueryProps::empty(),
        }
    }

    /// XSLT default priority when this plan is used as a match pattern.
    pub fn default_priority(&self) -> f64 {
        match self {
            Plan::Step { shape, input } if matches!(shape.axis, Axis::Child | Axis::Attribute) => {
                if matches!(**input, Plan::Context) { shape.test.default_priority() } else { 0.5 }
            }
            _ => 0.5,
        }
    }
}
