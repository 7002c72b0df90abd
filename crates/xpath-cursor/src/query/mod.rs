//! Pull-based query cursors.
//!
//! A [`Query`] is instantiated from a [`Plan`] and owns all mutable
//! evaluation state: upstream cursors, positions, buffers. The plan itself is
//! shared and never touched during evaluation.
use std::rc::Rc;

use crate::error::Error;
use crate::plan::{Axis, Plan, QueryProps, ResultType};
use crate::set_ops::SetQuery;
use crate::tree::TreeCursor;
use crate::value::Value;

mod axis;
mod cache;
mod filter;
mod logical;

pub(crate) use axis::{
    AttributeQuery, ChildrenQuery, ContextQuery, DescendantQuery, FollowingSiblingQuery, NamespaceQuery,
};
pub(crate) use cache::{AncestorQuery, ParentQuery, PrecedingQuery, PrecedingSiblingQuery};
pub(crate) use filter::{FilterQuery, ReversePositionQuery};
pub(crate) use logical::{FragmentQuery, LogicalExpr, OperandQuery};

/// Contract shared by every cursor variant.
pub(crate) trait QueryCursor<C: TreeCursor> {
    /// Rewinds to position 0 keeping the current context binding.
    fn reset(&mut self);
    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error>;
    fn advance(&mut self) -> Result<Option<C>, Error>;
    fn current(&self) -> Option<&C>;
    fn current_position(&self) -> usize;

    /// Output size when it is known without enumerating.
    fn known_count(&self) -> Option<usize> {
        None
    }

    fn match_node(&mut self, _candidate: &C) -> Result<Option<C>, Error> {
        Err(Error::invalid_pattern(self.shape_name()))
    }

    fn shape_name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub(crate) enum Cursor<C: TreeCursor> {
    Context(ContextQuery<C>),
    Children(ChildrenQuery<C>),
    Attribute(AttributeQuery<C>),
    Descendant(DescendantQuery<C>),
    FollowingSibling(FollowingSiblingQuery<C>),
    Namespace(NamespaceQuery<C>),
    Parent(ParentQuery<C>),
    Ancestor(AncestorQuery<C>),
    PrecedingSibling(PrecedingSiblingQuery<C>),
    Preceding(PrecedingQuery<C>),
    Filter(FilterQuery<C>),
    ReversePosition(ReversePositionQuery<C>),
    Logical(LogicalExpr<C>),
    Operand(OperandQuery),
    Fragment(FragmentQuery<C>),
    Set(SetQuery<C>),
}

impl<C: TreeCursor> Cursor<C> {
    fn as_dyn(&self) -> &dyn QueryCursor<C> {
        match self {
            Cursor::Context(q) => q,
            Cursor::Children(q) => q,
            Cursor::Attribute(q) => q,
            Cursor::Descendant(q) => q,
            Cursor::FollowingSibling(q) => q,
            Cursor::Namespace(q) => q,
            Cursor::Parent(q) => q,
            Cursor::Ancestor(q) => q,
            Cursor::PrecedingSibling(q) => q,
            Cursor::Preceding(q) => q,
            Cursor::Filter(q) => q,
            Cursor::ReversePosition(q) => q,
            Cursor::Logical(q) => q,
            Cursor::Operand(q) => q,
            Cursor::Fragment(q) => q,
            Cursor::Set(q) => q,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn QueryCursor<C> {
        match self {
            Cursor::Context(q) => q,
            Cursor::Children(q) => q,
            Cursor::Attribute(q) => q,
            Cursor::Descendant(q) => q,
            Cursor::FollowingSibling(q) => q,
            Cursor::Namespace(q) => q,
            Cursor::Parent(q) => q,
            Cursor::Ancestor(q) => q,
            Cursor::PrecedingSibling(q) => q,
            Cursor::Preceding(q) => q,
            Cursor::Filter(q) => q,
            Cursor::ReversePosition(q) => q,
            Cursor::Logical(q) => q,
            Cursor::Operand(q) => q,
            Cursor::Fragment(q) => q,
            Cursor::Set(q) => q,
        }
    }
}

/// A stateful cursor over the result of a [`Plan`].
///
/// ```
/// use xpath_cursor::simple_tree::{doc, elem};
/// use xpath_cursor::{NodeTest, Plan, Query, TreeCursor};
///
/// // <a><b/><c><d/></c></a>
/// let root = doc().child(elem("a").child(elem("b")).child(elem("c").child(elem("d")))).build();
/// let plan = Plan::child(&Plan::child(&Plan::root(), NodeTest::name("a")), NodeTest::wildcard());
/// let mut query = Query::new(&plan);
/// let names: Vec<String> = query.select(&root)?.iter().map(|n| n.local_name().to_string()).collect();
/// assert_eq!(names, ["b", "c"]);
/// # Ok::<(), xpath_cursor::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Query<C: TreeCursor> {
    plan: Rc<Plan>,
    cursor: Cursor<C>,
}

impl<C: TreeCursor> Query<C> {
    pub fn new(plan: &Rc<Plan>) -> Self {
        let sub = |p: &Rc<Plan>| Box::new(Query::new(p));
        let cursor = match &**plan {
            Plan::Context => Cursor::Context(ContextQuery::new(false)),
            Plan::Root => Cursor::Context(ContextQuery::new(true)),
            Plan::Step { shape, input } => {
                let input = sub(input);
                let shape = shape.clone();
                match shape.axis {
                    Axis::Child => Cursor::Children(ChildrenQuery::new(input, shape)),
                    Axis::Attribute => Cursor::Attribute(AttributeQuery::new(input, shape)),
                    Axis::Descendant => Cursor::Descendant(DescendantQuery::new(input, shape)),
                    Axis::FollowingSibling => Cursor::FollowingSibling(FollowingSiblingQuery::new(input, shape)),
                    Axis::Namespace => Cursor::Namespace(NamespaceQuery::new(input, shape)),
                    Axis::Parent => Cursor::Parent(ParentQuery::new(input, shape)),
                    Axis::Ancestor => Cursor::Ancestor(AncestorQuery::new(input, shape)),
                    Axis::PrecedingSibling => Cursor::PrecedingSibling(PrecedingSiblingQuery::new(input, shape)),
                    Axis::Preceding => Cursor::Preceding(PrecedingQuery::new(input, shape)),
                }
            }
            Plan::Filter { input, cond, no_position } => {
                Cursor::Filter(FilterQuery::new(sub(input), sub(cond), *no_position))
            }
            Plan::ReversePosition { input } => Cursor::ReversePosition(ReversePositionQuery::new(sub(input))),
            Plan::Compare { op, left, right } => Cursor::Logical(LogicalExpr::new(*op, sub(left), sub(right))),
            Plan::Literal(lit) => Cursor::Operand(OperandQuery::new(lit.clone())),
            Plan::Fragment => Cursor::Fragment(FragmentQuery::new()),
            Plan::Set { op, left, right } => Cursor::Set(SetQuery::new(*op, sub(left), sub(right))),
        };
        Self { plan: plan.clone(), cursor }
    }

    pub fn plan(&self) -> &Rc<Plan> {
        &self.plan
    }

    /// Rewinds to position 0. The context binding is kept, so the same
    /// evaluation can be enumerated again.
    pub fn reset(&mut self) {
        self.cursor.as_dyn_mut().reset();
    }

    /// Binds this query (and transitively its sub-queries) to `context`.
    pub fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.cursor.as_dyn_mut().evaluate(context)
    }

    /// Next node, or `None` once exhausted (and on every call after that).
    pub fn advance(&mut self) -> Result<Option<C>, Error> {
        self.cursor.as_dyn_mut().advance()
    }

    pub fn current(&self) -> Option<C> {
        self.cursor.as_dyn().current().cloned()
    }

    pub fn current_position(&self) -> usize {
        self.cursor.as_dyn().current_position()
    }

    /// Number of nodes this evaluation yields. Never disturbs `self`.
    pub fn count(&self) -> Result<usize, Error> {
        if let Some(n) = self.cursor.as_dyn().known_count() {
            return Ok(n);
        }
        let mut probe = self.clone();
        probe.reset();
        let mut n = 0;
        while probe.advance()?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Reverse membership test: the context node `candidate` would have been
    /// selected from, or `None` when it is not selected by this pattern.
    pub fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        self.cursor.as_dyn_mut().match_node(candidate)
    }

    pub fn static_type(&self) -> ResultType {
        self.plan.static_type()
    }

    pub fn properties(&self) -> QueryProps {
        self.plan.properties()
    }

    pub fn default_priority(&self) -> f64 {
        self.plan.default_priority()
    }

    /// Drains the remaining nodes.
    pub fn collect_nodes(&mut self) -> Result<Vec<C>, Error> {
        let mut out = Vec::new();
        while let Some(n) = self.advance()? {
            out.push(n);
        }
        Ok(out)
    }

    /// Evaluates a node-set query against `context` and drains it.
    pub fn select(&mut self, context: &C) -> Result<Vec<C>, Error> {
        match self.evaluate(context)? {
            Value::NodeSet => self.collect_nodes(),
            other => Err(Error::type_error(format!("expected a node-set, got {:?}", other.result_type()))),
        }
    }
}
