use super::{Query, QueryCursor};
use crate::error::Error;
use crate::plan::{Axis, Literal, Plan, QueryProps, ResultType};
use crate::tree::TreeCursor;
use crate::value::Value;

/// `input[cond]`.
///
/// Output positions restart together with the upstream's positions, so a
/// filter over `a/b` numbers the `b` children of every `a` separately.
#[derive(Debug, Clone)]
pub struct FilterQuery<C: TreeCursor> {
    input: Box<Query<C>>,
    cond: Box<Query<C>>,
    no_position: bool,
    /// Upstream positions run backwards and never signal a new context.
    reverse_input: bool,
    last_input_position: usize,
    position: usize,
    current: Option<C>,
}

impl<C: TreeCursor> FilterQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>, cond: Box<Query<C>>, no_position: bool) -> Self {
        let reverse_input = input.properties().contains(QueryProps::REVERSE);
        Self { input, cond, no_position, reverse_input, last_input_position: 0, position: 0, current: None }
    }

    /// Evaluates the condition with `node` as context. Numeric results are
    /// compared with the upstream's current position.
    fn evaluate_predicate(&mut self, node: &C) -> Result<bool, Error> {
        Ok(match self.cond.evaluate(node)? {
            Value::Boolean(b) => b,
            Value::Number(n) => n == self.input.current_position() as f64,
            Value::String(s) => !s.is_empty(),
            Value::NodeSet => self.cond.advance()?.is_some(),
            Value::Fragment(_) => true,
        })
    }

    /// `child::x[n]` / `attribute::x[n]` with a literal `n`: count the matching
    /// siblings (or attributes) up to `candidate`.
    fn match_literal_position(&self, candidate: &C, n: f64) -> Option<bool> {
        let Plan::Step { shape, .. } = &**self.input.plan() else { return None };
        let principal = shape.principal_kind();
        let mut probe = candidate.clone();
        if !probe.move_to_parent() {
            return Some(false);
        }
        let (first, next): (fn(&mut C) -> bool, fn(&mut C) -> bool) = match shape.axis {
            Axis::Child => (C::move_to_first_child, C::move_to_next_sibling),
            Axis::Attribute => (C::move_to_first_attribute, C::move_to_next_attribute),
            _ => return None,
        };
        if !first(&mut probe) {
            return Some(false);
        }
        let mut i = 0usize;
        loop {
            if shape.test.matches(&probe, principal) {
                i += 1;
                if probe.is_same_position(candidate) {
                    return Some(n == i as f64);
                }
            }
            if !next(&mut probe) {
                return Some(false);
            }
        }
    }
}

impl<C: TreeCursor> QueryCursor<C> for FilterQuery<C> {
    fn reset(&mut self) {
        self.position = 0;
        self.last_input_position = 0;
        self.current = None;
        self.input.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.input.evaluate(context)?;
        self.position = 0;
        self.last_input_position = 0;
        self.current = None;
        Ok(Value::NodeSet)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        while let Some(node) = self.input.advance()? {
            let input_position = self.input.current_position();
            if !self.reverse_input && input_position <= self.last_input_position {
                self.position = 0;
            }
            self.last_input_position = input_position;
            if self.evaluate_predicate(&node)? {
                self.position += 1;
                self.current = Some(node.clone());
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    fn current_position(&self) -> usize {
        self.position
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        let Some(context) = self.input.match_node(candidate)? else { return Ok(None) };
        let accept = |ok: bool| if ok { Some(context.clone()) } else { None };
        match self.cond.static_type() {
            ResultType::Number => {
                if let Plan::Literal(Literal::Number(n)) = **self.cond.plan()
                    && let Some(ok) = self.match_literal_position(candidate, n)
                {
                    return Ok(accept(ok));
                }
            }
            ResultType::NodeSet => return Ok(accept(self.evaluate_predicate(candidate)?)),
            ResultType::Boolean | ResultType::String if self.no_position => {
                return Ok(accept(self.evaluate_predicate(candidate)?));
            }
            ResultType::Fragment => return Ok(Some(context)),
            _ => {}
        }
        // generic case: enumerate the filter from the matched context
        let mut probe = self.clone();
        probe.evaluate(&context)?;
        while let Some(node) = probe.advance()? {
            if node.is_same_position(candidate) {
                return Ok(Some(context));
            }
        }
        Ok(None)
    }

    fn shape_name(&self) -> &'static str {
        "filter"
    }
}

/// Buffers a reverse-axis input and reports positions counted from the
/// end, so `ancestor::*[1]` is the nearest ancestor.
#[derive(Debug, Clone)]
pub struct ReversePositionQuery<C: TreeCursor> {
    input: Box<Query<C>>,
    buffer: Vec<C>,
    position: usize,
    bound: bool,
}

impl<C: TreeCursor> ReversePositionQuery<C> {
    pub(crate) fn new(input: Box<Query<C>>) -> Self {
        Self { input, buffer: Vec::new(), position: 0, bound: false }
    }
}

impl<C: TreeCursor> QueryCursor<C> for ReversePositionQuery<C> {
    fn reset(&mut self) {
        self.position = 0;
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        self.input.evaluate(context)?;
        self.buffer.clear();
        while let Some(node) = self.input.advance()? {
            self.buffer.push(node);
        }
        self.position = 0;
        self.bound = true;
        Ok(Value::NodeSet)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        if !self.bound {
            return Err(Error::context_undefined(self.shape_name()));
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

    fn current_position(&self) -> usize {
        if self.position == 0 { 0 } else { self.buffer.len() - self.position + 1 }
    }

    fn known_count(&self) -> Option<usize> {
        self.bound.then_some(self.buffer.len())
    }

    fn match_node(&mut self, candidate: &C) -> Result<Option<C>, Error> {
        self.input.match_node(candidate)
    }

    fn shape_name(&self) -> &'static str {
        "reverse position"
    }
}
