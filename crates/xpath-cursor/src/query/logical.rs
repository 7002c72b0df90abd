//! Comparisons (`=`, `!=`, `<`, `<=`, `>`, `>=`) with XPath 1.0 coercions,
//! and literal operands.
use std::marker::PhantomData;

use super::{Query, QueryCursor};
use crate::error::Error;
use crate::plan::{Literal, Op};
use crate::tree::TreeCursor;
use crate::value::{boolean_to_number, number_to_boolean, string_to_number, Value};

/// One evaluated side of a comparison. Node sets are still lazy: they are
/// drained from the operand's query while comparing.
enum Operand<'q, C: TreeCursor> {
    Number(f64),
    String(String),
    Boolean(bool),
    Nodes(&'q mut Query<C>),
    Fragment(String),
}

impl<'q, C: TreeCursor> Operand<'q, C> {
    fn new(value: Value<C>, query: &'q mut Query<C>) -> Self {
        match value {
            Value::Number(n) => Operand::Number(n),
            Value::String(s) => Operand::String(s),
            Value::Boolean(b) => Operand::Boolean(b),
            Value::NodeSet => Operand::Nodes(query),
            Value::Fragment(node) => Operand::Fragment(node.value()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Operand::Number(_) => 0,
            Operand::String(_) => 1,
            Operand::Boolean(_) => 2,
            Operand::Nodes(_) => 3,
            Operand::Fragment(_) => 4,
        }
    }
}

fn compare_numbers(op: Op, a: f64, b: f64) -> bool {
    match op {
        Op::Eq => a == b,
        Op::Ne => a != b,
        Op::Lt => a < b,
        Op::Le => a <= b,
        Op::Gt => a > b,
        Op::Ge => a >= b,
    }
}

fn compare_strings(op: Op, a: &str, b: &str) -> bool {
    match op {
        Op::Eq => a == b,
        Op::Ne => a != b,
        _ => compare_numbers(op, string_to_number(a), string_to_number(b)),
    }
}

fn compare_booleans(op: Op, a: bool, b: bool) -> bool {
    match op {
        Op::Eq => a == b,
        Op::Ne => a != b,
        _ => compare_numbers(op, boolean_to_number(a), boolean_to_number(b)),
    }
}

fn string_values<C: TreeCursor>(nodes: &mut Query<C>) -> Result<Vec<String>, Error> {
    let mut out = Vec::new();
    while let Some(n) = nodes.advance()? {
        out.push(n.value());
    }
    Ok(out)
}

/// `true` if any node's string value satisfies `test`.
fn any_node<C: TreeCursor>(nodes: &mut Query<C>, mut test: impl FnMut(&str) -> bool) -> Result<bool, Error> {
    while let Some(n) = nodes.advance()? {
        if test(&n.value()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Compares `left op right` where `left` has the higher (or equal) rank.
fn compare_ranked<C: TreeCursor>(op: Op, left: Operand<'_, C>, right: Operand<'_, C>) -> Result<bool, Error> {
    use Operand as O;
    Ok(match (left, right) {
        (O::Fragment(a), O::Fragment(b)) => compare_strings(op, &a, &b),
        // a fragment behaves like its string value
        (O::Fragment(a), other) => return compare(op, O::String(a), other),
        (O::Nodes(a), O::Nodes(b)) => {
            let right_values = string_values(b)?;
            if right_values.is_empty() {
                return Ok(false);
            }
            if op.is_equality() {
                any_node(a, |l| right_values.iter().any(|r| compare_strings(op, l, r)))?
            } else {
                let right_numbers: Vec<f64> = right_values.iter().map(|r| string_to_number(r)).collect();
                any_node(a, |l| {
                    let l = string_to_number(l);
                    right_numbers.iter().any(|&r| compare_numbers(op, l, r))
                })?
            }
        }
        (O::Nodes(a), O::Number(n)) => any_node(a, |l| compare_numbers(op, string_to_number(l), n))?,
        (O::Nodes(a), O::String(s)) => any_node(a, |l| compare_strings(op, l, &s))?,
        (O::Nodes(a), O::Boolean(b)) => {
            let non_empty = a.advance()?.is_some();
            compare_booleans(op, non_empty, b)
        }
        (O::Boolean(a), O::Boolean(b)) => compare_booleans(op, a, b),
        (O::Boolean(a), O::String(s)) => {
            if op.is_equality() {
                compare_booleans(op, a, !s.is_empty())
            } else {
                compare_numbers(op, boolean_to_number(a), string_to_number(&s))
            }
        }
        (O::Boolean(a), O::Number(n)) => {
            if op.is_equality() {
                compare_booleans(op, a, number_to_boolean(n))
            } else {
                compare_numbers(op, boolean_to_number(a), n)
            }
        }
        (O::String(a), O::String(b)) => compare_strings(op, &a, &b),
        (O::String(a), O::Number(n)) => compare_numbers(op, string_to_number(&a), n),
        (O::Number(a), O::Number(b)) => compare_numbers(op, a, b),
        (l, r) => {
            return Err(Error::type_error(format!(
                "cannot compare operands of rank {} and {}",
                l.rank(),
                r.rank()
            )));
        }
    })
}

/// Orders the operands by rank (swapping and inverting `op` when needed)
/// and dispatches.
fn compare<C: TreeCursor>(op: Op, left: Operand<'_, C>, right: Operand<'_, C>) -> Result<bool, Error> {
    if left.rank() < right.rank() { compare_ranked(op.invert(), right, left) } else { compare_ranked(op, left, right) }
}

/// `left op right`, evaluated against one context node.
#[derive(Debug, Clone)]
pub struct LogicalExpr<C: TreeCursor> {
    op: Op,
    left: Box<Query<C>>,
    right: Box<Query<C>>,
}

impl<C: TreeCursor> LogicalExpr<C> {
    pub(crate) fn new(op: Op, left: Box<Query<C>>, right: Box<Query<C>>) -> Self {
        Self { op, left, right }
    }
}

impl<C: TreeCursor> QueryCursor<C> for LogicalExpr<C> {
    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        let left_value = self.left.evaluate(context)?;
        let right_value = self.right.evaluate(context)?;
        let left = Operand::new(left_value, &mut self.left);
        let right = Operand::new(right_value, &mut self.right);
        compare(self.op, left, right).map(Value::Boolean)
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        Err(Error::type_error("a comparison does not produce nodes"))
    }

    fn current(&self) -> Option<&C> {
        None
    }

    fn current_position(&self) -> usize {
        0
    }

    fn shape_name(&self) -> &'static str {
        "comparison"
    }
}

/// Literal number, string or boolean.
#[derive(Debug, Clone)]
pub struct OperandQuery {
    literal: Literal,
}

impl OperandQuery {
    pub(crate) fn new(literal: Literal) -> Self {
        Self { literal }
    }
}

impl<C: TreeCursor> QueryCursor<C> for OperandQuery {
    fn reset(&mut self) {}

    fn evaluate(&mut self, _context: &C) -> Result<Value<C>, Error> {
        Ok(match &self.literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
        })
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        Err(Error::type_error("a literal does not produce nodes"))
    }

    fn current(&self) -> Option<&C> {
        None
    }

    fn current_position(&self) -> usize {
        0
    }

    fn shape_name(&self) -> &'static str {
        "literal"
    }
}

/// The context node taken as a result tree fragment.
#[derive(Debug, Clone)]
pub struct FragmentQuery<C> {
    _node: PhantomData<C>,
}

impl<C> FragmentQuery<C> {
    pub(crate) fn new() -> Self {
        Self { _node: PhantomData }
    }
}

impl<C: TreeCursor> QueryCursor<C> for FragmentQuery<C> {
    fn reset(&mut self) {}

    fn evaluate(&mut self, context: &C) -> Result<Value<C>, Error> {
        Ok(Value::Fragment(context.clone()))
    }

    fn advance(&mut self) -> Result<Option<C>, Error> {
        Err(Error::type_error("a fragment does not produce nodes"))
    }

    fn current(&self) -> Option<&C> {
        None
    }

    fn current_position(&self) -> usize {
        0
    }

    fn shape_name(&self) -> &'static str {
        "fragment"
    }
}
