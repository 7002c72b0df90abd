//! Lazy, pull-based XPath query cursors over any navigable tree.
//!
//! Build a [`Plan`], instantiate it with [`Query::new`], bind it with
//! [`Query::evaluate`] and pull nodes with [`Query::advance`]. Node sequences
//! come out in document order without duplicates, including the reverse axes
//! and steps over upstreams whose nodes nest. Plans built from
//! invertible steps can also be run upwards with [`Query::match_node`] to
//! test pattern membership.
pub mod error;
pub mod order;
pub mod plan;
pub mod query;
pub mod set_ops;
pub mod simple_tree;
pub mod tree;
pub mod value;

pub use error::{Error, ErrorCode};
pub use node_test::{KindTest, NodeTest};
pub use order::{insert_sorted, is_document_ordered, DocumentOrderComparer};
pub use plan::{Axis, Literal, Op, Plan, QueryProps, ResultType, SetOp, StepShape};
pub use query::Query;
pub use set_ops::{DifferenceIterator, IntersectIterator, SetIteratorResult, UnionIterator};
pub use simple_tree::{SimpleCursor, SimpleNodeBuilder};
pub use tree::{NodeKind, NodeOrder, TreeCursor};
pub use value::Value;
