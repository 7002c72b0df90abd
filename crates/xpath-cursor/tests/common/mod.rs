#![allow(dead_code)]

use std::rc::Rc;

use xpath_cursor::simple_tree::{attr, doc, elem, ns, text};
use xpath_cursor::{NodeKind, NodeTest, Plan, Query, SimpleCursor, TreeCursor, Value};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `<a><b/><c><d/></c></a>`
pub fn abcd() -> SimpleCursor {
    doc().child(elem("a").child(elem("b")).child(elem("c").child(elem("d")))).build()
}

/// ```xml
/// <root xmlns:p="urn:p">
///   <a id="1" class="x"><b>one</b><b>two</b><c><b>three</b></c></a>
///   <d>4</d>
///   <a id="2"><b>five</b></a>
/// </root>
/// ```
pub fn sample() -> SimpleCursor {
    doc()
        .child(
            elem("root")
                .namespace(ns("p", "urn:p"))
                .child(
                    elem("a")
                        .attr(attr("id", "1"))
                        .attr(attr("class", "x"))
                        .child(elem("b").child(text("one")))
                        .child(elem("b").child(text("two")))
                        .child(elem("c").child(elem("b").child(text("three")))),
                )
                .child(elem("d").child(text("4")))
                .child(elem("a").attr(attr("id", "2")).child(elem("b").child(text("five")))),
        )
        .build()
}

/// `name` for elements, `@name` for attributes, `ns:prefix` for namespace
/// nodes, `#kind` otherwise.
pub fn label(n: &SimpleCursor) -> String {
    match n.node_kind() {
        NodeKind::Element => n.local_name().to_string(),
        NodeKind::Attribute => format!("@{}", n.local_name()),
        NodeKind::Namespace => format!("ns:{}", n.local_name()),
        NodeKind::Text => format!("#text:{}", n.value()),
        other => format!("#{other:?}"),
    }
}

pub fn labels(nodes: &[SimpleCursor]) -> Vec<String> {
    nodes.iter().map(label).collect()
}

pub fn values(nodes: &[SimpleCursor]) -> Vec<String> {
    nodes.iter().map(TreeCursor::value).collect()
}

pub fn select(plan: &Rc<Plan>, context: &SimpleCursor) -> Vec<SimpleCursor> {
    Query::new(plan).select(context).expect("node-set query")
}

pub fn select_labels(plan: &Rc<Plan>, context: &SimpleCursor) -> Vec<String> {
    labels(&select(plan, context))
}

pub fn select_values(plan: &Rc<Plan>, context: &SimpleCursor) -> Vec<String> {
    values(&select(plan, context))
}

pub fn eval_bool(plan: &Rc<Plan>, context: &SimpleCursor) -> bool {
    match Query::new(plan).evaluate(context).expect("evaluate") {
        Value::Boolean(b) => b,
        other => panic!("expected boolean, got {other:?}"),
    }
}

/// `/root`
pub fn root_elem() -> Rc<Plan> {
    Plan::child(&Plan::root(), NodeTest::name("root"))
}

/// `/root/a`
pub fn root_a() -> Rc<Plan> {
    Plan::child(&root_elem(), NodeTest::name("a"))
}

/// Every node of the document (attributes and namespace nodes included), in
/// document order.
pub fn all_nodes(document: &SimpleCursor) -> Vec<SimpleCursor> {
    let everything = Plan::descendant(&Plan::root(), NodeTest::any_node(), true, false);
    let attrs = Plan::attribute(&everything, NodeTest::any_node());
    let namespaces = Plan::namespace(&everything, NodeTest::any_node());
    let plan = Plan::union(&Plan::union(&everything, &attrs), &namespaces);
    select(&plan, document)
}

/// Element number `nth` (0-based, document order) named `local`.
pub fn nth(document: &SimpleCursor, local: &str, nth: usize) -> SimpleCursor {
    document.find_all(local).into_iter().nth(nth).expect("element present")
}
