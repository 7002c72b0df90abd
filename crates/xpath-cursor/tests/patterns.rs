mod common;

use std::rc::Rc;

use common::*;
use rstest::{fixture, rstest};
use xpath_cursor::{ErrorCode, NodeKind, NodeTest, Op, Plan, Query, SimpleCursor, TreeCursor};

#[fixture]
fn root() -> SimpleCursor {
    init_tracing();
    sample()
}

fn matches(plan: &Rc<Plan>, candidate: &SimpleCursor) -> bool {
    Query::new(plan).match_node(candidate).expect("valid pattern").is_some()
}

fn child_b() -> Rc<Plan> {
    Plan::child(&Plan::context(), NodeTest::name("b"))
}

#[rstest]
fn child_pattern_returns_the_parent(root: SimpleCursor) {
    let b1 = nth(&root, "b", 0);
    let hit = Query::new(&child_b()).match_node(&b1).unwrap().expect("b matches");
    assert_eq!(hit.local_name(), "a");
    assert!(hit.is_same_position(&nth(&root, "a", 0)));

    assert!(!matches(&child_b(), &nth(&root, "c", 0)));
    let text = {
        let mut t = b1.clone();
        assert!(t.move_to_first_child());
        t
    };
    assert!(!matches(&child_b(), &text));
    assert!(matches(&Plan::child(&Plan::context(), NodeTest::kind(NodeKind::Text)), &text));
}

#[rstest]
fn absolute_pattern_is_anchored_at_the_document(root: SimpleCursor) {
    let a1 = nth(&root, "a", 0);
    let hit = Query::new(&root_a()).match_node(&a1).unwrap().expect("a matches");
    assert_eq!(hit.node_kind(), NodeKind::Document);

    let rooted_b = Plan::child(&Plan::root(), NodeTest::name("b"));
    assert!(!matches(&rooted_b, &nth(&root, "b", 0)));
    assert!(matches(&Plan::root(), &root));
    assert!(!matches(&Plan::root(), &a1));
    assert!(matches(&Plan::context(), &a1));
}

#[rstest]
fn abbreviated_descendant_pattern(root: SimpleCursor) {
    let any_b = Plan::descendant(&Plan::root(), NodeTest::name("b"), false, true);
    for b in root.find_all("b") {
        assert!(matches(&any_b, &b), "{b:?}");
    }
    assert!(!matches(&any_b, &nth(&root, "c", 0)));

    let b_under_a = Plan::child(&Plan::descendant(&Plan::root(), NodeTest::name("a"), false, true), NodeTest::name("b"));
    assert!(matches(&b_under_a, &nth(&root, "b", 0)));
    assert!(!matches(&b_under_a, &nth(&root, "b", 2)));
    assert!(matches(&b_under_a, &nth(&root, "b", 3)));
}

#[rstest]
fn node_pattern_never_matches_attributes(root: SimpleCursor) {
    let any_node = Plan::descendant(&Plan::root(), NodeTest::any_node(), true, true);
    let a1 = nth(&root, "a", 0);
    assert!(matches(&any_node, &a1));
    assert!(matches(&any_node, &root));
    let id = a1.attribute("id").expect("a has an id");
    assert!(!matches(&any_node, &id));
    assert!(!select(&any_node, &root).contains(&id));
}

#[rstest]
fn explicit_descendant_is_not_a_pattern(root: SimpleCursor) {
    let plan = Plan::descendant(&Plan::root(), NodeTest::name("b"), false, false);
    let err = Query::new(&plan).match_node(&nth(&root, "b", 0)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPattern);
}

#[rstest]
fn attribute_pattern(root: SimpleCursor) {
    let a1 = nth(&root, "a", 0);
    let id = a1.attribute("id").expect("id");
    let class = a1.attribute("class").expect("class");
    let plan = Plan::attribute(&Plan::context(), NodeTest::name("id"));
    assert!(matches(&plan, &id));
    assert!(!matches(&plan, &class));
    assert!(!matches(&plan, &a1));
    // attributes are never children
    assert!(!matches(&Plan::child(&Plan::context(), NodeTest::any_node()), &id));
}

#[rstest]
#[case::first_b(0, false)]
#[case::second_b(1, true)]
#[case::nested_b(2, false)]
#[case::other_parent(3, false)]
fn literal_child_position(root: SimpleCursor, #[case] index: usize, #[case] expected: bool) {
    let plan = Plan::filter(&child_b(), &Plan::number(2.0));
    assert_eq!(matches(&plan, &nth(&root, "b", index)), expected);
}

#[rstest]
fn literal_attribute_position(root: SimpleCursor) {
    let a1 = nth(&root, "a", 0);
    let plan = Plan::filter(&Plan::attribute(&Plan::context(), NodeTest::wildcard()), &Plan::number(2.0));
    assert!(matches(&plan, &a1.attribute("class").expect("class")));
    assert!(!matches(&plan, &a1.attribute("id").expect("id")));
}

#[rstest]
fn predicate_patterns(root: SimpleCursor) {
    let a_with_c = Plan::filter(
        &Plan::child(&Plan::context(), NodeTest::name("a")),
        &Plan::child(&Plan::context(), NodeTest::name("c")),
    );
    assert!(matches(&a_with_c, &nth(&root, "a", 0)));
    assert!(!matches(&a_with_c, &nth(&root, "a", 1)));

    let b_two = Plan::filter(&child_b(), &Plan::compare(Op::Eq, &Plan::context(), &Plan::string("two")));
    assert!(matches(&b_two, &nth(&root, "b", 1)));
    assert!(!matches(&b_two, &nth(&root, "b", 0)));

    let fragment = Plan::filter(&child_b(), &Plan::fragment());
    assert!(matches(&fragment, &nth(&root, "b", 0)));
}

#[rstest]
fn positional_pattern_over_filtered_input(root: SimpleCursor) {
    let plan = Plan::filter(&Plan::filter(&child_b(), &Plan::boolean(true)), &Plan::number(2.0));
    assert!(matches(&plan, &nth(&root, "b", 1)));
    assert!(!matches(&plan, &nth(&root, "b", 0)));
    assert!(!matches(&plan, &nth(&root, "b", 3)));
}

#[rstest]
fn following_sibling_pattern(root: SimpleCursor) {
    let c_after_b = Plan::following_sibling(&child_b(), NodeTest::name("c"));
    assert!(matches(&c_after_b, &nth(&root, "c", 0)));
    let d_after_b = Plan::following_sibling(&child_b(), NodeTest::name("d"));
    assert!(!matches(&d_after_b, &nth(&root, "d", 0)));
}

#[rstest]
fn namespace_pattern(root: SimpleCursor) {
    let ns_nodes = select(&Plan::namespace(&root_a(), NodeTest::wildcard()), &root);
    let plan = Plan::namespace(&Plan::child(&Plan::context(), NodeTest::name("a")), NodeTest::name("p"));
    let hit = Query::new(&plan).match_node(&ns_nodes[0]).unwrap().expect("namespace matches");
    assert_eq!(hit.local_name(), "root");

    let other = Plan::namespace(&Plan::context(), NodeTest::name("q"));
    assert!(!matches(&other, &ns_nodes[0]));
    assert!(!matches(&plan, &nth(&root, "a", 0)));
}

#[rstest]
#[case::name(Plan::child(&Plan::context(), NodeTest::name("b")), 0.0)]
#[case::attribute_name(Plan::attribute(&Plan::context(), NodeTest::name("id")), 0.0)]
#[case::namespace_wildcard(Plan::child(&Plan::context(), NodeTest::namespace_wildcard("urn:p")), -0.25)]
#[case::wildcard(Plan::child(&Plan::context(), NodeTest::wildcard()), -0.5)]
#[case::kind(Plan::child(&Plan::context(), NodeTest::kind(NodeKind::Text)), -0.5)]
#[case::path(root_a(), 0.5)]
#[case::predicate(Plan::filter(&Plan::child(&Plan::context(), NodeTest::name("b")), &Plan::number(1.0)), 0.5)]
fn default_priorities(#[case] plan: Rc<Plan>, #[case] expected: f64) {
    let q: Query<SimpleCursor> = Query::new(&plan);
    assert!((q.default_priority() - expected).abs() < f64::EPSILON, "{plan:?}");
}
