mod common;

use std::rc::Rc;

use common::*;
use rstest::{fixture, rstest};
use xpath_cursor::{ErrorCode, NodeTest, Op, Plan, Query, SimpleCursor, Value};

#[fixture]
fn root() -> SimpleCursor {
    init_tracing();
    sample()
}

/// `/root/a/b`: string values "one", "two", "five".
fn bs() -> Rc<Plan> {
    Plan::child(&root_a(), NodeTest::name("b"))
}

/// `/root/a/@id`: "1", "2".
fn ids() -> Rc<Plan> {
    Plan::attribute(&root_a(), NodeTest::name("id"))
}

/// `/root/missing`: always empty.
fn empty() -> Rc<Plan> {
    Plan::child(&root_elem(), NodeTest::name("missing"))
}

#[rstest]
#[case::eq_any_match(Op::Eq, "two", true)]
#[case::eq_no_match(Op::Eq, "three", false)]
#[case::ne_some_differ(Op::Ne, "two", true)]
fn node_set_against_string(root: SimpleCursor, #[case] op: Op, #[case] s: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(&Plan::compare(op, &bs(), &Plan::string(s)), &root), expected);
}

#[rstest]
#[case::eq(Op::Eq, 2.0, true)]
#[case::gt(Op::Gt, 1.0, true)]
#[case::gt_none(Op::Gt, 2.0, false)]
#[case::le(Op::Le, 1.0, true)]
#[case::lt_none(Op::Lt, 1.0, false)]
fn node_set_against_number(root: SimpleCursor, #[case] op: Op, #[case] n: f64, #[case] expected: bool) {
    assert_eq!(eval_bool(&Plan::compare(op, &ids(), &Plan::number(n)), &root), expected);
}

#[rstest]
fn non_numeric_strings_compare_as_nan(root: SimpleCursor) {
    for op in [Op::Eq, Op::Lt, Op::Le, Op::Gt, Op::Ge] {
        assert!(!eval_bool(&Plan::compare(op, &bs(), &Plan::number(1.0)), &root), "{op:?}");
    }
    assert!(eval_bool(&Plan::compare(Op::Ne, &bs(), &Plan::number(1.0)), &root));
}

#[rstest]
fn node_set_against_node_set(root: SimpleCursor) {
    let d = Plan::child(&root_elem(), NodeTest::name("d"));
    // "4" > "1" and "4" > "2"
    assert!(eval_bool(&Plan::compare(Op::Gt, &d, &ids()), &root));
    assert!(!eval_bool(&Plan::compare(Op::Lt, &d, &ids()), &root));
    assert!(!eval_bool(&Plan::compare(Op::Eq, &d, &ids()), &root));
    assert!(eval_bool(&Plan::compare(Op::Ne, &d, &ids()), &root));

    let same = Plan::compare(Op::Eq, &bs(), &Plan::descendant(&root_elem(), NodeTest::name("b"), false, false));
    assert!(eval_bool(&same, &root));

    // an empty side makes every comparison false
    for op in [Op::Eq, Op::Ne, Op::Lt, Op::Ge] {
        assert!(!eval_bool(&Plan::compare(op, &bs(), &empty()), &root));
        assert!(!eval_bool(&Plan::compare(op, &empty(), &bs()), &root));
    }
}

#[rstest]
#[case::non_empty_eq_true(bs(), Op::Eq, true, true)]
#[case::non_empty_ne_false(bs(), Op::Ne, false, true)]
#[case::empty_eq_false(empty(), Op::Eq, false, true)]
#[case::empty_eq_true(empty(), Op::Eq, true, false)]
#[case::non_empty_gt_false(bs(), Op::Gt, false, true)]
fn node_set_against_boolean(
    root: SimpleCursor,
    #[case] nodes: Rc<Plan>,
    #[case] op: Op,
    #[case] b: bool,
    #[case] expected: bool,
) {
    assert_eq!(eval_bool(&Plan::compare(op, &nodes, &Plan::boolean(b)), &root), expected);
}

#[rstest]
#[case::string_equality(Plan::string("2"), Op::Eq, Plan::string("2.0"), false)]
#[case::string_ordering_is_numeric(Plan::string("2"), Op::Lt, Plan::string("10"), true)]
#[case::string_number(Plan::string(" 2.0 "), Op::Eq, Plan::number(2.0), true)]
#[case::boolean_string_equality(Plan::boolean(true), Op::Eq, Plan::string("x"), true)]
#[case::boolean_empty_string(Plan::boolean(false), Op::Eq, Plan::string(""), true)]
#[case::boolean_number_equality(Plan::boolean(true), Op::Eq, Plan::number(0.0), false)]
#[case::boolean_number_ordering(Plan::boolean(true), Op::Ge, Plan::number(1.0), true)]
#[case::boolean_ordering(Plan::boolean(true), Op::Gt, Plan::boolean(false), true)]
#[case::nan_never_equal(Plan::number(f64::NAN), Op::Eq, Plan::number(f64::NAN), false)]
#[case::nan_always_different(Plan::number(f64::NAN), Op::Ne, Plan::number(f64::NAN), true)]
fn scalar_rules(
    root: SimpleCursor,
    #[case] left: Rc<Plan>,
    #[case] op: Op,
    #[case] right: Rc<Plan>,
    #[case] expected: bool,
) {
    assert_eq!(eval_bool(&Plan::compare(op, &left, &right), &root), expected);
}

#[rstest]
fn fragment_compares_as_its_string_value(root: SimpleCursor) {
    let b2 = nth(&root, "b", 1);
    assert!(eval_bool(&Plan::compare(Op::Eq, &Plan::fragment(), &Plan::string("two")), &b2));
    assert!(eval_bool(&Plan::compare(Op::Eq, &Plan::string("two"), &Plan::fragment()), &b2));
    assert!(eval_bool(&Plan::compare(Op::Eq, &Plan::fragment(), &bs()), &b2));
    assert!(eval_bool(&Plan::compare(Op::Eq, &Plan::fragment(), &Plan::fragment()), &b2));

    let d = nth(&root, "d", 0);
    assert!(eval_bool(&Plan::compare(Op::Gt, &Plan::fragment(), &Plan::number(3.0)), &d));
    assert!(eval_bool(&Plan::compare(Op::Lt, &Plan::number(3.0), &Plan::fragment()), &d));
}

#[rstest]
#[case::number(Plan::number(1.0))]
#[case::string(Plan::string("two"))]
#[case::boolean(Plan::boolean(true))]
#[case::nodes(Plan::child(&Plan::child(&Plan::root(), NodeTest::name("root")), NodeTest::name("d")))]
fn swapping_operands_inverts_the_operator(root: SimpleCursor, #[case] other: Rc<Plan>) {
    for op in [Op::Eq, Op::Ne, Op::Lt, Op::Le, Op::Gt, Op::Ge] {
        let forward = eval_bool(&Plan::compare(op, &ids(), &other), &root);
        let swapped = eval_bool(&Plan::compare(op.invert(), &other, &ids()), &root);
        assert_eq!(forward, swapped, "{op:?}");
    }
}

#[rstest]
fn comparison_is_not_a_node_set(root: SimpleCursor) {
    let mut q = Query::new(&Plan::compare(Op::Eq, &bs(), &Plan::string("two")));
    assert_eq!(q.evaluate(&root).unwrap(), Value::Boolean(true));
    assert_eq!(q.advance().unwrap_err().code(), ErrorCode::TypeError);
    assert_eq!(q.select(&root).unwrap_err().code(), ErrorCode::TypeError);
}
