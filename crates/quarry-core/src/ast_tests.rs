use std::collections::HashSet;

use crate::Error;
use crate::ast::{self, BoolOp, CompareOp, Field, Node};
use crate::value::Value;

#[test]
fn equal_nodes_hash_identically() {
    let a = ast::eq("id", 1).unwrap();
    let b = ast::eq("id", 1).unwrap();
    let c = ast::eq("id", 2).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let set: HashSet<Node> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn kind_participates_in_equality() {
    assert_ne!(ast::eq("n", 1).unwrap(), ast::not_eq("n", 1).unwrap());
    assert_ne!(ast::gt("n", 1).unwrap(), ast::gte("n", 1).unwrap());
    assert_ne!(ast::in_("n", [1]).unwrap(), ast::not_in("n", [1]).unwrap());
    assert_ne!(
        ast::matches("n", "x").unwrap(),
        ast::prefix("n", "x").unwrap()
    );
}

#[test]
fn floats_compare_by_bits() {
    let a = ast::lt("price", 1.5).unwrap();
    let b = ast::lt("price", 1.5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn blank_field_is_rejected() {
    let err = ast::eq("  ", 1).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn empty_membership_is_rejected() {
    let err = ast::in_("brand_id", Vec::<i64>::new()).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidArgument("membership list for `brand_id` must not be empty".into())
    );
}

#[test]
fn blank_raw_and_text_are_rejected() {
    assert!(ast::raw("   ").is_err());
    assert!(ast::matches("title", "").is_err());
    assert!(ast::prefix("title", " ").is_err());
}

#[test]
fn non_finite_float_is_rejected() {
    let err = ast::gt("price", f64::NAN).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

#[test]
fn and_flattens_same_kind_only() {
    let inner_and = ast::and([ast::eq("a", 1).unwrap(), ast::eq("b", 2).unwrap()]).unwrap();
    let inner_or = ast::or([ast::eq("c", 3).unwrap(), ast::eq("d", 4).unwrap()]).unwrap();
    let node = ast::and([inner_and, inner_or.clone(), ast::eq("e", 5).unwrap()]).unwrap();

    let Node::Bool { op, children } = node else {
        panic!("expected boolean node");
    };
    assert_eq!(op, BoolOp::And);
    assert_eq!(children.len(), 4);
    assert_eq!(children[2], inner_or);
}

#[test]
fn group_is_not_flattened() {
    let grouped = ast::group(ast::and([ast::eq("a", 1).unwrap()]).unwrap());
    let node = ast::and([grouped.clone(), ast::eq("b", 2).unwrap()]).unwrap();
    let Node::Bool { children, .. } = node else {
        panic!("expected boolean node");
    };
    assert_eq!(children[0], grouped);
}

#[test]
fn empty_boolean_is_rejected() {
    assert!(ast::and(Vec::new()).is_err());
    assert!(ast::or(Vec::new()).is_err());
}

#[test]
fn negate_inverts_eq_and_in_only() {
    assert_eq!(
        ast::eq("id", 1).unwrap().negate(),
        ast::not_eq("id", 1).unwrap()
    );
    assert_eq!(
        ast::in_("id", [1, 2]).unwrap().negate(),
        ast::not_in("id", [1, 2]).unwrap()
    );
    let gt = ast::gt("price", 10).unwrap();
    assert_eq!(gt.negate(), gt);
    let m = ast::matches("title", "shoe").unwrap();
    assert_eq!(m.negate(), m);
}

#[test]
fn joined_fields_display_with_dot() {
    let f = Field::joined("brand", "name").unwrap();
    assert_eq!(f.to_string(), "brand.name");
    assert_eq!(f.assoc(), Some("brand"));
    assert!(Field::joined("", "name").is_err());
}

#[test]
fn visit_fields_walks_in_order() {
    let node = ast::or([
        ast::eq("a", 1).unwrap(),
        ast::group(ast::and([ast::eq("b", 2).unwrap(), ast::raw("x:=1").unwrap()]).unwrap()),
    ])
    .unwrap();
    let mut seen = Vec::new();
    node.visit_fields(&mut |f| seen.push(f.to_string()));
    assert_eq!(seen, ["a", "b"]);
}

#[test]
fn try_map_fields_rewrites_leaves() {
    let node = ast::and([ast::eq("a", 1).unwrap(), ast::in_("b", ["x"]).unwrap()]).unwrap();
    let mapped = node
        .try_map_fields(&mut |f| Ok(f.with_assoc("brand")), &mut |r| ast::raw(r))
        .unwrap();
    let mut seen = Vec::new();
    mapped.visit_fields(&mut |f| seen.push(f.to_string()));
    assert_eq!(seen, ["brand.a", "brand.b"]);
}

#[test]
fn compare_node_exposes_parts() {
    let node = ast::gte("price", 3).unwrap();
    let Node::Compare { op, field, value } = &node else {
        panic!("expected comparison");
    };
    assert_eq!(*op, CompareOp::Gte);
    assert_eq!(field.name(), "price");
    assert_eq!(*value, Value::Int(3));
}
