//! `filter_by` rendering.
//!
//! A boolean child is parenthesized only when its operator differs from its
//! parent's; `Group` always parenthesizes. Joined leaves render in the
//! backend's `$assoc(...)` form.

use quarry_core::ast::{BoolOp, Field, Node};
use quarry_core::sanitize::{list_literal, literal, quote};

/// Render one node.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, None, &mut out);
    out
}

/// Render a predicate list as an implicit conjunction.
pub fn render_all(predicates: &[Node]) -> Option<String> {
    match predicates {
        [] => None,
        [single] => Some(render(single)),
        many => {
            let mut out = String::new();
            render_children(BoolOp::And, many, &mut out);
            Some(out)
        }
    }
}

fn render_into(node: &Node, parent: Option<BoolOp>, out: &mut String) {
    match node {
        Node::Compare { op, field, value } => {
            leaf(field, &format!("{}{}", op.as_str(), literal(value)), out);
        }
        Node::Membership {
            negated,
            field,
            values,
        } => {
            let op = if *negated { ":!=" } else { ":=" };
            leaf(field, &format!("{op}{}", list_literal(values)), out);
        }
        Node::Matches { field, text } => leaf(field, &format!(":{}", quote(text)), out),
        Node::Prefix { field, text } => {
            let token = if is_simple_token(text) {
                text.clone()
            } else {
                quote(text)
            };
            leaf(field, &format!(":{token}*"), out);
        }
        Node::Raw(fragment) => out.push_str(fragment),
        Node::Bool { op, children } => {
            let wrap = parent.is_some_and(|p| p != *op);
            if wrap {
                out.push('(');
            }
            render_children(*op, children, out);
            if wrap {
                out.push(')');
            }
        }
        Node::Group(inner) => {
            out.push('(');
            render_into(inner, None, out);
            out.push(')');
        }
    }
}

fn render_children(op: BoolOp, children: &[Node], out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
        }
        render_into(child, Some(op), out);
    }
}

fn leaf(field: &Field, rest: &str, out: &mut String) {
    match field.assoc() {
        Some(assoc) => {
            out.push('$');
            out.push_str(assoc);
            out.push('(');
            out.push_str(field.name());
            out.push_str(rest);
            out.push(')');
        }
        None => {
            out.push_str(field.name());
            out.push_str(rest);
        }
    }
}

fn is_simple_token(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
}
