//! Predicate expression tree.
//!
//! Nodes are immutable once built: children live behind `Arc<[Node]>` and
//! nothing hands out mutable access. Two nodes are equal iff kind, field and
//! value (or children) are equal, and equal nodes hash identically.
//!
//! Construct nodes through the builder functions ([`eq`], [`in_`], [`and`], ...);
//! they validate their input and fail fast with [`Error::InvalidArgument`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

/// A field reference, optionally scoped to a joined association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
    assoc: Option<String>,
    name: String,
}

impl Field {
    /// A field on the queried collection.
    pub fn base(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_argument("field name must not be blank"));
        }
        Ok(Self { assoc: None, name })
    }

    /// A field on the collection behind `assoc`.
    pub fn joined(assoc: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let assoc = assoc.into();
        if assoc.trim().is_empty() {
            return Err(Error::invalid_argument("association name must not be blank"));
        }
        let mut field = Self::base(name)?;
        field.assoc = Some(assoc);
        Ok(field)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assoc(&self) -> Option<&str> {
        self.assoc.as_deref()
    }

    pub fn is_joined(&self) -> bool {
        self.assoc.is_some()
    }

    /// Same field name, scoped to `assoc`.
    pub fn with_assoc(&self, assoc: &str) -> Self {
        Self {
            assoc: Some(assoc.to_owned()),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.assoc {
            Some(assoc) => write!(f, "{assoc}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Anything that names a field. `&str`/`String` produce base fields.
pub trait IntoField {
    fn into_field(self) -> Result<Field>;
}

impl IntoField for Field {
    fn into_field(self) -> Result<Field> {
        Ok(self)
    }
}

impl IntoField for &Field {
    fn into_field(self) -> Result<Field> {
        Ok(self.clone())
    }
}

impl IntoField for &str {
    fn into_field(self) -> Result<Field> {
        Field::base(self)
    }
}

impl IntoField for String {
    fn into_field(self) -> Result<Field> {
        Field::base(self)
    }
}

impl IntoField for &String {
    fn into_field(self) -> Result<Field> {
        Field::base(self.as_str())
    }
}

/// Comparison operator of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Backend operator text, placed between field and value.
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => ":=",
            CompareOp::NotEq => ":!=",
            CompareOp::Gt => ":>",
            CompareOp::Gte => ":>=",
            CompareOp::Lt => ":<",
            CompareOp::Lte => ":<=",
        }
    }
}

/// Kind of a boolean node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "&&",
            BoolOp::Or => "||",
        }
    }
}

/// Predicate expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Compare {
        op: CompareOp,
        field: Field,
        value: Value,
    },
    /// `In` when `negated` is false, `NotIn` otherwise.
    Membership {
        negated: bool,
        field: Field,
        values: Arc<[Value]>,
    },
    Matches {
        field: Field,
        text: String,
    },
    Prefix {
        field: Field,
        text: String,
    },
    /// Opaque fragment passed through verbatim.
    Raw(String),
    Bool {
        op: BoolOp,
        children: Arc<[Node]>,
    },
    /// Always parenthesized on compile.
    Group(Arc<Node>),
}

impl Node {
    /// Invert `Eq`/`In` into `NotEq`/`NotIn`.
    ///
    /// Every other kind is returned unchanged, including `NotEq`/`NotIn`
    /// and comparisons such as `Gt` or `Matches`.
    pub fn negate(&self) -> Node {
        match self {
            Node::Compare {
                op: CompareOp::Eq,
                field,
                value,
            } => Node::Compare {
                op: CompareOp::NotEq,
                field: field.clone(),
                value: value.clone(),
            },
            Node::Membership {
                negated: false,
                field,
                values,
            } => Node::Membership {
                negated: true,
                field: field.clone(),
                values: values.clone(),
            },
            other => other.clone(),
        }
    }

    /// The referenced field, for leaf nodes.
    pub fn field(&self) -> Option<&Field> {
        match self {
            Node::Compare { field, .. }
            | Node::Membership { field, .. }
            | Node::Matches { field, .. }
            | Node::Prefix { field, .. } => Some(field),
            Node::Raw(_) | Node::Bool { .. } | Node::Group(_) => None,
        }
    }

    /// Visit every field referenced anywhere in the tree, in order.
    pub fn visit_fields<'a>(&'a self, f: &mut impl FnMut(&'a Field)) {
        match self {
            Node::Bool { children, .. } => children.iter().for_each(|c| c.visit_fields(f)),
            Node::Group(inner) => inner.visit_fields(f),
            leaf => {
                if let Some(field) = leaf.field() {
                    f(field);
                }
            }
        }
    }

    /// Rebuild the tree with every leaf field passed through `map`.
    ///
    /// `Raw` leaves are handed to `on_raw`, which may reject them.
    pub fn try_map_fields<M, R>(&self, map: &mut M, on_raw: &mut R) -> Result<Node>
    where
        M: FnMut(&Field) -> Result<Field>,
        R: FnMut(&str) -> Result<Node>,
    {
        Ok(match self {
            Node::Compare { op, field, value } => Node::Compare {
                op: *op,
                field: map(field)?,
                value: value.clone(),
            },
            Node::Membership {
                negated,
                field,
                values,
            } => Node::Membership {
                negated: *negated,
                field: map(field)?,
                values: values.clone(),
            },
            Node::Matches { field, text } => Node::Matches {
                field: map(field)?,
                text: text.clone(),
            },
            Node::Prefix { field, text } => Node::Prefix {
                field: map(field)?,
                text: text.clone(),
            },
            Node::Raw(fragment) => on_raw(fragment)?,
            Node::Bool { op, children } => Node::Bool {
                op: *op,
                children: children
                    .iter()
                    .map(|c| c.try_map_fields(map, on_raw))
                    .collect::<Result<Vec<_>>>()?
                    .into(),
            },
            Node::Group(inner) => Node::Group(Arc::new(inner.try_map_fields(map, on_raw)?)),
        })
    }
}

fn checked_value(field: &Field, value: Value) -> Result<Value> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(Error::InvalidValue {
            field: field.to_string(),
            detail: format!("{f} is not a finite number"),
        }),
        v => Ok(v),
    }
}

fn compare(op: CompareOp, field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    let field = field.into_field()?;
    let value = checked_value(&field, value.into())?;
    Ok(Node::Compare { op, field, value })
}

pub fn eq(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::Eq, field, value)
}

pub fn not_eq(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::NotEq, field, value)
}

pub fn gt(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::Gt, field, value)
}

pub fn gte(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::Gte, field, value)
}

pub fn lt(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::Lt, field, value)
}

pub fn lte(field: impl IntoField, value: impl Into<Value>) -> Result<Node> {
    compare(CompareOp::Lte, field, value)
}

fn membership<I, V>(negated: bool, field: impl IntoField, values: I) -> Result<Node>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let field = field.into_field()?;
    let values = values
        .into_iter()
        .map(|v| checked_value(&field, v.into()))
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(Error::invalid_argument(format!(
            "membership list for `{field}` must not be empty"
        )));
    }
    Ok(Node::Membership {
        negated,
        field,
        values: values.into(),
    })
}

pub fn in_<I, V>(field: impl IntoField, values: I) -> Result<Node>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    membership(false, field, values)
}

pub fn not_in<I, V>(field: impl IntoField, values: I) -> Result<Node>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    membership(true, field, values)
}

fn non_blank(what: &str, field: &Field, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::invalid_argument(format!(
            "{what} text for `{field}` must not be blank"
        )));
    }
    Ok(text.to_owned())
}

pub fn matches(field: impl IntoField, text: &str) -> Result<Node> {
    let field = field.into_field()?;
    let text = non_blank("matches", &field, text)?;
    Ok(Node::Matches { field, text })
}

pub fn prefix(field: impl IntoField, text: &str) -> Result<Node> {
    let field = field.into_field()?;
    let text = non_blank("prefix", &field, text)?;
    Ok(Node::Prefix { field, text })
}

pub fn raw(fragment: &str) -> Result<Node> {
    if fragment.trim().is_empty() {
        return Err(Error::invalid_argument("raw fragment must not be blank"));
    }
    Ok(Node::Raw(fragment.to_owned()))
}

fn boolean(op: BoolOp, children: impl IntoIterator<Item = Node>) -> Result<Node> {
    let mut flat = Vec::new();
    for child in children {
        match child {
            Node::Bool {
                op: child_op,
                children: grandchildren,
            } if child_op == op => flat.extend(grandchildren.iter().cloned()),
            other => flat.push(other),
        }
    }
    if flat.is_empty() {
        return Err(Error::invalid_argument(format!(
            "{} requires at least one child",
            op.as_str()
        )));
    }
    Ok(Node::Bool {
        op,
        children: flat.into(),
    })
}

/// Conjunction. Directly nested `And` children are flattened.
pub fn and(children: impl IntoIterator<Item = Node>) -> Result<Node> {
    boolean(BoolOp::And, children)
}

/// Disjunction. Directly nested `Or` children are flattened.
pub fn or(children: impl IntoIterator<Item = Node>) -> Result<Node> {
    boolean(BoolOp::Or, children)
}

/// Wrap a node so it is always parenthesized.
pub fn group(child: Node) -> Node {
    Node::Group(Arc::new(child))
}
