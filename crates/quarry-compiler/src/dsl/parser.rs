//! Normalizes [`Condition`] input into AST nodes.
//!
//! Field maps consult attribute metadata: nil values become hidden-flag
//! predicates, empty lists become `_empty` flags, and string values on
//! boolean or datetime attributes are coerced. Template clauses go through
//! the same handling, one typed node per `field op ?` comparison.

use quarry_core::ast::{self, Node};
use quarry_core::sanitize::{Bind, coerce_bool, parse_time};
use quarry_core::utils::suggest;
use quarry_core::{Attribute, Error, Field, JoinContext, Result, Value};

use super::{Condition, Operand, template};
use crate::CompileCtx;
use crate::guard::JoinGuard;

/// Parses conditions against one model and the joins applied so far.
pub struct Parser<'a> {
    ctx: CompileCtx<'a>,
    applied: &'a [String],
}

impl<'a> Parser<'a> {
    pub fn new(ctx: CompileCtx<'a>, applied: &'a [String]) -> Self {
        Self { ctx, applied }
    }

    fn guard(&self) -> JoinGuard<'a> {
        JoinGuard::new(self.ctx)
    }

    /// Parse into predicates, one per field map entry.
    ///
    /// With `negated`, each produced node is passed through [`Node::negate`],
    /// so only `Eq` and `In` are inverted.
    pub fn parse(&self, condition: &Condition, negated: bool) -> Result<Vec<Node>> {
        match condition {
            Condition::Fields(pairs) => pairs
                .iter()
                .map(|(key, operand)| self.entry(key, operand, negated))
                .collect::<Result<Vec<_>>>()
                .map(|nodes| nodes.into_iter().flatten().collect()),
            Condition::Template { template: text, binds } => {
                let node = template::parse(self, text, binds)?;
                Ok(vec![invert(node, negated)])
            }
            Condition::Raw(fragment) => Ok(vec![ast::raw(fragment)?]),
            Condition::Nodes(nodes) => nodes
                .iter()
                .map(|node| {
                    self.check_node(node)?;
                    Ok(invert(node.clone(), negated))
                })
                .collect(),
            Condition::Not(inner) => self.parse(inner, !negated),
        }
    }

    fn entry(&self, key: &str, operand: &Operand, negated: bool) -> Result<Vec<Node>> {
        match operand {
            Operand::Nested(pairs) => {
                self.guard().ensure_usable(key, self.applied, JoinContext::Filter)?;
                pairs
                    .iter()
                    .map(|(name, inner)| self.joined_entry(key, name, inner, negated))
                    .collect()
            }
            Operand::Scope(name) => self.join_scope(key, name, negated),
            _ => {
                let field = self.guard().resolve(key, self.applied, JoinContext::Filter)?;
                let attr = self.attribute(&field);
                self.leaf(&field, attr, operand, negated).map(|n| vec![n])
            }
        }
    }

    fn joined_entry(&self, assoc: &str, name: &str, operand: &Operand, negated: bool) -> Result<Node> {
        match operand {
            Operand::Nested(_) => Err(Error::MultiHop {
                path: format!("{assoc}.{name}"),
            }),
            Operand::Scope(_) => Err(Error::UnsupportedInput(format!(
                "scope shorthand must sit directly under an association, not `{assoc}.{name}`"
            ))),
            _ => {
                let field = Field::joined(assoc, name)?;
                self.guard().ensure_known_field(assoc, name)?;
                let attr = self.attribute(&field);
                self.leaf(&field, attr, operand, negated)
            }
        }
    }

    /// Attribute metadata for a base or joined field.
    fn attribute(&self, field: &Field) -> Option<&'a Attribute> {
        match field.assoc() {
            None => self.ctx.model.attribute(field.name()),
            Some(assoc) => self
                .ctx
                .registry
                .join_target(self.ctx.model, assoc)
                .and_then(|target| target.attribute(field.name())),
        }
    }

    fn leaf(
        &self,
        field: &Field,
        attr: Option<&Attribute>,
        operand: &Operand,
        negated: bool,
    ) -> Result<Node> {
        match operand {
            Operand::Value(Value::Null) => nil_predicate(field, attr, negated),
            Operand::Value(value) => {
                let value = coerce(field, attr, value.clone())?;
                Ok(invert(ast::eq(field, value)?, negated))
            }
            Operand::List(values) if values.is_empty() => empty_predicate(field, attr, negated),
            Operand::List(values) => {
                let values = values
                    .iter()
                    .map(|v| coerce(field, attr, v.clone()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(invert(ast::in_(field, values)?, negated))
            }
            Operand::Nested(_) => Err(Error::MultiHop {
                path: field.to_string(),
            }),
            Operand::Scope(_) => Err(Error::UnsupportedInput(format!(
                "scope shorthand on `{field}` requires an association"
            ))),
        }
    }

    /// Pull a named scope from the association's target model and rewrite
    /// its base fields into joined form.
    fn join_scope(&self, assoc: &str, scope: &str, negated: bool) -> Result<Vec<Node>> {
        let config = self
            .guard()
            .ensure_usable(assoc, self.applied, JoinContext::Scope)?;
        let target = self.ctx.registry.join_target(self.ctx.model, assoc);
        let nodes = target.and_then(|t| t.scope(scope)).ok_or_else(|| Error::UnknownScope {
            collection: config.collection.clone(),
            scope: scope.to_owned(),
            suggestions: target
                .map(|t| suggest(scope, t.scope_names()))
                .unwrap_or_default(),
        })?;

        let mut to_joined = |field: &Field| {
            if field.is_joined() {
                return Err(Error::UnsupportedJoinScope {
                    association: assoc.to_owned(),
                    detail: format!("`{field}` is already joined"),
                });
            }
            Ok(field.with_assoc(assoc))
        };
        let mut reject_raw = |fragment: &str| {
            Err(Error::UnsupportedJoinScope {
                association: assoc.to_owned(),
                detail: format!("raw fragment `{fragment}` cannot be rewritten"),
            })
        };
        nodes
            .iter()
            .map(|node| {
                node.try_map_fields(&mut to_joined, &mut reject_raw)
                    .map(|n| invert(n, negated))
            })
            .collect()
    }

    /// One `field op ?` clause as a typed node.
    pub(super) fn comparison(&self, path: &str, keyword: &str, bind: &Bind) -> Result<Node> {
        let field = self.guard().resolve(path, self.applied, JoinContext::Filter)?;
        let attr = self.attribute(&field);
        let keyword = keyword.split_whitespace().collect::<Vec<_>>().join(" ");
        let keyword = keyword.to_ascii_uppercase();

        let node = match (keyword.as_str(), bind) {
            ("=", Bind::One(Value::Null)) => nil_predicate(&field, attr, false)?,
            ("!=", Bind::One(Value::Null)) => nil_predicate(&field, attr, true)?,
            ("=" | "IN", Bind::Many(vs)) if vs.is_empty() => empty_predicate(&field, attr, false)?,
            ("!=" | "NOT IN", Bind::Many(vs)) if vs.is_empty() => {
                empty_predicate(&field, attr, true)?
            }
            ("=", Bind::One(v)) => ast::eq(&field, coerce(&field, attr, v.clone())?)?,
            ("=" | "IN", Bind::Many(vs)) => ast::in_(&field, coerce_all(&field, attr, vs)?)?,
            ("IN", Bind::One(v)) => ast::in_(&field, [coerce(&field, attr, v.clone())?])?,
            ("!=", Bind::One(v)) => ast::not_eq(&field, coerce(&field, attr, v.clone())?)?,
            ("!=" | "NOT IN", Bind::Many(vs)) => {
                ast::not_in(&field, coerce_all(&field, attr, vs)?)?
            }
            ("NOT IN", Bind::One(v)) => ast::not_in(&field, [coerce(&field, attr, v.clone())?])?,
            ("MATCHES", Bind::One(Value::Str(s))) => ast::matches(&field, s)?,
            ("PREFIX", Bind::One(Value::Str(s))) => ast::prefix(&field, s)?,
            ("MATCHES" | "PREFIX", _) => {
                return Err(Error::InvalidValue {
                    field: field.to_string(),
                    detail: format!("{keyword} expects a single string"),
                });
            }
            (op, Bind::One(v)) => {
                let v = coerce(&field, attr, v.clone())?;
                match op {
                    ">" => ast::gt(&field, v)?,
                    ">=" => ast::gte(&field, v)?,
                    "<" => ast::lt(&field, v)?,
                    _ => ast::lte(&field, v)?,
                }
            }
            (_, Bind::Many(_)) => {
                return Err(Error::InvalidValue {
                    field: field.to_string(),
                    detail: format!("`{keyword}` expects a single value, got a list"),
                });
            }
        };
        Ok(node)
    }

    /// Fields inside prebuilt nodes go through the same checks as field map
    /// keys: base fields against the model, joined fields through the guard.
    fn check_node(&self, node: &Node) -> Result<()> {
        let guard = self.guard();
        let mut result = Ok(());
        node.visit_fields(&mut |field| {
            if result.is_err() {
                return;
            }
            result = match field.assoc() {
                Some(assoc) if self.is_hidden_flag(field) => guard
                    .ensure_usable(assoc, self.applied, JoinContext::Filter)
                    .map(drop),
                None if self.is_hidden_flag(field) => Ok(()),
                Some(_) => guard.check_field(field, self.applied, JoinContext::Filter),
                None => guard
                    .resolve(field.name(), self.applied, JoinContext::Filter)
                    .map(drop),
            };
        });
        result
    }

    /// `<attr>_blank` or `<attr>_empty` on an attribute declaring the
    /// matching capability.
    fn is_hidden_flag(&self, field: &Field) -> bool {
        let model = match field.assoc() {
            None => Some(self.ctx.model),
            Some(assoc) => self
                .ctx
                .registry
                .join_target(self.ctx.model, assoc)
                .map(|m| &**m),
        };
        let Some(model) = model else {
            return false;
        };
        let name = field.name();
        let blank = name
            .strip_suffix("_blank")
            .and_then(|a| model.attribute(a))
            .is_some_and(Attribute::optional);
        let empty = name
            .strip_suffix("_empty")
            .and_then(|a| model.attribute(a))
            .is_some_and(Attribute::empty_filtering);
        blank || empty
    }
}

fn invert(node: Node, negated: bool) -> Node {
    if negated { node.negate() } else { node }
}

fn flag(field: &Field, name: String) -> Result<Field> {
    match field.assoc() {
        Some(assoc) => Field::joined(assoc, name),
        None => Field::base(name),
    }
}

/// `field: nil` as `_blank`/`_empty` flags, or `field:=null` when the
/// attribute declares neither capability.
fn nil_predicate(field: &Field, attr: Option<&Attribute>, negated: bool) -> Result<Node> {
    let literal = !negated;
    let mut flags = Vec::new();
    if let Some(attr) = attr {
        if attr.optional() {
            flags.push(ast::eq(flag(field, attr.blank_flag())?, literal)?);
        }
        if attr.empty_filtering() {
            flags.push(ast::eq(flag(field, attr.empty_flag())?, literal)?);
        }
    }
    match flags.len() {
        0 => Ok(invert(ast::eq(field, Value::Null)?, negated)),
        1 => Ok(flags.remove(0)),
        _ if negated => ast::and(flags),
        _ => ast::or(flags),
    }
}

fn empty_predicate(field: &Field, attr: Option<&Attribute>, negated: bool) -> Result<Node> {
    match attr.filter(|a| a.empty_filtering()) {
        Some(attr) => ast::eq(flag(field, attr.empty_flag())?, !negated),
        None => Err(Error::EmptyPredicate {
            field: field.to_string(),
        }),
    }
}

fn coerce(field: &Field, attr: Option<&Attribute>, value: Value) -> Result<Value> {
    let Some(attr) = attr else {
        return Ok(value);
    };
    match value {
        Value::Str(s) if attr.ty.is_bool() => {
            coerce_bool(&s)
                .map(Value::Bool)
                .ok_or_else(|| Error::InvalidValue {
                    field: field.to_string(),
                    detail: format!("`{s}` is not a boolean"),
                })
        }
        Value::Str(s) if attr.ty.is_time() => {
            parse_time(&s)
                .map(Value::Time)
                .ok_or_else(|| Error::InvalidValue {
                    field: field.to_string(),
                    detail: format!("`{s}` is not an ISO-8601 timestamp"),
                })
        }
        other => Ok(other),
    }
}

fn coerce_all(field: &Field, attr: Option<&Attribute>, values: &[Value]) -> Result<Vec<Value>> {
    values
        .iter()
        .map(|v| coerce(field, attr, v.clone()))
        .collect()
}
