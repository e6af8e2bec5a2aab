//! Caller input accepted by `where`-style chainers.

use quarry_core::sanitize::Bind;
use quarry_core::{Error, Node, Result, Value};

/// Right-hand side of a field map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A scalar. `Value::Null` asks for hidden-flag handling.
    Value(Value),
    /// Membership. An empty list asks for the `_empty` flag.
    List(Vec<Value>),
    /// Field map scoped to an association.
    Nested(Vec<(String, Operand)>),
    /// Named scope on the association's target model.
    Scope(String),
}

impl Operand {
    pub fn scope(name: impl Into<String>) -> Self {
        Operand::Scope(name.into())
    }

    pub fn nested<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Operand::Nested(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Array(items) => items
                .iter()
                .map(scalar_from_json)
                .collect::<Result<Vec<_>>>()
                .map(Operand::List),
            serde_json::Value::Object(map) => {
                if let Some(name) = map.get("$scope") {
                    let name = name.as_str().ok_or_else(|| {
                        Error::UnsupportedInput("`$scope` expects a scope name".into())
                    })?;
                    return Ok(Operand::scope(name));
                }
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Operand::from_json(v)?)))
                    .collect::<Result<Vec<_>>>()
                    .map(Operand::Nested)
            }
            scalar => scalar_from_json(scalar).map(Operand::Value),
        }
    }
}

fn scalar_from_json(json: &serde_json::Value) -> Result<Value> {
    Value::from_json(json)
        .ok_or_else(|| Error::UnsupportedInput(format!("expected a scalar, got `{json}`")))
}

macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(v.into())
                }
            }
        )*
    };
}

operand_from_scalar!(Value, bool, i32, i64, u32, f64, &str, String, &String);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(v.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(vs: Vec<T>) -> Self {
        Operand::List(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(vs: [T; N]) -> Self {
        Operand::List(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Operand {
    fn from(vs: &[T]) -> Self {
        Operand::List(vs.iter().cloned().map(Into::into).collect())
    }
}

/// One `where` argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field => operand` pairs, one predicate per pair.
    Fields(Vec<(String, Operand)>),
    /// `?` template with positional binds.
    Template { template: String, binds: Vec<Bind> },
    /// Opaque fragment.
    Raw(String),
    /// Prebuilt AST nodes.
    Nodes(Vec<Node>),
    /// Inverted condition.
    Not(Box<Condition>),
}

impl Condition {
    pub fn fields<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Condition::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn template<I, B>(template: impl Into<String>, binds: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bind>,
    {
        Condition::Template {
            template: template.into(),
            binds: binds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(fragment: impl Into<String>) -> Self {
        Condition::Raw(fragment.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: impl Into<Condition>) -> Self {
        Condition::Not(Box::new(inner.into()))
    }

    /// No predicate would be produced.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Fields(pairs) => pairs.is_empty(),
            Condition::Nodes(nodes) => nodes.is_empty(),
            Condition::Not(inner) => inner.is_empty(),
            Condition::Template { .. } | Condition::Raw(_) => false,
        }
    }

    /// Read a condition from its JSON form.
    ///
    /// - object: field map; `{"$not": ...}` inverts its payload
    /// - array: `[template, bind...]`; a nested array binds a list
    /// - string: raw fragment
    ///
    /// Inside a field map, `{"$scope": name}` selects a named scope on the
    /// association and any other object is a nested field map.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(s) => Ok(Condition::Raw(s.clone())),
            serde_json::Value::Array(items) => {
                let Some((head, args)) = items.split_first() else {
                    return Err(Error::UnsupportedInput("empty template array".into()));
                };
                let template = head.as_str().ok_or_else(|| {
                    Error::UnsupportedInput("template array must start with a string".into())
                })?;
                let binds = args
                    .iter()
                    .map(|arg| match arg {
                        serde_json::Value::Array(vs) => vs
                            .iter()
                            .map(scalar_from_json)
                            .collect::<Result<Vec<_>>>()
                            .map(Bind::Many),
                        other => scalar_from_json(other).map(Bind::One),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Condition::Template {
                    template: template.to_owned(),
                    binds,
                })
            }
            serde_json::Value::Object(map) => {
                if let (1, Some(inner)) = (map.len(), map.get("$not")) {
                    return Ok(Condition::not(Condition::from_json(inner)?));
                }
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Operand::from_json(v)?)))
                    .collect::<Result<Vec<_>>>()
                    .map(Condition::Fields)
            }
            other => Err(Error::UnsupportedInput(format!(
                "expected an object, array or string condition, got `{other}`"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Operand>> From<(K, V)> for Condition {
    fn from((k, v): (K, V)) -> Self {
        Condition::Fields(vec![(k.into(), v.into())])
    }
}

impl<K: Into<String>, V: Into<Operand>> From<Vec<(K, V)>> for Condition {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Condition::fields(pairs)
    }
}

impl<K: Into<String>, V: Into<Operand>, const N: usize> From<[(K, V); N]> for Condition {
    fn from(pairs: [(K, V); N]) -> Self {
        Condition::fields(pairs)
    }
}

impl From<&str> for Condition {
    fn from(fragment: &str) -> Self {
        Condition::Raw(fragment.to_owned())
    }
}

impl From<String> for Condition {
    fn from(fragment: String) -> Self {
        Condition::Raw(fragment)
    }
}

impl From<Node> for Condition {
    fn from(node: Node) -> Self {
        Condition::Nodes(vec![node])
    }
}

impl From<Vec<Node>> for Condition {
    fn from(nodes: Vec<Node>) -> Self {
        Condition::Nodes(nodes)
    }
}
