//! Literal rendering for filter fragments.
//!
//! Everything here is independent of the AST: it turns scalars, lists and
//! `?` templates into text that is safe to splice into a `filter_by` string.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{Error, Result};
use crate::value::Value;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bind {
    One(Value),
    Many(Vec<Value>),
}

macro_rules! bind_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Bind {
                fn from(v: $ty) -> Self {
                    Bind::One(v.into())
                }
            }
        )*
    };
}

bind_from_scalar!(Value, bool, i32, i64, u32, f64, &str, String);

impl Bind {
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Bind::Many(values.into_iter().map(Into::into).collect())
    }

    /// Render as a filter literal.
    pub fn render(&self) -> String {
        match self {
            Bind::One(v) => literal(v),
            Bind::Many(vs) => list_literal(vs),
        }
    }
}

/// Double-quote a string, escaping backslashes and embedded quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// UTC ISO-8601 with a trailing `Z`.
pub fn iso8601(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render a single scalar.
///
/// Strings and timestamps are quoted; booleans, numbers and null are bare.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => quote(s),
        Value::Time(t) => quote(&iso8601(t)),
    }
}

/// Render a list as `[v1, v2]`.
pub fn list_literal(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(literal).collect();
    format!("[{}]", items.join(", "))
}

/// Count `?` placeholders outside quoted regions.
pub fn count_placeholders(template: &str) -> usize {
    placeholder_offsets(template).len()
}

fn placeholder_offsets(template: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in template.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '`') => quote = Some(c),
            (None, '?') => offsets.push(i),
            (None, _) => {}
        }
    }
    offsets
}

/// Substitute each `?` with the rendered literal of the matching bind.
pub fn fill_placeholders(template: &str, binds: &[Bind]) -> Result<String> {
    let offsets = placeholder_offsets(template);
    if offsets.len() != binds.len() {
        return Err(Error::PlaceholderMismatch {
            template: template.to_owned(),
            expected: binds.len(),
            found: offsets.len(),
        });
    }

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (offset, bind) in offsets.iter().zip(binds) {
        out.push_str(&template[last..*offset]);
        out.push_str(&bind.render());
        last = offset + 1;
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Canonical truthy/falsy string forms for boolean attributes.
pub fn coerce_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date into UTC.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        })
}
