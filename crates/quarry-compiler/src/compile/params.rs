//! The compiled parameter map.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as Json;

/// Keys starting with this prefix are diagnostics and never reach the wire.
pub const DIAGNOSTIC_PREFIX: char = '_';

/// Ordered wire parameters plus diagnostic keys, in compile-stage order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompiledParams(IndexMap<String, Json>);

pub fn is_diagnostic(key: &str) -> bool {
    key.starts_with(DIAGNOSTIC_PREFIX)
}

impl CompiledParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Json::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set a key, keeping its position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Json>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Json> {
        self.0.shift_remove(key)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|k, _| keep(k));
    }

    pub fn as_map(&self) -> &IndexMap<String, Json> {
        &self.0
    }

    /// Wire parameters with every diagnostic key stripped.
    pub fn to_wire(&self) -> IndexMap<String, Json> {
        self.0
            .iter()
            .filter(|(k, _)| !is_diagnostic(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Only the diagnostic keys.
    pub fn diagnostics(&self) -> IndexMap<&str, &Json> {
        self.0
            .iter()
            .filter(|(k, _)| is_diagnostic(k))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// One `key=value` line per entry. Strings print bare, everything else
    /// as compact JSON.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(key);
            out.push('=');
            match value {
                Json::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out
    }
}

impl IntoIterator for CompiledParams {
    type Item = (String, Json);
    type IntoIter = indexmap::map::IntoIter<String, Json>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
