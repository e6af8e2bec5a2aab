//! Process-wide defaults consulted by the compiler and the runtime.
//!
//! # Environment Variable Overrides
//!
//! | Variable                     | Field                      | Default |
//! |------------------------------|----------------------------|---------|
//! | `QUARRY_QUERY_BY`            | `default_query_by`         | unset   |
//! | `QUARRY_INFIX`               | `default_infix`            | unset   |
//! | `QUARRY_PRESETS_ENABLED`     | `presets.enabled`          | `true`  |
//! | `QUARRY_PRESET_NAMESPACE`    | `presets.namespace`        | unset   |
//! | `QUARRY_STRICT_MISSING`      | `selection.strict_missing` | `false` |
//! | `QUARRY_MULTI_SEARCH_LIMIT`  | `multi_search_limit`       | `50`    |

use indexmap::IndexSet;
use serde::Deserialize;

/// Infix search mode for the query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfixMode {
    Off,
    Always,
    Fallback,
}

impl InfixMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InfixMode::Off => "off",
            InfixMode::Always => "always",
            InfixMode::Fallback => "fallback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Some(InfixMode::Off),
            "always" => Some(InfixMode::Always),
            "fallback" => Some(InfixMode::Fallback),
            _ => None,
        }
    }
}

/// Server-side preset handling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// When false, `preset(...)` is recorded but never compiled.
    pub enabled: bool,
    /// Prefix joined to preset names with `_`.
    pub namespace: Option<String>,
    /// Keys dropped from the compiled map in `lock` mode.
    pub locked_keys: IndexSet<String>,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: None,
            locked_keys: ["filter_by", "sort_by", "include_fields", "exclude_fields"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PresetConfig {
    /// Full preset name sent on the wire.
    pub fn qualify(&self, name: &str) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}_{name}"),
            _ => name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Fail hydration when an included field is absent from a returned document.
    pub strict_missing: bool,
}

/// Query defaults.
///
/// All fields have defaults; override selectively via setters, a JSON
/// document, or environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `query_by` used when a query names none.
    pub default_query_by: Option<String>,
    pub default_infix: Option<InfixMode>,
    pub presets: PresetConfig,
    pub selection: SelectionConfig,
    /// Maximum sub-searches per multi-search round trip.
    pub multi_search_limit: usize,
    /// `per_page` used by the batched multi-page fetch.
    pub batch_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_query_by: None,
            default_infix: None,
            presets: PresetConfig::default(),
            selection: SelectionConfig::default(),
            multi_search_limit: 50,
            batch_per_page: 250,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_query_by(mut self, fields: impl Into<String>) -> Self {
        self.default_query_by = Some(fields.into());
        self
    }

    pub fn default_infix(mut self, mode: InfixMode) -> Self {
        self.default_infix = Some(mode);
        self
    }

    pub fn presets_enabled(mut self, enabled: bool) -> Self {
        self.presets.enabled = enabled;
        self
    }

    pub fn preset_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.presets.namespace = Some(namespace.into());
        self
    }

    pub fn locked_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.presets.locked_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn strict_missing(mut self, strict: bool) -> Self {
        self.selection.strict_missing = strict;
        self
    }

    pub fn multi_search_limit(mut self, limit: usize) -> Self {
        self.multi_search_limit = limit.max(1);
        self
    }

    pub fn batch_per_page(mut self, per_page: u32) -> Self {
        self.batch_per_page = per_page.max(1);
        self
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply environment overrides on top of `self`.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment in production).
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("QUARRY_QUERY_BY") {
            self.default_query_by = Some(v);
        }
        if let Some(v) = lookup("QUARRY_INFIX") {
            match InfixMode::parse(&v) {
                Some(mode) => self.default_infix = Some(mode),
                None => warn_ignored("QUARRY_INFIX", &v),
            }
        }
        if let Some(v) = lookup("QUARRY_PRESETS_ENABLED") {
            match crate::sanitize::coerce_bool(&v) {
                Some(b) => self.presets.enabled = b,
                None => warn_ignored("QUARRY_PRESETS_ENABLED", &v),
            }
        }
        if let Some(v) = lookup("QUARRY_PRESET_NAMESPACE") {
            self.presets.namespace = Some(v);
        }
        if let Some(v) = lookup("QUARRY_STRICT_MISSING") {
            match crate::sanitize::coerce_bool(&v) {
                Some(b) => self.selection.strict_missing = b,
                None => warn_ignored("QUARRY_STRICT_MISSING", &v),
            }
        }
        if let Some(v) = lookup("QUARRY_MULTI_SEARCH_LIMIT") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.multi_search_limit = n,
                _ => warn_ignored("QUARRY_MULTI_SEARCH_LIMIT", &v),
            }
        }
        self
    }
}

fn warn_ignored(var: &str, value: &str) {
    tracing::warn!(
        target: "quarry::config",
        var,
        value,
        "ignoring unparseable environment override"
    );
}
