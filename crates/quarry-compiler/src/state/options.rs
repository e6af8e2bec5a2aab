//! Option records for the non-filter query dimensions.

use indexmap::{IndexMap, IndexSet};

use quarry_core::{Error, Result};

/// Sort direction of an order entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(Error::invalid_option(
                "order",
                format!("unknown direction `{other}` (expected asc or desc)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub field: String,
    pub limit: Option<u32>,
    pub missing_values: Option<bool>,
}

impl Grouping {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            limit: None,
            missing_values: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn missing_values(mut self, keep: bool) -> Self {
        self.missing_values = Some(keep);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub fields: IndexSet<String>,
    /// Per-field `max_values`; the compiled cap is the maximum of these.
    pub caps: IndexMap<String, u32>,
    /// `(field, expression)` pairs in call order.
    pub queries: Vec<(String, String)>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.queries.is_empty()
    }
}

/// Curation request. `pin`/`hide` keep call order and drop duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curation {
    pub pinned: IndexSet<String>,
    pub hidden: IndexSet<String>,
    pub override_tags: IndexSet<String>,
    pub filter_curated_hits: Option<bool>,
}

impl Curation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn hide<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn override_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.override_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn filter_curated_hits(mut self, on: bool) -> Self {
        self.filter_curated_hits = Some(on);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
            && self.hidden.is_empty()
            && self.override_tags.is_empty()
            && self.filter_curated_hits.is_none()
    }

    /// Later values win for the flag; id and tag lists accumulate.
    pub(crate) fn merge(&self, other: &Curation) -> Curation {
        let mut merged = self.clone();
        merged.pinned.extend(other.pinned.iter().cloned());
        merged.hidden.extend(other.hidden.iter().cloned());
        merged
            .override_tags
            .extend(other.override_tags.iter().cloned());
        if other.filter_curated_hits.is_some() {
            merged.filter_curated_hits = other.filter_curated_hits;
        }
        merged
    }

    pub fn filters_curated_hits(&self) -> bool {
        self.filter_curated_hits == Some(true)
    }
}

/// How a server-side preset combines with the compiled parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresetMode {
    /// Add the preset, keep every compiled key.
    #[default]
    Merge,
    /// Keep only the essential keys plus the preset.
    Only,
    /// Drop compiled keys the preset owns (the configured locked set).
    Lock,
}

impl PresetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetMode::Merge => "merge",
            PresetMode::Only => "only",
            PresetMode::Lock => "lock",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(PresetMode::Merge),
            "only" => Ok(PresetMode::Only),
            "lock" => Ok(PresetMode::Lock),
            other => Err(Error::invalid_option(
                "preset",
                format!("unknown mode `{other}` (expected merge, only or lock)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub mode: PresetMode,
}

/// Typo tolerance and relevance knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    pub num_typos: Option<u8>,
    pub drop_tokens_threshold: Option<u32>,
    pub prioritize_exact_match: Option<bool>,
    /// Per-field weights, applied in `query_by` order.
    pub weights: IndexMap<String, u32>,
}

/// Upper bound of a single `query_by` weight.
pub const MAX_FIELD_WEIGHT: u32 = 127;

impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_typos(mut self, n: u8) -> Self {
        self.num_typos = Some(n);
        self
    }

    pub fn drop_tokens_threshold(mut self, n: u32) -> Self {
        self.drop_tokens_threshold = Some(n);
        self
    }

    pub fn prioritize_exact_match(mut self, on: bool) -> Self {
        self.prioritize_exact_match = Some(on);
        self
    }

    pub fn weight(mut self, field: impl Into<String>, weight: u32) -> Self {
        self.weights.insert(field.into(), weight);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_typos.filter(|n| *n > 2) {
            return Err(Error::invalid_option(
                "ranking",
                format!("num_typos must be 0, 1 or 2 (got {n})"),
            ));
        }
        if let Some((field, w)) = self.weights.iter().find(|(_, w)| **w > MAX_FIELD_WEIGHT) {
            return Err(Error::invalid_option(
                "ranking",
                format!("weight for `{field}` must be at most {MAX_FIELD_WEIGHT} (got {w})"),
            ));
        }
        Ok(())
    }

    /// Later settings override earlier ones field by field.
    pub(crate) fn merge(&self, other: &Ranking) -> Ranking {
        let mut merged = self.clone();
        merged.num_typos = other.num_typos.or(self.num_typos);
        merged.drop_tokens_threshold = other.drop_tokens_threshold.or(self.drop_tokens_threshold);
        merged.prioritize_exact_match = other
            .prioritize_exact_match
            .or(self.prioritize_exact_match);
        for (field, w) in &other.weights {
            merged.weights.insert(field.clone(), *w);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        *self == Ranking::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    pub fields: Vec<String>,
    pub full_fields: Vec<String>,
    pub start_tag: Option<String>,
    pub end_tag: Option<String>,
    pub affix_num_tokens: Option<u32>,
    pub snippet_threshold: Option<u32>,
}

impl Highlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn full_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.full_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_tag = Some(start.into());
        self.end_tag = Some(end.into());
        self
    }

    pub fn affix_num_tokens(mut self, n: u32) -> Self {
        self.affix_num_tokens = Some(n);
        self
    }

    pub fn snippet_threshold(mut self, n: u32) -> Self {
        self.snippet_threshold = Some(n);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let blank = |t: &Option<String>| t.as_deref().is_some_and(|s| s.is_empty());
        if blank(&self.start_tag) || blank(&self.end_tag) {
            return Err(Error::invalid_option("highlight", "tags must not be empty"));
        }
        if self.start_tag.is_some() != self.end_tag.is_some() {
            return Err(Error::invalid_option(
                "highlight",
                "start and end tags must be given together",
            ));
        }
        Ok(())
    }
}

/// Hit-count hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitLimits {
    /// Caps `per_page` downward at compile time.
    pub early_limit: Option<u32>,
    /// Hydration fails when the backend reports more hits than this.
    pub validate_max: Option<u64>,
}

impl HitLimits {
    pub fn is_empty(&self) -> bool {
        self.early_limit.is_none() && self.validate_max.is_none()
    }
}
