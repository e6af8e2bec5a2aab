//! Query plans: a JSON list of chainer steps replayed onto an empty state.
//!
//! ```json
//! { "collection": "products",
//!   "steps": [{ "where": { "brand_id": [1, 2] } }, { "order": "price:desc" }, { "limit": 10 }] }
//! ```
//!
//! A bare array of steps is accepted too.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;

use quarry_compiler::{
    CompileCtx, Condition, Curation, Grouping, Highlight, Part, PresetMode, Ranking, State,
};
use quarry_core::{Error, InfixMode, Result};

use super::loader::LoadError;

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawPlan")]
pub struct Plan {
    pub collection: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlan {
    Steps(Vec<Step>),
    Full {
        collection: Option<String>,
        #[serde(default)]
        steps: Vec<Step>,
    },
}

impl From<RawPlan> for Plan {
    fn from(raw: RawPlan) -> Self {
        match raw {
            RawPlan::Steps(steps) => Plan {
                collection: None,
                steps,
            },
            RawPlan::Full { collection, steps } => Plan { collection, steps },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Where(Json),
    Not(Json),
    Rewhere(Json),
    FilterRaw(String),
    Scope(String),
    Order(String),
    Select(Vec<String>),
    Exclude(Vec<String>),
    Reselect(Vec<String>),
    Joins(Vec<String>),
    Limit(u32),
    Offset(u32),
    Page(u32),
    Per(u32),
    GroupBy(GroupSpec),
    FacetBy(FacetSpec),
    FacetQuery { field: String, expr: String },
    Pin(Vec<String>),
    Hide(Vec<String>),
    Curate(CurateSpec),
    Preset(PresetSpec),
    Ranking(RankingSpec),
    Highlight(HighlightSpec),
    Search(String),
    QueryBy(Vec<String>),
    Infix(InfixMode),
    UseSynonyms(bool),
    UseStopwords(bool),
    LimitHits(u32),
    ValidateHits(u64),
    Unscope(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSpec {
    pub field: String,
    pub limit: Option<u32>,
    pub missing_values: Option<bool>,
}

/// `"tags"` or `{ "field": "tags", "max_values": 10 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FacetSpec {
    Field(String),
    Capped {
        field: String,
        max_values: Option<u32>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurateSpec {
    pub pin: Vec<String>,
    pub hide: Vec<String>,
    pub override_tags: Vec<String>,
    pub filter_curated_hits: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresetSpec {
    pub name: String,
    #[serde(default = "default_preset_mode")]
    pub mode: String,
}

fn default_preset_mode() -> String {
    PresetMode::Merge.as_str().to_owned()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RankingSpec {
    pub num_typos: Option<u8>,
    pub drop_tokens_threshold: Option<u32>,
    pub prioritize_exact_match: Option<bool>,
    pub weights: IndexMap<String, u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HighlightSpec {
    pub fields: Vec<String>,
    pub full_fields: Vec<String>,
    pub start_tag: Option<String>,
    pub end_tag: Option<String>,
    pub affix_num_tokens: Option<u32>,
    pub snippet_threshold: Option<u32>,
}

impl From<&CurateSpec> for Curation {
    fn from(spec: &CurateSpec) -> Self {
        let curation = Curation::new()
            .pin(spec.pin.iter().cloned())
            .hide(spec.hide.iter().cloned())
            .override_tags(spec.override_tags.iter().cloned());
        match spec.filter_curated_hits {
            Some(on) => curation.filter_curated_hits(on),
            None => curation,
        }
    }
}

impl From<&RankingSpec> for Ranking {
    fn from(spec: &RankingSpec) -> Self {
        Ranking {
            num_typos: spec.num_typos,
            drop_tokens_threshold: spec.drop_tokens_threshold,
            prioritize_exact_match: spec.prioritize_exact_match,
            weights: spec.weights.clone(),
        }
    }
}

impl From<&HighlightSpec> for Highlight {
    fn from(spec: &HighlightSpec) -> Self {
        Highlight {
            fields: spec.fields.clone(),
            full_fields: spec.full_fields.clone(),
            start_tag: spec.start_tag.clone(),
            end_tag: spec.end_tag.clone(),
            affix_num_tokens: spec.affix_num_tokens,
            snippet_threshold: spec.snippet_threshold,
        }
    }
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Where(_) => "where",
            Step::Not(_) => "not",
            Step::Rewhere(_) => "rewhere",
            Step::FilterRaw(_) => "filter_raw",
            Step::Scope(_) => "scope",
            Step::Order(_) => "order",
            Step::Select(_) => "select",
            Step::Exclude(_) => "exclude",
            Step::Reselect(_) => "reselect",
            Step::Joins(_) => "joins",
            Step::Limit(_) => "limit",
            Step::Offset(_) => "offset",
            Step::Page(_) => "page",
            Step::Per(_) => "per",
            Step::GroupBy(_) => "group_by",
            Step::FacetBy(_) => "facet_by",
            Step::FacetQuery { .. } => "facet_query",
            Step::Pin(_) => "pin",
            Step::Hide(_) => "hide",
            Step::Curate(_) => "curate",
            Step::Preset(_) => "preset",
            Step::Ranking(_) => "ranking",
            Step::Highlight(_) => "highlight",
            Step::Search(_) => "search",
            Step::QueryBy(_) => "query_by",
            Step::Infix(_) => "infix",
            Step::UseSynonyms(_) => "use_synonyms",
            Step::UseStopwords(_) => "use_stopwords",
            Step::LimitHits(_) => "limit_hits",
            Step::ValidateHits(_) => "validate_hits",
            Step::Unscope(_) => "unscope",
        }
    }

    pub fn apply(&self, state: &State, ctx: CompileCtx<'_>) -> Result<State> {
        match self {
            Step::Where(json) => state.where_(ctx, Condition::from_json(json)?),
            Step::Not(json) => state.where_not(ctx, Condition::from_json(json)?),
            Step::Rewhere(json) => state.rewhere(ctx, Condition::from_json(json)?),
            Step::FilterRaw(fragment) => state.filter_raw(fragment),
            Step::Scope(name) => state.scope(ctx, name),
            Step::Order(spec) => state.order(ctx, spec),
            Step::Select(fields) => state.select(ctx, fields),
            Step::Exclude(fields) => state.exclude(ctx, fields),
            Step::Reselect(fields) => state.reselect(ctx, fields),
            Step::Joins(assocs) => state.joins(ctx, assocs),
            Step::Limit(n) => state.limit(*n),
            Step::Offset(n) => state.offset(*n),
            Step::Page(n) => state.page(*n),
            Step::Per(n) => state.per(*n),
            Step::GroupBy(spec) => {
                let mut grouping = Grouping::new(spec.field.as_str());
                grouping.limit = spec.limit;
                grouping.missing_values = spec.missing_values;
                state.group_by(ctx, grouping)
            }
            Step::FacetBy(FacetSpec::Field(field)) => state.facet_by(ctx, field, None),
            Step::FacetBy(FacetSpec::Capped { field, max_values }) => {
                state.facet_by(ctx, field, *max_values)
            }
            Step::FacetQuery { field, expr } => state.facet_query(field, expr),
            Step::Pin(ids) => state.pin(ids.iter().cloned()),
            Step::Hide(ids) => state.hide(ids.iter().cloned()),
            Step::Curate(spec) => state.curate(spec.into()),
            Step::Preset(spec) => state.preset(&spec.name, PresetMode::parse(&spec.mode)?),
            Step::Ranking(spec) => state.ranking(spec.into()),
            Step::Highlight(spec) => state.highlight(spec.into()),
            Step::Search(q) => state.search(q),
            Step::QueryBy(fields) => state.query_by(ctx, fields),
            Step::Infix(mode) => state.infix(*mode),
            Step::UseSynonyms(on) => state.use_synonyms(*on),
            Step::UseStopwords(on) => state.use_stopwords(*on),
            Step::LimitHits(n) => state.limit_hits(*n),
            Step::ValidateHits(max) => state.validate_hits(*max),
            Step::Unscope(names) => {
                let parts = names
                    .iter()
                    .map(|name| {
                        Part::parse(name).ok_or_else(|| {
                            Error::invalid_option("unscope", format!("unknown part `{name}`"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                state.unscope(&parts)
            }
        }
    }
}

impl Plan {
    /// Replay every step onto an empty state, stopping at the first error.
    pub fn build(&self, ctx: CompileCtx<'_>) -> std::result::Result<State, LoadError> {
        self.steps
            .iter()
            .enumerate()
            .try_fold(State::new(), |state, (index, step)| {
                step.apply(&state, ctx).map_err(|source| LoadError::Step {
                    index,
                    step: step.name(),
                    source,
                })
            })
    }
}
