//! Immutable query state.
//!
//! A [`State`] is a closed record of every query dimension. Chainers (see
//! `chain`) borrow the current state and return a fresh one; nothing hands
//! out mutable access to a state once it has been built.

mod chain;
mod options;
mod pagination;
mod selection;

#[cfg(test)]
mod chain_tests;

use indexmap::IndexMap;

use quarry_core::{Field, InfixMode, Node};

pub use options::{
    Curation, Direction, Facets, Grouping, Highlight, HitLimits, MAX_FIELD_WEIGHT, Preset,
    PresetMode, Ranking,
};
pub use pagination::{PageWindow, Pagination};
pub use selection::{FieldAccess, Selection};

/// Snapshot of one query description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub(crate) query: Option<String>,
    pub(crate) query_by: Vec<String>,
    pub(crate) infix: Option<InfixMode>,
    pub(crate) predicates: Vec<Node>,
    /// Legacy string fragments; compiled only when `predicates` is empty.
    pub(crate) fragments: Vec<String>,
    pub(crate) orders: IndexMap<Field, Direction>,
    pub(crate) selection: Selection,
    pub(crate) joins: Vec<String>,
    pub(crate) pagination: Pagination,
    pub(crate) grouping: Option<Grouping>,
    pub(crate) facets: Facets,
    pub(crate) curation: Curation,
    pub(crate) preset: Option<Preset>,
    pub(crate) ranking: Ranking,
    pub(crate) highlight: Option<Highlight>,
    pub(crate) use_synonyms: Option<bool>,
    pub(crate) use_stopwords: Option<bool>,
    pub(crate) hit_limits: HitLimits,
}

/// A dimension cleared by `unscope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Where,
    Order,
    Select,
    Joins,
    Pagination,
    Group,
    Facets,
    Curation,
    Preset,
    Ranking,
    Highlight,
    Search,
    HitLimits,
}

impl Part {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "where" | "filter" => Part::Where,
            "order" | "sort" => Part::Order,
            "select" | "selection" => Part::Select,
            "joins" => Part::Joins,
            "limit" | "offset" | "page" | "per" | "pagination" => Part::Pagination,
            "group" | "group_by" => Part::Group,
            "facets" | "facet_by" => Part::Facets,
            "curation" | "curate" => Part::Curation,
            "preset" => Part::Preset,
            "ranking" => Part::Ranking,
            "highlight" => Part::Highlight,
            "search" | "query" => Part::Search,
            "hits" | "hit_limits" => Part::HitLimits,
            _ => return None,
        })
    }
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn query_fields(&self) -> &[String] {
        &self.query_by
    }

    pub fn predicates(&self) -> &[Node] {
        &self.predicates
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn orders(&self) -> &IndexMap<Field, Direction> {
        &self.orders
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn applied_joins(&self) -> &[String] {
        &self.joins
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn grouping(&self) -> Option<&Grouping> {
        self.grouping.as_ref()
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn curation(&self) -> &Curation {
        &self.curation
    }

    pub fn preset_spec(&self) -> Option<&Preset> {
        self.preset.as_ref()
    }

    pub fn ranking_spec(&self) -> &Ranking {
        &self.ranking
    }

    pub fn highlight_spec(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn hit_limits(&self) -> &HitLimits {
        &self.hit_limits
    }

    /// Page/per-page was requested explicitly or derived from a limit.
    pub fn is_paginated(&self) -> bool {
        self.pagination.resolve().is_some()
    }
}
