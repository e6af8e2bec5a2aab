//! The query object.
//!
//! A [`Relation`] binds a collection model, an immutable [`State`] and a
//! private execution cell. Chainers return a new relation with a fresh,
//! unexecuted cell; the receiver and its memo are never touched.

mod batch;
mod exec;
mod materialize;

#[cfg(test)]
mod exec_tests;
#[cfg(test)]
mod materialize_tests;

use std::fmt;
use std::sync::Arc;

use quarry_compiler::{
    CompileCtx, CompiledParams, Condition, Curation, Direction, Grouping, Highlight, Part,
    PresetMode, Ranking, State,
};
use quarry_core::{Config, InfixMode, Model, Registry};

use crate::client::{Client, Params};
use exec::ExecCell;

pub struct Relation {
    model: Arc<Model>,
    registry: Arc<Registry>,
    config: Arc<Config>,
    client: Arc<dyn Client>,
    state: Arc<State>,
    cell: ExecCell,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("collection", &self.model.collection())
            .field("state", &self.state)
            .field("memoized", &self.cell.is_memoized())
            .finish()
    }
}

impl Relation {
    pub(crate) fn new(
        model: Arc<Model>,
        registry: Arc<Registry>,
        config: Arc<Config>,
        client: Arc<dyn Client>,
    ) -> Self {
        Self {
            model,
            registry,
            config,
            client,
            state: Arc::new(State::new()),
            cell: ExecCell::default(),
        }
    }

    pub fn collection(&self) -> &str {
        self.model.collection()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    fn ctx(&self) -> CompileCtx<'_> {
        CompileCtx::new(&self.model, &self.registry, &self.config)
    }

    /// A sibling relation over `state` with its own unexecuted cell.
    fn spawn(&self, state: State) -> Relation {
        Relation {
            model: Arc::clone(&self.model),
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
            client: Arc::clone(&self.client),
            state: Arc::new(state),
            cell: ExecCell::default(),
        }
    }

    fn derive(
        &self,
        apply: impl FnOnce(&State, CompileCtx<'_>) -> quarry_core::Result<State>,
    ) -> quarry_core::Result<Relation> {
        let state = apply(&self.state, self.ctx())?;
        Ok(self.spawn(state))
    }

    /// An unexecuted copy of this relation.
    pub fn fresh(&self) -> Relation {
        self.spawn(State::clone(&self.state))
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Compiled parameters including diagnostic keys. No I/O.
    pub fn explain(&self) -> quarry_core::Result<CompiledParams> {
        quarry_compiler::compile(&self.state, self.ctx())
    }

    /// The exact parameters sent to the backend.
    pub fn to_params(&self) -> quarry_core::Result<Params> {
        Ok(self.explain()?.to_wire())
    }

    // ------------------------------------------------------------------
    // Chainers
    // ------------------------------------------------------------------

    pub fn where_(&self, condition: impl Into<Condition>) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.where_(ctx, condition))
    }

    pub fn where_not(&self, condition: impl Into<Condition>) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.where_not(ctx, condition))
    }

    pub fn rewhere(&self, condition: impl Into<Condition>) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.rewhere(ctx, condition))
    }

    pub fn filter_raw(&self, fragment: &str) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.filter_raw(fragment))
    }

    pub fn scope(&self, name: &str) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.scope(ctx, name))
    }

    pub fn order(&self, spec: &str) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.order(ctx, spec))
    }

    pub fn order_by(&self, field: &str, dir: Direction) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.order_by(ctx, field, dir))
    }

    pub fn select<I, S>(&self, fields: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.derive(|s, ctx| s.select(ctx, fields))
    }

    pub fn exclude<I, S>(&self, fields: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.derive(|s, ctx| s.exclude(ctx, fields))
    }

    pub fn reselect<I, S>(&self, fields: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.derive(|s, ctx| s.reselect(ctx, fields))
    }

    pub fn joins<I, S>(&self, assocs: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.derive(|s, ctx| s.joins(ctx, assocs))
    }

    pub fn limit(&self, n: u32) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.limit(n))
    }

    pub fn offset(&self, n: u32) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.offset(n))
    }

    pub fn page(&self, n: u32) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.page(n))
    }

    pub fn per(&self, n: u32) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.per(n))
    }

    pub fn group_by(&self, grouping: Grouping) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.group_by(ctx, grouping))
    }

    pub fn facet_by(&self, field: &str, max_values: Option<u32>) -> quarry_core::Result<Relation> {
        self.derive(|s, ctx| s.facet_by(ctx, field, max_values))
    }

    pub fn facet_query(&self, field: &str, expr: &str) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.facet_query(field, expr))
    }

    pub fn pin<I, S>(&self, ids: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(|s, _| s.pin(ids))
    }

    pub fn hide<I, S>(&self, ids: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(|s, _| s.hide(ids))
    }

    pub fn curate(&self, curation: Curation) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.curate(curation))
    }

    pub fn preset(&self, name: &str, mode: PresetMode) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.preset(name, mode))
    }

    pub fn ranking(&self, ranking: Ranking) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.ranking(ranking))
    }

    pub fn highlight(&self, highlight: Highlight) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.highlight(highlight))
    }

    pub fn search(&self, q: &str) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.search(q))
    }

    pub fn query_by<I, S>(&self, fields: I) -> quarry_core::Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.derive(|s, ctx| s.query_by(ctx, fields))
    }

    pub fn infix(&self, mode: InfixMode) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.infix(mode))
    }

    pub fn use_synonyms(&self, on: bool) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.use_synonyms(on))
    }

    pub fn use_stopwords(&self, on: bool) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.use_stopwords(on))
    }

    pub fn limit_hits(&self, n: u32) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.limit_hits(n))
    }

    pub fn validate_hits(&self, max: u64) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.validate_hits(max))
    }

    pub fn unscope(&self, parts: &[Part]) -> quarry_core::Result<Relation> {
        self.derive(|s, _| s.unscope(parts))
    }
}
