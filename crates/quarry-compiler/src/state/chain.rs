//! Copy-on-write chainers.
//!
//! Every chainer validates its delta first and only then clones the
//! receiver, so a failed call leaves no half-applied state behind.

use indexmap::IndexSet;
use tracing::trace;

use quarry_core::utils::suggest;
use quarry_core::{Error, Field, InfixMode, JoinContext, Node, Result};

use super::{Curation, Direction, Grouping, Highlight, Part, Preset, PresetMode, Ranking, State};
use crate::CompileCtx;
use crate::compile::filter;
use crate::dsl::{Condition, Parser};
use crate::guard::JoinGuard;

/// Backend bound on `group_limit`.
const MAX_GROUP_LIMIT: u32 = 99;

fn positive(option: &'static str, n: u32) -> Result<u32> {
    if n == 0 {
        return Err(Error::invalid_option(option, "must be greater than zero"));
    }
    Ok(n)
}

fn non_blank<'s>(option: &'static str, what: &str, s: &'s str) -> Result<&'s str> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::invalid_option(option, format!("{what} must not be blank")));
    }
    Ok(s)
}

impl State {
    fn with(&self, apply: impl FnOnce(&mut State)) -> State {
        let mut next = self.clone();
        apply(&mut next);
        next
    }

    fn parse(&self, ctx: CompileCtx<'_>, condition: &Condition, negated: bool) -> Result<Vec<Node>> {
        Parser::new(ctx, &self.joins).parse(condition, negated)
    }

    fn push_predicates(&mut self, nodes: Vec<Node>) {
        for node in nodes {
            self.fragments.push(filter::render(&node));
            self.predicates.push(node);
        }
    }

    // ------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------

    /// Append predicates. An empty condition is a no-op.
    pub fn where_(&self, ctx: CompileCtx<'_>, condition: impl Into<Condition>) -> Result<State> {
        let condition = condition.into();
        if condition.is_empty() {
            return Ok(self.clone());
        }
        let nodes = self.parse(ctx, &condition, false)?;
        Ok(self.with(|s| s.push_predicates(nodes)))
    }

    /// Append inverted predicates. Only `Eq` and `In` are inverted.
    pub fn where_not(&self, ctx: CompileCtx<'_>, condition: impl Into<Condition>) -> Result<State> {
        let condition = condition.into();
        if condition.is_empty() {
            return Ok(self.clone());
        }
        let nodes = self.parse(ctx, &condition, true)?;
        Ok(self.with(|s| s.push_predicates(nodes)))
    }

    /// Replace predicates on the fields the new condition references.
    pub fn rewhere(&self, ctx: CompileCtx<'_>, condition: impl Into<Condition>) -> Result<State> {
        let condition = condition.into();
        let nodes = self.parse(ctx, &condition, false)?;
        let mut touched: IndexSet<&Field> = IndexSet::new();
        for node in &nodes {
            node.visit_fields(&mut |f| {
                touched.insert(f);
            });
        }
        let references = |node: &Node| {
            let mut hit = false;
            node.visit_fields(&mut |f| hit |= touched.contains(f));
            hit
        };
        let (dropped, kept): (Vec<Node>, Vec<Node>) =
            self.predicates.iter().cloned().partition(|n| references(n));
        let dropped: IndexSet<String> = dropped.iter().map(filter::render).collect();
        let fragments = self
            .fragments
            .iter()
            .filter(|f| !dropped.contains(*f))
            .cloned()
            .collect();

        let mut next = self.clone();
        next.predicates = kept;
        next.fragments = fragments;
        next.push_predicates(nodes);
        Ok(next)
    }

    /// Append a legacy filter fragment. Compiled only while no AST
    /// predicate exists.
    pub fn filter_raw(&self, fragment: &str) -> Result<State> {
        let fragment = non_blank("filter", "fragment", fragment)?.to_owned();
        Ok(self.with(|s| s.fragments.push(fragment)))
    }

    /// Apply a named scope of the queried model.
    pub fn scope(&self, ctx: CompileCtx<'_>, name: &str) -> Result<State> {
        let model = ctx.model;
        let nodes = model.scope(name).ok_or_else(|| Error::UnknownScope {
            collection: model.collection().to_owned(),
            scope: name.to_owned(),
            suggestions: suggest(name, model.scope_names()),
        })?;
        let nodes = self.parse(ctx, &Condition::Nodes(nodes.to_vec()), false)?;
        Ok(self.with(|s| s.push_predicates(nodes)))
    }

    // ------------------------------------------------------------------
    // Ordering and selection
    // ------------------------------------------------------------------

    /// Order by a spec such as `"price:desc, name"`. Later entries for the
    /// same field overwrite the direction but keep the original position.
    pub fn order(&self, ctx: CompileCtx<'_>, spec: &str) -> Result<State> {
        let mut entries = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (path, dir) = match part.split_once(':') {
                Some((path, dir)) => (path, Direction::parse(dir)?),
                None => match part.split_once(char::is_whitespace) {
                    Some((path, dir)) => (path, Direction::parse(dir)?),
                    None => (part, Direction::Asc),
                },
            };
            entries.push((path.trim(), dir));
        }
        if entries.is_empty() {
            return Err(Error::invalid_option("order", "no field given"));
        }
        let guard = JoinGuard::new(ctx);
        let resolved = entries
            .into_iter()
            .map(|(path, dir)| Ok((guard.resolve(path, &self.joins, JoinContext::Sort)?, dir)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with(|s| s.orders.extend(resolved)))
    }

    pub fn order_by(&self, ctx: CompileCtx<'_>, field: &str, dir: Direction) -> Result<State> {
        let field = JoinGuard::new(ctx).resolve(field, &self.joins, JoinContext::Sort)?;
        Ok(self.with(|s| {
            s.orders.insert(field, dir);
        }))
    }

    fn resolve_all<I, S>(&self, ctx: CompileCtx<'_>, fields: I, context: JoinContext) -> Result<Vec<Field>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let guard = JoinGuard::new(ctx);
        fields
            .into_iter()
            .map(|f| guard.resolve(f.as_ref(), &self.joins, context))
            .collect()
    }

    pub fn select<I, S>(&self, ctx: CompileCtx<'_>, fields: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = self.resolve_all(ctx, fields, JoinContext::Select)?;
        Ok(self.with(|s| fields.iter().for_each(|f| s.selection.add_include(f))))
    }

    pub fn exclude<I, S>(&self, ctx: CompileCtx<'_>, fields: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = self.resolve_all(ctx, fields, JoinContext::Exclude)?;
        Ok(self.with(|s| fields.iter().for_each(|f| s.selection.add_exclude(f))))
    }

    /// Replace the include list outright.
    pub fn reselect<I, S>(&self, ctx: CompileCtx<'_>, fields: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = self.resolve_all(ctx, fields, JoinContext::Select)?;
        Ok(self.with(|s| {
            s.selection.clear_includes();
            fields.iter().for_each(|f| s.selection.add_include(f));
        }))
    }

    /// Apply associations. Repeats are kept.
    pub fn joins<I, S>(&self, ctx: CompileCtx<'_>, assocs: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let guard = JoinGuard::new(ctx);
        let mut applied = Vec::new();
        for assoc in assocs {
            let assoc = assoc.as_ref().trim();
            let config = guard.ensure_declared(assoc)?;
            guard.ensure_complete(assoc, config)?;
            applied.push(assoc.to_owned());
        }
        Ok(self.with(|s| s.joins.extend(applied)))
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    pub fn limit(&self, n: u32) -> Result<State> {
        let n = positive("limit", n)?;
        Ok(self.with(|s| s.pagination.limit = Some(n)))
    }

    pub fn offset(&self, n: u32) -> Result<State> {
        Ok(self.with(|s| s.pagination.offset = Some(n)))
    }

    pub fn page(&self, n: u32) -> Result<State> {
        let n = positive("page", n)?;
        Ok(self.with(|s| s.pagination.page = Some(n)))
    }

    pub fn per(&self, n: u32) -> Result<State> {
        let n = positive("per", n)?;
        Ok(self.with(|s| s.pagination.per_page = Some(n)))
    }

    // ------------------------------------------------------------------
    // Grouping, facets, curation
    // ------------------------------------------------------------------

    pub fn group_by(&self, ctx: CompileCtx<'_>, grouping: Grouping) -> Result<State> {
        non_blank("group_by", "field", &grouping.field)?;
        JoinGuard::new(ctx).ensure_known_base(grouping.field.trim())?;
        if let Some(limit) = grouping.limit
            && !(1..=MAX_GROUP_LIMIT).contains(&limit)
        {
            return Err(Error::invalid_option(
                "group_by",
                format!("limit must be between 1 and {MAX_GROUP_LIMIT} (got {limit})"),
            ));
        }
        let grouping = Grouping {
            field: grouping.field.trim().to_owned(),
            ..grouping
        };
        Ok(self.with(|s| s.grouping = Some(grouping)))
    }

    /// Facet on a field, optionally capping its value count.
    pub fn facet_by(&self, ctx: CompileCtx<'_>, field: &str, max_values: Option<u32>) -> Result<State> {
        let field = non_blank("facet_by", "field", field)?;
        JoinGuard::new(ctx).ensure_known_base(field)?;
        if let Some(cap) = max_values {
            positive("facet_by", cap)?;
        }
        let field = field.to_owned();
        Ok(self.with(|s| {
            s.facets.fields.insert(field.clone());
            if let Some(cap) = max_values {
                s.facets.caps.insert(field, cap);
            }
        }))
    }

    /// Narrow the facet values of an already faceted field.
    pub fn facet_query(&self, field: &str, expr: &str) -> Result<State> {
        let field = non_blank("facet_query", "field", field)?;
        let expr = non_blank("facet_query", "expression", expr)?;
        if !self.facets.fields.contains(field) {
            return Err(Error::invalid_option(
                "facet_query",
                format!("`{field}` is not faceted; call facet_by first"),
            ));
        }
        let entry = (field.to_owned(), expr.to_owned());
        Ok(self.with(|s| s.facets.queries.push(entry)))
    }

    pub fn pin<I, S>(&self, ids: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.curate(Curation::new().pin(ids))
    }

    pub fn hide<I, S>(&self, ids: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.curate(Curation::new().hide(ids))
    }

    pub fn curate(&self, curation: Curation) -> Result<State> {
        let blank = curation
            .pinned
            .iter()
            .chain(&curation.hidden)
            .chain(&curation.override_tags)
            .any(|s| s.trim().is_empty());
        if blank {
            return Err(Error::invalid_option("curate", "ids and tags must not be blank"));
        }
        Ok(self.with(|s| s.curation = s.curation.merge(&curation)))
    }

    // ------------------------------------------------------------------
    // Presets, ranking, search
    // ------------------------------------------------------------------

    pub fn preset(&self, name: &str, mode: PresetMode) -> Result<State> {
        let name = non_blank("preset", "name", name)?.to_owned();
        Ok(self.with(|s| s.preset = Some(Preset { name, mode })))
    }

    pub fn ranking(&self, ranking: Ranking) -> Result<State> {
        ranking.validate()?;
        Ok(self.with(|s| s.ranking = s.ranking.merge(&ranking)))
    }

    pub fn highlight(&self, highlight: Highlight) -> Result<State> {
        highlight.validate()?;
        Ok(self.with(|s| s.highlight = Some(highlight)))
    }

    /// Set the query term. `*` matches everything.
    pub fn search(&self, q: &str) -> Result<State> {
        let q = q.to_owned();
        Ok(self.with(|s| s.query = Some(q)))
    }

    pub fn query_by<I, S>(&self, ctx: CompileCtx<'_>, fields: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let guard = JoinGuard::new(ctx);
        let mut resolved = Vec::new();
        for field in fields {
            let field = non_blank("query_by", "field", field.as_ref())?;
            guard.ensure_known_base(field)?;
            resolved.push(field.to_owned());
        }
        if resolved.is_empty() {
            return Err(Error::invalid_option("query_by", "no field given"));
        }
        Ok(self.with(|s| s.query_by = resolved))
    }

    pub fn infix(&self, mode: InfixMode) -> Result<State> {
        Ok(self.with(|s| s.infix = Some(mode)))
    }

    pub fn use_synonyms(&self, on: bool) -> Result<State> {
        Ok(self.with(|s| s.use_synonyms = Some(on)))
    }

    pub fn use_stopwords(&self, on: bool) -> Result<State> {
        Ok(self.with(|s| s.use_stopwords = Some(on)))
    }

    /// Cap `per_page` at compile time.
    pub fn limit_hits(&self, n: u32) -> Result<State> {
        let n = positive("limit_hits", n)?;
        Ok(self.with(|s| s.hit_limits.early_limit = Some(n)))
    }

    /// Fail hydration when the backend reports more than `max` hits.
    pub fn validate_hits(&self, max: u64) -> Result<State> {
        Ok(self.with(|s| s.hit_limits.validate_max = Some(max)))
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    pub fn unscope(&self, parts: &[Part]) -> Result<State> {
        trace!(target: "quarry::compile", ?parts, "unscope");
        Ok(self.with(|s| {
            for part in parts {
                match part {
                    Part::Where => {
                        s.predicates.clear();
                        s.fragments.clear();
                    }
                    Part::Order => s.orders.clear(),
                    Part::Select => s.selection = Default::default(),
                    Part::Joins => s.joins.clear(),
                    Part::Pagination => s.pagination = Default::default(),
                    Part::Group => s.grouping = None,
                    Part::Facets => s.facets = Default::default(),
                    Part::Curation => s.curation = Default::default(),
                    Part::Preset => s.preset = None,
                    Part::Ranking => s.ranking = Default::default(),
                    Part::Highlight => s.highlight = None,
                    Part::Search => {
                        s.query = None;
                        s.query_by.clear();
                        s.infix = None;
                    }
                    Part::HitLimits => s.hit_limits = Default::default(),
                }
            }
        }))
    }
}
