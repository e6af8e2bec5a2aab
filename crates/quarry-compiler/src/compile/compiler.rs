//! The stage pipeline.
//!
//! Stages run in a fixed order and each one only appends keys, so the
//! parameter map's key order is the stage order. The preset stage runs
//! last and is the only one that may drop keys. Compilation performs no
//! I/O and compiling the same state twice yields identical maps.

use indexmap::IndexSet;
use serde_json::{Value as Json, json};
use tracing::debug;

use quarry_core::{Error, Field, Result};

use super::filter;
use super::params::CompiledParams;
use super::preset;
use crate::CompileCtx;
use crate::state::State;

/// Compile `state` against the model and config in `ctx`.
pub fn compile(state: &State, ctx: CompileCtx<'_>) -> Result<CompiledParams> {
    let mut compiler = Compiler {
        state,
        ctx,
        params: CompiledParams::new(),
    };
    compiler.query();
    compiler.filter();
    compiler.sort();
    compiler.selection();
    compiler.highlight();
    compiler.facets();
    compiler.curation();
    compiler.pagination();
    compiler.grouping();
    compiler.ranking()?;
    compiler.join_usage();
    compiler.toggles();
    compiler.preset();

    let params = compiler.params;
    debug!(
        target: "quarry::compile",
        collection = ctx.collection(),
        keys = params.len(),
        filter = params.get_str("filter_by").unwrap_or(""),
        "compiled"
    );
    Ok(params)
}

struct Compiler<'s, 'a> {
    state: &'s State,
    ctx: CompileCtx<'a>,
    params: CompiledParams,
}

fn comma(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    items
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// `$assoc(body)` for joined fields, `body` otherwise.
fn scoped(field: &Field, body: String) -> String {
    match field.assoc() {
        Some(assoc) => format!("${assoc}({body})"),
        None => body,
    }
}

impl Compiler<'_, '_> {
    /// The `query_by` list, explicit or from config.
    fn query_by(&self) -> Vec<String> {
        if !self.state.query_by.is_empty() {
            return self.state.query_by.clone();
        }
        self.ctx
            .config
            .default_query_by
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    // (1)
    fn query(&mut self) {
        let q = self.state.query.as_deref().unwrap_or("*");
        self.params.insert("q", q);
        let query_by = self.query_by();
        if !query_by.is_empty() {
            self.params.insert("query_by", comma(&query_by));
        }
        if let Some(mode) = self.state.infix.or(self.ctx.config.default_infix) {
            self.params.insert("infix", mode.as_str());
        }
    }

    // (2)
    fn filter(&mut self) {
        let rendered = filter::render_all(&self.state.predicates).or_else(|| {
            let fragments: Vec<&str> = self
                .state
                .fragments
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .collect();
            (!fragments.is_empty()).then(|| fragments.join(" && "))
        });
        if let Some(filter_by) = rendered {
            self.params.insert("filter_by", filter_by);
        }
    }

    // (3)
    fn sort(&mut self) {
        if self.state.orders.is_empty() {
            return;
        }
        let sort_by = comma(
            self.state
                .orders
                .iter()
                .map(|(field, dir)| scoped(field, format!("{}:{}", field.name(), dir.as_str()))),
        );
        self.params.insert("sort_by", sort_by);
    }

    // (4)
    fn selection(&mut self) {
        let sel = &self.state.selection;
        let mut include: Vec<String> = sel
            .include_nested
            .keys()
            .filter_map(|assoc| {
                let fields = sel.effective_nested(assoc);
                (!fields.is_empty()).then(|| format!("${assoc}({})", comma(fields)))
            })
            .collect();
        include.extend(sel.effective_base().into_iter().map(String::from));
        if sel.has_includes() {
            // an include list excluded down to nothing emits neither key
            if !include.is_empty() {
                self.params.insert("include_fields", comma(include));
            }
            return;
        }

        let mut exclude: Vec<String> = sel
            .exclude_nested
            .iter()
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(assoc, fields)| {
                let mut fields: Vec<&str> = fields.iter().map(String::as_str).collect();
                fields.sort_unstable();
                format!("${assoc}({})", comma(fields))
            })
            .collect();
        exclude.extend(sel.exclude.iter().cloned());
        if !exclude.is_empty() {
            self.params.insert("exclude_fields", comma(exclude));
        }
    }

    // (5)
    fn highlight(&mut self) {
        let Some(h) = &self.state.highlight else {
            return;
        };
        if !h.fields.is_empty() {
            self.params.insert("highlight_fields", comma(&h.fields));
        }
        if !h.full_fields.is_empty() {
            self.params.insert("highlight_full_fields", comma(&h.full_fields));
        }
        if let Some(tag) = &h.start_tag {
            self.params.insert("highlight_start_tag", tag.as_str());
        }
        if let Some(tag) = &h.end_tag {
            self.params.insert("highlight_end_tag", tag.as_str());
        }
        if let Some(n) = h.affix_num_tokens {
            self.params.insert("highlight_affix_num_tokens", n);
        }
        if let Some(n) = h.snippet_threshold {
            self.params.insert("snippet_threshold", n);
        }
    }

    // (6)
    fn facets(&mut self) {
        let facets = &self.state.facets;
        if !facets.fields.is_empty() {
            self.params.insert("facet_by", comma(&facets.fields));
        }
        if let Some(cap) = facets.caps.values().max() {
            self.params.insert("max_facet_values", *cap);
        }
        if !facets.queries.is_empty() {
            let queries = facets
                .queries
                .iter()
                .map(|(field, expr)| format!("{field}:{expr}"));
            self.params.insert("facet_query", comma(queries));
        }
    }

    // (7)
    fn curation(&mut self) {
        let c = &self.state.curation;
        if !c.pinned.is_empty() {
            let pinned = c
                .pinned
                .iter()
                .enumerate()
                .map(|(i, id)| format!("{id}:{}", i + 1));
            self.params.insert("pinned_hits", comma(pinned));
        }
        if !c.hidden.is_empty() {
            self.params.insert("hidden_hits", comma(&c.hidden));
        }
        if !c.override_tags.is_empty() {
            self.params.insert("override_tags", comma(&c.override_tags));
        }
        if let Some(on) = c.filter_curated_hits {
            self.params.insert("filter_curated_hits", on);
        }
    }

    // (8)
    fn pagination(&mut self) {
        let limits = self.state.hit_limits;
        let window = self.state.pagination.resolve();
        let page = window.and_then(|w| w.page);
        let mut per_page = window.and_then(|w| w.per_page);
        if let Some(cap) = limits.early_limit {
            per_page = Some(per_page.map_or(cap, |p| p.min(cap)));
        }
        if let Some(page) = page {
            self.params.insert("page", page);
        }
        if let Some(per_page) = per_page {
            self.params.insert("per_page", per_page);
        }
        if !limits.is_empty() {
            let mut hits = serde_json::Map::new();
            if let Some(n) = limits.early_limit {
                hits.insert("early_limit".into(), n.into());
            }
            if let Some(n) = limits.validate_max {
                hits.insert("validate_max".into(), n.into());
            }
            self.params.insert("_hits", Json::Object(hits));
        }
    }

    // (9)
    fn grouping(&mut self) {
        let Some(g) = &self.state.grouping else {
            return;
        };
        self.params.insert("group_by", g.field.as_str());
        if let Some(limit) = g.limit {
            self.params.insert("group_limit", limit);
        }
        if let Some(keep) = g.missing_values {
            self.params.insert("group_missing_values", keep);
        }
    }

    // (10)
    fn ranking(&mut self) -> Result<()> {
        let r = &self.state.ranking;
        if let Some(n) = r.num_typos {
            self.params.insert("num_typos", n);
        }
        if let Some(n) = r.drop_tokens_threshold {
            self.params.insert("drop_tokens_threshold", n);
        }
        if let Some(on) = r.prioritize_exact_match {
            self.params.insert("prioritize_exact_match", on);
        }
        if r.weights.is_empty() {
            return Ok(());
        }
        let query_by = self.query_by();
        if let Some(stray) = r.weights.keys().find(|f| !query_by.contains(*f)) {
            return Err(Error::invalid_option(
                "ranking",
                format!("weight given for `{stray}` which is not in query_by"),
            ));
        }
        let weights = query_by
            .iter()
            .map(|f| r.weights.get(f).copied().unwrap_or(1).to_string());
        self.params.insert("query_by_weights", comma(weights));
        Ok(())
    }

    // (11)
    fn join_usage(&mut self) {
        let state = self.state;
        if !state.joins.is_empty() {
            let assocs: IndexSet<&str> = state.joins.iter().map(String::as_str).collect();
            let include: Vec<&str> = state
                .selection
                .include_nested
                .keys()
                .map(String::as_str)
                .collect();
            let mut filter: IndexSet<&str> = IndexSet::new();
            for node in &state.predicates {
                node.visit_fields(&mut |f| {
                    if let Some(assoc) = f.assoc() {
                        filter.insert(assoc);
                    }
                });
            }
            let sort: IndexSet<&str> = state.orders.keys().filter_map(Field::assoc).collect();
            self.params.insert(
                "_join",
                json!({
                    "assocs": assocs,
                    "include": include,
                    "filter": filter,
                    "sort": sort,
                }),
            );
        }
        if self.ctx.config.selection.strict_missing {
            self.params
                .insert("_runtime_flags", json!({ "strict_missing": true }));
        }
    }

    // (12)
    fn toggles(&mut self) {
        if let Some(on) = self.state.use_synonyms {
            self.params.insert("enable_synonyms", on);
        }
        if let Some(on) = self.state.use_stopwords {
            self.params.insert("remove_stop_words", on);
        }
    }

    // (13)
    fn preset(&mut self) {
        let Some(p) = &self.state.preset else {
            return;
        };
        let config = &self.ctx.config.presets;
        if !config.enabled {
            debug!(target: "quarry::compile", preset = %p.name, "presets disabled, preset ignored");
            return;
        }
        let conflicts = preset::apply(&mut self.params, p, config);
        if !conflicts.is_empty() {
            debug!(
                target: "quarry::compile",
                preset = %p.name,
                ?conflicts,
                "locked preset displaced compiled keys"
            );
        }
    }
}
