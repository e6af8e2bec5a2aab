//! Terminal operations. Everything that reads hits goes through
//! [`Relation::execute`].

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as Json;
use tracing::debug;

use quarry_compiler::JoinGuard;
use quarry_core::{Error, Field, JoinContext};

use super::Relation;
use crate::client::Params;
use crate::error::{Result, RuntimeError};
use crate::result::{Document, HydrationContext, SearchResult};

/// Keys dropped from probe fetches that only need `found`.
const PROBE_DROPPED: [&str; 5] = [
    "exclude_fields",
    "facet_by",
    "max_facet_values",
    "facet_query",
    "highlight_fields",
];

impl Relation {
    pub(crate) fn hydration_context(&self) -> HydrationContext {
        let state = &self.state;
        let selection = state.selection();
        let mut required = Vec::new();
        if self.config.selection.strict_missing && selection.has_includes() {
            for assoc in selection.include_nested.keys() {
                required.extend(
                    selection
                        .effective_nested(assoc)
                        .into_iter()
                        .map(|f| format!("{assoc}.{f}")),
                );
            }
            required.extend(
                selection
                    .effective_base()
                    .into_iter()
                    .filter(|f| !self.model.attribute(f).is_some_and(|a| a.optional()))
                    .map(String::from),
            );
        }
        HydrationContext {
            required,
            validate_max: state.hit_limits().validate_max,
        }
    }

    /// One search round trip, wrapped for hydration.
    pub(crate) fn fetch(&self, params: &Params, purpose: &'static str) -> Result<SearchResult> {
        let collection = self.collection();
        let started = Instant::now();
        let raw = self
            .client
            .search(collection, params)
            .map_err(|source| RuntimeError::Client {
                collection: collection.to_owned(),
                source,
            })?;
        let result = SearchResult::new(raw, self.hydration_context());
        debug!(
            target: "quarry::execute",
            collection,
            purpose,
            found = result.found(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search"
        );
        Ok(result)
    }

    /// Compile, search once and memoize.
    ///
    /// Concurrent callers on the same relation wait for the first one and
    /// share its result. Validation errors surface before any I/O.
    pub fn execute(&self) -> Result<Arc<SearchResult>> {
        self.cell.get_or_execute(|| {
            let params = self.to_params()?;
            self.fetch(&params, "execute")
        })
    }

    /// Whether a memoized result exists.
    pub fn is_loaded(&self) -> bool {
        self.cell.is_memoized()
    }

    pub fn to_a(&self) -> Result<Vec<Document>> {
        Ok(self.execute()?.documents()?.to_vec())
    }

    pub fn each(&self, f: impl FnMut(&Document)) -> Result<()> {
        let result = self.execute()?;
        result.documents()?.iter().for_each(f);
        Ok(())
    }

    pub fn first(&self) -> Result<Option<Document>> {
        Ok(self.execute()?.documents()?.first().cloned())
    }

    pub fn last(&self) -> Result<Option<Document>> {
        Ok(self.execute()?.documents()?.last().cloned())
    }

    pub fn take(&self, n: usize) -> Result<Vec<Document>> {
        let result = self.execute()?;
        let docs = result.documents()?;
        Ok(docs[..n.min(docs.len())].to_vec())
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// Total matching documents.
    ///
    /// Uses the memo when present, a minimized probe fetch otherwise. With
    /// curated-hit filtering on, counts the hits that survive curation.
    pub fn count(&self) -> Result<u64> {
        if self.state.curation().filters_curated_hits() {
            return Ok(self.execute()?.documents()?.len() as u64);
        }
        if let Some(result) = self.cell.memoized() {
            return Ok(result.found());
        }
        self.cell.get_or_probe(|| {
            let mut params = self.to_params()?;
            for key in PROBE_DROPPED {
                params.shift_remove(key);
            }
            params.insert("page".into(), 1.into());
            params.insert("per_page".into(), 1.into());
            params.insert("include_fields".into(), "id".into());
            Ok(self.fetch(&params, "probe")?.found())
        })
    }

    /// Resolve pluck targets and check them against the effective selection.
    fn readable_fields<I, S>(&self, fields: I) -> quarry_core::Result<Vec<Field>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let guard = JoinGuard::new(self.ctx());
        let selection = self.state.selection();
        let fields = fields
            .into_iter()
            .map(|f| {
                let field = guard.resolve(f.as_ref(), self.state.applied_joins(), JoinContext::Select)?;
                selection.ensure_readable(&field)?;
                Ok(field)
            })
            .collect::<quarry_core::Result<Vec<_>>>()?;
        if fields.is_empty() {
            return Err(Error::invalid_argument("pluck needs at least one field"));
        }
        Ok(fields)
    }

    /// Field values per document. One field yields bare values, several
    /// yield one array per document.
    pub fn pluck<I, S>(&self, fields: I) -> Result<Vec<Json>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = self.readable_fields(fields)?;
        let paths: Vec<String> = fields.iter().map(Field::to_string).collect();
        let result = self.execute()?;
        let read = |doc: &Document, path: &str| doc.get(path).cloned().unwrap_or(Json::Null);
        let rows = result
            .documents()?
            .iter()
            .map(|doc| match paths.as_slice() {
                [single] => read(doc, single),
                many => Json::Array(many.iter().map(|p| read(doc, p)).collect()),
            })
            .collect();
        Ok(rows)
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        self.readable_fields(["id"])?;
        let result = self.execute()?;
        Ok(result.documents()?.iter().filter_map(Document::id).collect())
    }

    /// Up to `n` documents for inspection.
    ///
    /// Reads the memo when one exists. Otherwise fetches a first page of
    /// `n` into a preview cache that never becomes the memo.
    pub fn peek(&self, n: usize) -> Result<Vec<Document>> {
        let result = match self.cell.memoized() {
            Some(result) => result,
            None => self.cell.get_or_preview(n, || {
                let mut params = self.to_params()?;
                params.insert("page".into(), 1.into());
                params.insert("per_page".into(), n.max(1).into());
                self.fetch(&params, "peek")
            })?,
        };
        let docs = result.documents()?;
        Ok(docs[..n.min(docs.len())].to_vec())
    }
}
