//! Multi-page fetch through batched multi-search.

use serde_json::Value as Json;
use tracing::debug;

use super::Relation;
use crate::client::Params;
use crate::error::{HydrationError, Result, RuntimeError};
use crate::result::{Document, SearchResult};

impl Relation {
    /// Every matching document, in page order.
    ///
    /// A relation with explicit pagination is just executed. Otherwise one
    /// request fetches the total, then pages of `batch_per_page` hits are
    /// requested through multi-search, at most `multi_search_limit` pages
    /// per round trip. Round trips are sequential and failures are not
    /// retried. A `limit_hits` cap bounds the total yielded.
    pub fn all_pages(&self) -> Result<Vec<Document>> {
        if self.state.is_paginated() {
            return self.to_a();
        }
        let cap = self.state.hit_limits().early_limit.map(u64::from);
        let total = self.count()?;
        let total = cap.map_or(total, |cap| total.min(cap));
        if total == 0 {
            return Ok(Vec::new());
        }

        let per_page = u64::from(self.config.batch_per_page.max(1));
        let pages = total.div_ceil(per_page);
        let limit = self.config.multi_search_limit.max(1);
        let base = self.to_params()?;
        let collection = self.collection().to_owned();

        let searches: Vec<(String, Params)> = (1..=pages)
            .map(|page| {
                let mut params = base.clone();
                params.insert("page".into(), page.into());
                params.insert("per_page".into(), per_page.into());
                (collection.clone(), params)
            })
            .collect();

        let context = self.hydration_context();
        let mut documents = Vec::new();
        for (batch_index, batch) in searches.chunks(limit).enumerate() {
            debug!(
                target: "quarry::batch",
                collection = %collection,
                batch = batch_index,
                searches = batch.len(),
                "multi_search"
            );
            let raw = self
                .client
                .multi_search(batch)
                .map_err(|source| RuntimeError::Client {
                    collection: collection.clone(),
                    source,
                })?;
            let results = match raw.get("results") {
                Some(Json::Array(results)) if results.len() == batch.len() => results,
                _ => {
                    return Err(HydrationError::Malformed(format!(
                        "multi-search returned no `results` array of length {}",
                        batch.len()
                    ))
                    .into());
                }
            };
            for (offset, sub) in results.iter().enumerate() {
                let index = batch_index * limit + offset;
                if let Some(error) = sub.get("error") {
                    let message = error
                        .as_str()
                        .map_or_else(|| error.to_string(), str::to_owned);
                    return Err(RuntimeError::MultiSearch { index, message });
                }
                let result = SearchResult::new(sub.clone(), context.clone());
                documents.extend_from_slice(result.documents()?);
            }
        }
        if cap.is_some() {
            documents.truncate(usize::try_from(total).unwrap_or(usize::MAX));
        }
        Ok(documents)
    }
}
