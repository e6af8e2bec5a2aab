//! Search results and hydrated documents.
//!
//! A [`SearchResult`] is created once per backend response and frozen
//! afterwards. Documents are hydrated on first access and cached, including
//! a hydration failure.

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json};

use crate::error::HydrationError;

/// Checks applied to every hit while hydrating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationContext {
    /// Fields each document must carry. Empty unless strict missing-field
    /// checking is on and an include list exists.
    pub required: Vec<String>,
    /// Fail when the backend reports more hits than this.
    pub validate_max: Option<u64>,
}

/// One hydrated hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Json>,
    highlight: Option<Json>,
}

impl Document {
    pub fn new(fields: Map<String, Json>) -> Self {
        Self {
            fields,
            highlight: None,
        }
    }

    /// The backend document id, rendered as a string.
    pub fn id(&self) -> Option<String> {
        self.fields.get("id").map(|id| match id {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Look up a field by dotted path. `brand.name` reads the joined
    /// `brand` object.
    pub fn get(&self, path: &str) -> Option<&Json> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }
        let (head, rest) = path.split_once('.')?;
        let mut current = self.fields.get(head)?;
        for segment in rest.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn fields(&self) -> &Map<String, Json> {
        &self.fields
    }

    /// The hit's `highlight` block, when the backend returned one.
    pub fn highlight(&self) -> Option<&Json> {
        self.highlight.as_ref()
    }

    /// Decode the document into a caller type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(Json::Object(self.fields.clone()))
    }
}

/// A group of hits sharing the `group_by` key.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<Json>,
    pub found: u64,
    pub documents: Vec<Document>,
}

/// Raw backend response plus lazily hydrated documents.
#[derive(Debug)]
pub struct SearchResult {
    raw: Json,
    context: HydrationContext,
    documents: OnceLock<Result<Vec<Document>, HydrationError>>,
}

impl SearchResult {
    pub fn new(raw: Json, context: HydrationContext) -> Self {
        Self {
            raw,
            context,
            documents: OnceLock::new(),
        }
    }

    pub fn raw(&self) -> &Json {
        &self.raw
    }

    fn count(&self, key: &str) -> u64 {
        self.raw.get(key).and_then(Json::as_u64).unwrap_or(0)
    }

    /// Total number of matching documents reported by the backend.
    pub fn found(&self) -> u64 {
        self.count("found")
    }

    /// Number of documents in the collection.
    pub fn out_of(&self) -> u64 {
        self.count("out_of")
    }

    pub fn search_time_ms(&self) -> Option<u64> {
        self.raw.get("search_time_ms").and_then(Json::as_u64)
    }

    /// Hydrated hits in backend order.
    pub fn documents(&self) -> Result<&[Document], HydrationError> {
        self.documents
            .get_or_init(|| self.hydrate())
            .as_deref()
            .map_err(Clone::clone)
    }

    fn hydrate(&self) -> Result<Vec<Document>, HydrationError> {
        if let Some(max) = self.context.validate_max {
            let found = self.found();
            if found > max {
                return Err(HydrationError::HitLimitExceeded { found, max });
            }
        }
        match self.raw.get("hits") {
            None | Some(Json::Null) => Ok(Vec::new()),
            Some(Json::Array(hits)) => hits.iter().map(|h| self.hydrate_hit(h)).collect(),
            Some(_) => Err(HydrationError::Malformed("`hits` is not an array".into())),
        }
    }

    fn hydrate_hit(&self, hit: &Json) -> Result<Document, HydrationError> {
        let Some(Json::Object(fields)) = hit.get("document") else {
            return Err(HydrationError::Malformed("hit without a `document` object".into()));
        };
        let document = Document {
            fields: fields.clone(),
            highlight: hit.get("highlight").cloned(),
        };
        if let Some(field) = self
            .context
            .required
            .iter()
            .find(|f| document.get(f).is_none())
        {
            return Err(HydrationError::MissingField {
                id: document.id().unwrap_or_else(|| "?".to_owned()),
                field: field.clone(),
            });
        }
        Ok(document)
    }

    /// Value counts for one faceted field, in backend order.
    pub fn facet_counts(&self, field: &str) -> Option<IndexMap<String, u64>> {
        self.facet_entries()
            .find(|entry| entry.get("field_name").and_then(Json::as_str) == Some(field))
            .map(counts_of)
    }

    /// Value counts for every faceted field.
    pub fn facets(&self) -> IndexMap<String, IndexMap<String, u64>> {
        self.facet_entries()
            .filter_map(|entry| {
                let name = entry.get("field_name")?.as_str()?;
                Some((name.to_owned(), counts_of(entry)))
            })
            .collect()
    }

    fn facet_entries(&self) -> impl Iterator<Item = &Json> {
        self.raw
            .get("facet_counts")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
    }

    /// Grouped hits for `group_by` queries. Empty for ungrouped responses.
    pub fn groups(&self) -> Result<Vec<Group>, HydrationError> {
        let Some(groups) = self.raw.get("grouped_hits").and_then(Json::as_array) else {
            return Ok(Vec::new());
        };
        groups
            .iter()
            .map(|group| {
                let key = group
                    .get("group_key")
                    .and_then(Json::as_array)
                    .cloned()
                    .unwrap_or_default();
                let documents = group
                    .get("hits")
                    .and_then(Json::as_array)
                    .into_iter()
                    .flatten()
                    .map(|h| self.hydrate_hit(h))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Group {
                    key,
                    found: group.get("found").and_then(Json::as_u64).unwrap_or(0),
                    documents,
                })
            })
            .collect()
    }
}

fn counts_of(entry: &Json) -> IndexMap<String, u64> {
    entry
        .get("counts")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
        .filter_map(|c| {
            let value = match c.get("value")? {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((value, c.get("count")?.as_u64()?))
        })
        .collect()
}
