//! Errors that can occur while executing a query.

use std::error::Error as StdError;
use std::fmt;

/// A failure reported by the [`Client`](crate::Client) collaborator.
///
/// Transport, timeout and backend errors all arrive here; quarry never
/// retries them.
#[derive(Debug)]
pub struct ClientError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ClientError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Problems found while turning a raw response into documents.
///
/// Kept separate from [`RuntimeError`] so hydrated results can cache them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrationError {
    #[error("document `{id}` is missing required field `{field}`")]
    MissingField { id: String, field: String },

    #[error("search found {found} hits, more than the validated maximum of {max}")]
    HitLimitExceeded { found: u64, max: u64 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The query failed validation while chaining or compiling.
    #[error(transparent)]
    Query(#[from] quarry_core::Error),

    #[error("search on `{collection}` failed: {source}")]
    Client {
        collection: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    /// A sub-query of a batched multi-search failed.
    #[error("multi-search sub-query {index} failed: {message}")]
    MultiSearch { index: usize, message: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
