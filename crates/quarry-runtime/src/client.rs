//! The search backend boundary.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::error::ClientError;

/// Wire parameters of a single search, in compile order.
pub type Params = IndexMap<String, Json>;

/// The backend collaborator. Owns transport, timeouts and retries.
///
/// Implementations must be shareable across threads: one client serves
/// every relation spawned from a [`Session`](crate::Session).
pub trait Client: Send + Sync {
    /// Run one search against `collection` and return the raw response.
    fn search(&self, collection: &str, params: &Params) -> Result<Json, ClientError>;

    /// Run several searches in one round trip.
    ///
    /// The response is `{"results": [...]}` with one entry per search in
    /// request order. A failed entry carries an `"error"` message.
    fn multi_search(&self, searches: &[(String, Params)]) -> Result<Json, ClientError>;
}
