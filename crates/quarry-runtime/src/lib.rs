#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Query execution for quarry.
//!
//! - `client` - the backend collaborator trait
//! - `session` - shared registry, config and client
//! - `relation` - query objects with single-flight execution and materializers
//! - `result` - raw responses and hydrated documents

pub mod client;
pub mod error;
pub mod relation;
pub mod result;
pub mod session;

#[cfg(test)]
pub mod test_utils;

pub use client::{Client, Params};
pub use error::{ClientError, HydrationError, Result, RuntimeError};
pub use relation::Relation;
pub use result::{Document, Group, HydrationContext, SearchResult};
pub use session::Session;
