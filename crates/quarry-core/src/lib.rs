#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for quarry.
//!
//! - `value` / `sanitize`: scalar literals and safe filter fragments
//! - `ast`: the immutable predicate tree and its validating builders
//! - `schema`: attribute, join and scope metadata per collection
//! - `config`: query defaults and preset policy
//! - `error`: the validation error taxonomy shared by all crates

pub mod ast;
pub mod config;
pub mod error;
pub mod sanitize;
pub mod schema;
pub mod utils;
pub mod value;

#[cfg(test)]
mod ast_tests;
#[cfg(test)]
mod schema_tests;

pub use ast::{BoolOp, CompareOp, Field, IntoField, Node};
pub use config::{Config, InfixMode, PresetConfig, SelectionConfig};
pub use error::{Error, JoinContext, Result, SelectionHint, Suggestions};
pub use schema::{
    Attribute, AttributeType, Capabilities, JoinConfig, Model, ModelBuilder, Registry,
};
pub use value::Value;
