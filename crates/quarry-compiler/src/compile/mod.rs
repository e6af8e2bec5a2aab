//! Deterministic state-to-parameters compilation.
//!
//! # Module Organization
//!
//! - `compiler`: the fixed stage pipeline producing a [`CompiledParams`]
//! - `filter`: `filter_by` rendering of AST nodes
//! - `params`: the ordered parameter map and its wire/diagnostic views
//! - `preset`: merge/only/lock application

mod compiler;
pub mod filter;
mod params;
mod preset;


pub use compiler::compile;
pub use params::{CompiledParams, DIAGNOSTIC_PREFIX, is_diagnostic};
pub use preset::ESSENTIAL_KEYS;
