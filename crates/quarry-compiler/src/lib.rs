#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Query description and compilation for quarry.
//!
//! - `dsl` - normalizes caller conditions into AST nodes
//! - `guard` - association and field path validation
//! - `state` - the immutable query state and its chainers
//! - `compile` - deterministic state-to-parameters compilation

pub mod compile;
pub mod dsl;
pub mod guard;
pub mod state;

mod ctx;

#[cfg(test)]
pub mod test_utils;

pub use compile::{CompiledParams, compile};
pub use ctx::CompileCtx;
pub use dsl::{Condition, Operand, Parser};
pub use guard::JoinGuard;
pub use state::{
    Curation, Direction, Grouping, Highlight, Part, Preset, PresetMode, Ranking, Selection, State,
};
