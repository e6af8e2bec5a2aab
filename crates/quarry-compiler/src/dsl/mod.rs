//! Caller input normalization.
//!
//! - `condition`: the shapes a `where` argument may take
//! - `parser`: turns conditions into validated AST nodes
//! - `template`: splits `?` templates into comparison clauses

mod condition;
mod parser;
mod template;


pub use condition::{Condition, Operand};
pub use parser::Parser;
