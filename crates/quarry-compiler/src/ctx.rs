//! Read-only context shared by chainers and the compiler.

use quarry_core::{Config, Model, Registry};

/// Target model plus the registry and defaults it is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct CompileCtx<'a> {
    pub model: &'a Model,
    pub registry: &'a Registry,
    pub config: &'a Config,
}

impl<'a> CompileCtx<'a> {
    pub fn new(model: &'a Model, registry: &'a Registry, config: &'a Config) -> Self {
        Self {
            model,
            registry,
            config,
        }
    }

    pub fn collection(&self) -> &'a str {
        self.model.collection()
    }
}
