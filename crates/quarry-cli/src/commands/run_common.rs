//! Shared loading and compiling for compile and check.

use std::path::Path;

use quarry_compiler::{CompileCtx, CompiledParams, compile};
use quarry_core::utils::suggest;
use quarry_core::{Config, Error, Registry};

use super::loader::{LoadError, load_config, load_plan, load_schema};
use super::plan::Plan;

/// Everything a command needs, loaded from disk.
pub struct Workspace {
    pub registry: Registry,
    pub config: Config,
    pub plan: Plan,
    pub collection: String,
}

impl Workspace {
    pub fn load(
        schema_path: &Path,
        plan_path: &Path,
        config_path: Option<&Path>,
        collection: Option<&str>,
    ) -> Result<Self, LoadError> {
        let config = load_config(config_path)?;
        let registry = load_schema(schema_path, &config)?;
        let plan = load_plan(plan_path)?;
        let collection = collection
            .map(str::to_owned)
            .or_else(|| plan.collection.clone())
            .ok_or(LoadError::NoCollection)?;
        Ok(Self {
            registry,
            config,
            plan,
            collection,
        })
    }

    pub fn ctx(&self) -> Result<CompileCtx<'_>, LoadError> {
        let Some(model) = self.registry.get(&self.collection) else {
            return Err(Error::UnsupportedInput(format!(
                "collection `{}` is not in the schema{}",
                self.collection,
                suggest(&self.collection, self.registry.collections())
            ))
            .into());
        };
        Ok(CompileCtx::new(model, &self.registry, &self.config))
    }

    pub fn compile(&self) -> Result<CompiledParams, LoadError> {
        let ctx = self.ctx()?;
        let state = self.plan.build(ctx)?;
        Ok(compile(&state, ctx)?)
    }
}
