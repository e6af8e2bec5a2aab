//! Loading schema, config and plan documents from disk.

use std::fs;
use std::path::{Path, PathBuf};

use quarry_compiler::{CompileCtx, Condition, Parser};
use quarry_core::schema::parse_schema;
use quarry_core::{Config, Registry};
use tracing::debug;

use super::plan::Plan;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema declares no collections")]
    EmptySchema,

    #[error("scope `{scope}` on `{collection}`: {source}")]
    Scope {
        collection: String,
        scope: String,
        #[source]
        source: quarry_core::Error,
    },

    #[error("plan step {index} (`{step}`): {source}")]
    Step {
        index: usize,
        step: &'static str,
        #[source]
        source: quarry_core::Error,
    },

    #[error("no collection given: pass --collection or set `collection` in the plan")]
    NoCollection,

    #[error(transparent)]
    Query(#[from] quarry_core::Error),

    #[error("failed to render output: {0}")]
    Render(#[source] serde_json::Error),
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> LoadError {
    move |source| LoadError::Json {
        path: path.to_owned(),
        source,
    }
}

/// Build a registry from a schema document.
///
/// Models are registered first so scopes can be parsed against the full
/// registry, then each model is re-registered with its scopes attached.
pub fn load_schema(path: &Path, config: &Config) -> Result<Registry, LoadError> {
    let schema = parse_schema(&read(path)?).map_err(json_error(path))?;
    if schema.collections.is_empty() {
        return Err(LoadError::EmptySchema);
    }

    let mut registry = Registry::new();
    for raw in &schema.collections {
        registry.register(raw.to_model());
    }

    let mut scoped = Vec::new();
    for raw in schema.collections.iter().filter(|c| !c.scopes.is_empty()) {
        let mut model = raw.to_model();
        for (name, json) in &raw.scopes {
            let scope_error = |source| LoadError::Scope {
                collection: raw.name.clone(),
                scope: name.clone(),
                source,
            };
            let condition = Condition::from_json(json).map_err(scope_error)?;
            let ctx = CompileCtx::new(&model, &registry, config);
            let nodes = Parser::new(ctx, &[])
                .parse(&condition, false)
                .map_err(scope_error)?;
            model = model.with_scope(name.clone(), nodes);
        }
        scoped.push(model);
    }
    for model in scoped {
        registry.register(model);
    }
    debug!(
        target: "quarry::config",
        path = %path.display(),
        collections = schema.collections.len(),
        "schema loaded"
    );
    Ok(registry)
}

/// Config from an optional file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, LoadError> {
    let config = match path {
        Some(path) => Config::from_json(&read(path)?).map_err(json_error(path))?,
        None => Config::default(),
    };
    Ok(config.with_env_overrides())
}

pub fn load_plan(path: &Path) -> Result<Plan, LoadError> {
    serde_json::from_str(&read(path)?).map_err(json_error(path))
}
