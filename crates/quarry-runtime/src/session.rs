//! Entry point tying a registry, config and client together.

use std::sync::Arc;

use quarry_core::utils::suggest;
use quarry_core::{Config, Error, Registry};

use crate::client::Client;
use crate::relation::Relation;

/// Shared handles for spawning relations. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    registry: Arc<Registry>,
    config: Arc<Config>,
    client: Arc<dyn Client>,
}

impl Session {
    pub fn new(registry: Registry, config: Config, client: Arc<dyn Client>) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            client,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// An empty relation over a registered collection.
    pub fn relation(&self, collection: &str) -> quarry_core::Result<Relation> {
        let Some(model) = self.registry.get(collection) else {
            return Err(Error::UnsupportedInput(format!(
                "collection `{collection}` is not registered{}",
                suggest(collection, self.registry.collections())
            )));
        };
        Ok(Relation::new(
            Arc::clone(model),
            Arc::clone(&self.registry),
            Arc::clone(&self.config),
            Arc::clone(&self.client),
        ))
    }
}
