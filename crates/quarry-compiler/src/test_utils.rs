//! Test fixtures: a small product catalogue with one complete join, one
//! incomplete join and one join into an unregistered collection.

use quarry_core::schema::AttributeType as T;
use quarry_core::{Capabilities, Config, JoinConfig, Model, Registry, ast};

use crate::{CompileCtx, CompiledParams, State, compile};

pub struct Fixture {
    pub registry: Registry,
    pub config: Config,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        let mut registry = Registry::new();
        registry.register(products());
        registry.register(brands());
        Self { registry, config }
    }

    pub fn model(&self, collection: &str) -> &Model {
        self.registry
            .get(collection)
            .map(|m| &**m)
            .unwrap_or_else(|| panic!("fixture has no `{collection}`"))
    }

    pub fn ctx(&self) -> CompileCtx<'_> {
        CompileCtx::new(self.model("products"), &self.registry, &self.config)
    }

    pub fn ctx_for(&self, collection: &str) -> CompileCtx<'_> {
        CompileCtx::new(self.model(collection), &self.registry, &self.config)
    }

    pub fn compile(&self, state: &State) -> CompiledParams {
        compile(state, self.ctx()).expect("fixture state compiles")
    }

    /// Compiled `filter_by` of a state, or an empty string.
    pub fn filter(&self, state: &State) -> String {
        self.compile(state)
            .get_str("filter_by")
            .unwrap_or_default()
            .to_owned()
    }
}

pub fn products() -> Model {
    Model::builder("products")
        .attribute("name", T::String)
        .attribute("price", T::Float)
        .attribute("brand_id", T::Int64)
        .attribute_with("tags", T::StringArray, Capabilities::EMPTY_FILTERING)
        .attribute_with("description", T::String, Capabilities::OPTIONAL)
        .attribute_with(
            "discontinued_at",
            T::Time,
            Capabilities::OPTIONAL | Capabilities::EMPTY_FILTERING,
        )
        .attribute("in_stock", T::Bool)
        .attribute("released_at", T::Time)
        .attribute("specs", T::Object)
        .join("brand", JoinConfig::new("brands", "brand_id", "id"))
        .join(
            "supplier",
            JoinConfig {
                collection: "suppliers".into(),
                local_key: Some("supplier_id".into()),
                foreign_key: None,
            },
        )
        .join("vendor", JoinConfig::new("vendors", "vendor_id", "id"))
        .scope("cheap", vec![ast::lt("price", 50.0).expect("valid")])
        .build()
}

pub fn brands() -> Model {
    Model::builder("brands")
        .attribute("name", T::String)
        .attribute("country", T::String)
        .attribute("active", T::Bool)
        .attribute_with("founded", T::Int32, Capabilities::OPTIONAL)
        .scope("active", vec![ast::eq("active", true).expect("valid")])
        .scope(
            "european",
            vec![
                ast::in_("country", ["DE", "FR"]).expect("valid"),
                ast::gte("founded", 1900).expect("valid"),
            ],
        )
        .scope("legacy", vec![ast::raw("legacy:=true").expect("valid")])
        .build()
}
