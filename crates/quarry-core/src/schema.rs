//! Collection metadata consumed by the DSL parser, join guard and compiler.
//!
//! Two layers:
//! - **Deserialization layer**: 1:1 mapping to a schema JSON document
//! - **Lookup layer**: [`Model`] and [`Registry`], read-only after registration

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ast::Node;

// ============================================================================
// Attribute metadata
// ============================================================================

/// Declared backend type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int32[]")]
    Int32Array,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "int64[]")]
    Int64Array,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "float[]")]
    FloatArray,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "bool[]")]
    BoolArray,
    #[serde(rename = "datetime")]
    Time,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "object[]")]
    ObjectArray,
    #[serde(rename = "auto")]
    Auto,
}

impl AttributeType {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            AttributeType::StringArray
                | AttributeType::Int32Array
                | AttributeType::Int64Array
                | AttributeType::FloatArray
                | AttributeType::BoolArray
                | AttributeType::ObjectArray
        )
    }

    pub fn is_bool(self) -> bool {
        matches!(self, AttributeType::Bool | AttributeType::BoolArray)
    }

    pub fn is_time(self) -> bool {
        matches!(self, AttributeType::Time)
    }
}

bitflags::bitflags! {
    /// Per-attribute capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Attribute may be absent; nil predicates use a `<name>_blank` flag.
        const OPTIONAL = 1 << 0;
        /// Empty arrays are indexed through a `<name>_empty` flag.
        const EMPTY_FILTERING = 1 << 1;
        const FACET = 1 << 2;
        const SORT = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: AttributeType,
    pub caps: Capabilities,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            caps: Capabilities::empty(),
        }
    }

    pub fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps |= caps;
        self
    }

    pub fn optional(&self) -> bool {
        self.caps.contains(Capabilities::OPTIONAL)
    }

    pub fn empty_filtering(&self) -> bool {
        self.caps.contains(Capabilities::EMPTY_FILTERING)
    }

    /// Synthetic flag field for absent values.
    pub fn blank_flag(&self) -> String {
        format!("{}_blank", self.name)
    }

    /// Synthetic flag field for empty arrays.
    pub fn empty_flag(&self) -> String {
        format!("{}_empty", self.name)
    }
}

/// Association from a source collection to a target collection.
///
/// Keys are optional so that incomplete declarations can be loaded and then
/// rejected with a precise error by the join guard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinConfig {
    pub collection: String,
    #[serde(default)]
    pub local_key: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<String>,
}

impl JoinConfig {
    pub fn new(
        collection: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            local_key: Some(local_key.into()),
            foreign_key: Some(foreign_key.into()),
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// Field name every document carries regardless of declared attributes.
pub const ID_FIELD: &str = "id";

/// Read-only descriptor of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    collection: String,
    attributes: IndexMap<String, Attribute>,
    joins: IndexMap<String, JoinConfig>,
    scopes: IndexMap<String, Vec<Node>>,
}

impl Model {
    pub fn builder(collection: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            model: Model {
                collection: collection.into(),
                attributes: IndexMap::new(),
                joins: IndexMap::new(),
                scopes: IndexMap::new(),
            },
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether attribute metadata is available for validation at all.
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// `id` is always known; otherwise the name must be declared.
    pub fn knows_field(&self, name: &str) -> bool {
        name == ID_FIELD || self.attributes.contains_key(name)
    }

    pub fn join(&self, assoc: &str) -> Option<&JoinConfig> {
        self.joins.get(assoc)
    }

    pub fn join_names(&self) -> impl Iterator<Item = &str> {
        self.joins.keys().map(String::as_str)
    }

    pub fn scope(&self, name: &str) -> Option<&[Node]> {
        self.scopes.get(name).map(Vec::as_slice)
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Copy of this model with one more named scope.
    pub fn with_scope(mut self, name: impl Into<String>, predicates: Vec<Node>) -> Self {
        self.scopes.insert(name.into(), predicates);
        self
    }
}

/// Builder for [`Model`].
#[derive(Debug)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    pub fn attribute(self, name: impl Into<String>, ty: AttributeType) -> Self {
        self.attribute_with(name, ty, Capabilities::empty())
    }

    pub fn attribute_with(
        mut self,
        name: impl Into<String>,
        ty: AttributeType,
        caps: Capabilities,
    ) -> Self {
        let attr = Attribute::new(name, ty).with_caps(caps);
        self.model.attributes.insert(attr.name.clone(), attr);
        self
    }

    pub fn join(mut self, assoc: impl Into<String>, config: JoinConfig) -> Self {
        self.model.joins.insert(assoc.into(), config);
        self
    }

    pub fn scope(mut self, name: impl Into<String>, predicates: Vec<Node>) -> Self {
        self.model.scopes.insert(name.into(), predicates);
        self
    }

    pub fn build(self) -> Model {
        self.model
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Collection name → model. Populated once, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: IndexMap<String, Arc<Model>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: Model) -> Arc<Model> {
        let model = Arc::new(model);
        self.models
            .insert(model.collection().to_owned(), Arc::clone(&model));
        model
    }

    pub fn get(&self, collection: &str) -> Option<&Arc<Model>> {
        self.models.get(collection)
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Model behind `assoc` on `source`, if both are known.
    pub fn join_target(&self, source: &Model, assoc: &str) -> Option<&Arc<Model>> {
        source.join(assoc).and_then(|j| self.get(&j.collection))
    }
}

// ============================================================================
// Deserialization Layer
// ============================================================================

/// Top-level schema document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSchema {
    pub collections: Vec<RawCollection>,
}

/// One collection as written in the schema document.
///
/// Scopes stay as raw JSON conditions; turning them into predicates needs the
/// DSL parser, which lives above this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCollection {
    pub name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, RawAttribute>,
    #[serde(default)]
    pub joins: IndexMap<String, JoinConfig>,
    #[serde(default)]
    pub scopes: IndexMap<String, serde_json::Value>,
}

/// Attribute shorthand (`"string"`) or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAttribute {
    Type(AttributeType),
    Full {
        #[serde(rename = "type")]
        ty: AttributeType,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        empty_filtering: bool,
        #[serde(default)]
        facet: bool,
        #[serde(default)]
        sort: bool,
    },
}

impl RawAttribute {
    fn into_parts(self) -> (AttributeType, Capabilities) {
        match self {
            RawAttribute::Type(ty) => (ty, Capabilities::empty()),
            RawAttribute::Full {
                ty,
                optional,
                empty_filtering,
                facet,
                sort,
            } => {
                let mut caps = Capabilities::empty();
                caps.set(Capabilities::OPTIONAL, optional);
                caps.set(Capabilities::EMPTY_FILTERING, empty_filtering);
                caps.set(Capabilities::FACET, facet);
                caps.set(Capabilities::SORT, sort);
                (ty, caps)
            }
        }
    }
}

impl RawCollection {
    /// Model with attributes and joins; scopes are attached separately.
    pub fn to_model(&self) -> Model {
        let mut builder = Model::builder(self.name.clone());
        for (name, raw) in &self.attributes {
            let (ty, caps) = raw.clone().into_parts();
            builder = builder.attribute_with(name.clone(), ty, caps);
        }
        for (assoc, config) in &self.joins {
            builder = builder.join(assoc.clone(), config.clone());
        }
        builder.build()
    }
}

/// Parse schema JSON content into raw collections.
pub fn parse_schema(json: &str) -> Result<RawSchema, serde_json::Error> {
    serde_json::from_str(json)
}
