use quarry_core::Config;

use super::loader::{LoadError, load_config, load_plan, load_schema};
use super::plan::Step;
use super::test_utils::Fixtures;

#[test]
fn schema_registers_models_with_scopes() {
    let fx = Fixtures::new();
    let registry = load_schema(&fx.schema(), &Config::default()).unwrap();
    let collections: Vec<&str> = registry.collections().collect();
    assert_eq!(collections, ["products", "brands"]);

    let products = registry.get("products").unwrap();
    assert!(products.attribute("tags").unwrap().empty_filtering());
    assert!(products.attribute("description").unwrap().optional());
    assert_eq!(products.scope("cheap").map(<[_]>::len), Some(1));
    assert!(products.scope("tagged").is_some());
    assert!(products.join("brand").is_some());
}

#[test]
fn bad_scope_names_collection_and_scope() {
    let fx = Fixtures::new();
    let schema = fx.write(
        "schema.json",
        r#"{ "collections": [{ "name": "products", "attributes": { "price": "float" },
             "scopes": { "broken": { "prise": 1 } } }] }"#,
    );
    let err = load_schema(&schema, &Config::default()).unwrap_err();
    assert!(matches!(err, LoadError::Scope { ref scope, .. } if scope == "broken"));
    assert_eq!(
        err.to_string(),
        "scope `broken` on `products`: unknown field `prise` on `products`; did you mean price?"
    );
}

#[test]
fn missing_and_malformed_files() {
    let fx = Fixtures::new();
    let err = load_schema(&fx.path("nope.json"), &Config::default()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));

    let broken = fx.write("broken.json", "{ not json");
    assert!(matches!(
        load_schema(&broken, &Config::default()),
        Err(LoadError::Json { .. })
    ));

    let empty = fx.write("empty.json", r#"{ "collections": [] }"#);
    assert!(matches!(
        load_schema(&empty, &Config::default()),
        Err(LoadError::EmptySchema)
    ));
}

#[test]
fn config_file_is_optional() {
    let fx = Fixtures::new();
    let path = fx.write(
        "quarry.json",
        r#"{ "default_query_by": "name", "presets": { "namespace": "shop" } }"#,
    );
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.default_query_by.as_deref(), Some("name"));
    assert_eq!(config.presets.namespace.as_deref(), Some("shop"));
    assert!(config.presets.enabled);
    assert_eq!(config.multi_search_limit, 50);
}

#[test]
fn plans_accept_bare_arrays_and_objects() {
    let fx = Fixtures::new();
    let bare = fx.write("bare.json", r#"[{ "search": "shoe" }, { "limit": 5 }]"#);
    let plan = load_plan(&bare).unwrap();
    assert_eq!(plan.collection, None);
    assert_eq!(plan.steps.len(), 2);

    let full = fx.write(
        "full.json",
        r#"{ "collection": "brands", "steps": [{ "order": "name" }] }"#,
    );
    let plan = load_plan(&full).unwrap();
    assert_eq!(plan.collection.as_deref(), Some("brands"));
    assert!(matches!(plan.steps[0], Step::Order(ref spec) if spec == "name"));

    let unknown = fx.write("unknown.json", r#"[{ "teleport": 1 }]"#);
    assert!(matches!(load_plan(&unknown), Err(LoadError::Json { .. })));
}
