use indoc::indoc;

use crate::ast;
use crate::schema::{AttributeType, Capabilities, JoinConfig, Model, Registry, parse_schema};

fn products() -> Model {
    Model::builder("products")
        .attribute("name", AttributeType::String)
        .attribute_with(
            "tags",
            AttributeType::StringArray,
            Capabilities::EMPTY_FILTERING | Capabilities::OPTIONAL,
        )
        .join("brand", JoinConfig::new("brands", "brand_id", "id"))
        .scope("named", vec![ast::eq("name", "x").unwrap()])
        .build()
}

#[test]
fn id_is_always_known() {
    let model = products();
    assert!(model.knows_field("id"));
    assert!(model.knows_field("name"));
    assert!(!model.knows_field("nme"));
}

#[test]
fn capability_helpers() {
    let model = products();
    let tags = model.attribute("tags").unwrap();
    assert!(tags.optional());
    assert!(tags.empty_filtering());
    assert_eq!(tags.blank_flag(), "tags_blank");
    assert_eq!(tags.empty_flag(), "tags_empty");
    assert!(!model.attribute("name").unwrap().optional());
}

#[test]
fn registry_resolves_join_targets() {
    let mut registry = Registry::new();
    let products = registry.register(products());
    registry.register(
        Model::builder("brands")
            .attribute("name", AttributeType::String)
            .build(),
    );
    let target = registry.join_target(&products, "brand").unwrap();
    assert_eq!(target.collection(), "brands");
    assert!(registry.join_target(&products, "maker").is_none());
}

#[test]
fn scopes_are_looked_up_by_name() {
    let model = products();
    assert_eq!(model.scope("named").unwrap().len(), 1);
    assert!(model.scope("missing").is_none());
    assert_eq!(model.scope_names().collect::<Vec<_>>(), ["named"]);
}

#[test]
fn parse_schema_document() {
    let json = indoc! {r#"
        {
          "collections": [
            {
              "name": "products",
              "attributes": {
                "name": "string",
                "tags": { "type": "string[]", "empty_filtering": true, "optional": true },
                "published_at": "datetime"
              },
              "joins": {
                "brand": { "collection": "brands", "local_key": "brand_id" }
              },
              "scopes": { "tagged": { "tags": ["a"] } }
            }
          ]
        }
    "#};
    let schema = parse_schema(json).unwrap();
    let raw = &schema.collections[0];
    assert_eq!(raw.scopes.len(), 1);

    let model = raw.to_model();
    assert_eq!(model.collection(), "products");
    assert_eq!(
        model.attribute_names().collect::<Vec<_>>(),
        ["name", "tags", "published_at"]
    );
    let tags = model.attribute("tags").unwrap();
    assert_eq!(tags.ty, AttributeType::StringArray);
    assert!(tags.empty_filtering());
    assert!(model.attribute("published_at").unwrap().ty.is_time());

    let join = model.join("brand").unwrap();
    assert_eq!(join.local_key.as_deref(), Some("brand_id"));
    assert_eq!(join.foreign_key, None);
}

#[test]
fn parse_schema_rejects_unknown_type() {
    let json = r#"{ "collections": [ { "name": "x", "attributes": { "a": "uuid" } } ] }"#;
    assert!(parse_schema(json).is_err());
}
