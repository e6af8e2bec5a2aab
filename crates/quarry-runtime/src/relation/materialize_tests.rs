use std::sync::Arc;

use serde_json::json;

use quarry_compiler::Curation;
use quarry_core::{Config, Error, SelectionHint};

use crate::error::{HydrationError, RuntimeError};
use crate::test_utils::{RecordingClient, catalogue, session, session_with};

fn joined_response() -> serde_json::Value {
    json!({
        "found": 2,
        "hits": [
            { "document": { "id": "p1", "name": "Runner", "brand": { "name": "Acme" } } },
            { "document": { "id": "p2", "name": "Walker", "brand": { "name": "Bolt" } } }
        ]
    })
}

#[test]
fn materializers_read_the_memo() {
    let client = Arc::new(RecordingClient::paged(catalogue(4)));
    let rel = session(client.clone()).relation("products").unwrap();

    let names: Vec<String> = rel
        .to_a()
        .unwrap()
        .iter()
        .filter_map(|d| d.get("name")?.as_str().map(String::from))
        .collect();
    assert_eq!(names, ["Product 1", "Product 2", "Product 3", "Product 4"]);

    assert_eq!(rel.first().unwrap().and_then(|d| d.id()).as_deref(), Some("p1"));
    assert_eq!(rel.last().unwrap().and_then(|d| d.id()).as_deref(), Some("p4"));
    assert_eq!(rel.take(2).unwrap().len(), 2);
    assert_eq!(rel.take(10).unwrap().len(), 4);

    let mut seen = 0;
    rel.each(|_| seen += 1).unwrap();
    assert_eq!(seen, 4);
    assert_eq!(client.searches(), 1);
}

#[test]
fn count_probes_with_minimized_params() {
    let client = Arc::new(RecordingClient::paged(catalogue(7)));
    let rel = session(client.clone())
        .relation("products")
        .unwrap()
        .exclude(["description"])
        .unwrap()
        .page(3)
        .unwrap()
        .facet_by("brand_id", Some(5))
        .unwrap();

    assert_eq!(rel.count().unwrap(), 7);
    assert!(rel.exists().unwrap());
    assert_eq!(client.searches(), 1);
    assert!(!rel.is_loaded());

    let probe = &client.requests()[0];
    let keys: Vec<&str> = probe.keys().map(String::as_str).collect();
    assert_eq!(keys, ["q", "page", "per_page", "include_fields"]);
    assert_eq!(probe["per_page"], json!(1));
    assert_eq!(probe["include_fields"], json!("id"));
}

#[test]
fn count_with_curated_filtering_materializes() {
    let client = Arc::new(RecordingClient::canned(json!({
        "found": 10,
        "hits": [{ "document": { "id": "a" } }, { "document": { "id": "b" } }]
    })));
    let rel = session(client.clone())
        .relation("products")
        .unwrap()
        .curate(Curation::new().pin(["a"]).filter_curated_hits(true))
        .unwrap();
    assert_eq!(rel.count().unwrap(), 2);
    assert!(rel.is_loaded());
    assert_eq!(client.searches(), 1);
}

#[test]
fn exists_on_empty_results() {
    let client = Arc::new(RecordingClient::paged(Vec::new()));
    let rel = session(client).relation("products").unwrap();
    assert!(!rel.exists().unwrap());
}

#[test]
fn pluck_reads_selected_fields() {
    let client = Arc::new(RecordingClient::canned(joined_response()));
    let rel = session(client.clone())
        .relation("products")
        .unwrap()
        .joins(["brand"])
        .unwrap()
        .select(["id", "name", "brand.name"])
        .unwrap();

    assert_eq!(rel.pluck(["name"]).unwrap(), [json!("Runner"), json!("Walker")]);
    assert_eq!(
        rel.pluck(["id", "brand.name"]).unwrap(),
        [json!(["p1", "Acme"]), json!(["p2", "Bolt"])]
    );
    assert_eq!(rel.ids().unwrap(), ["p1", "p2"]);
    assert_eq!(client.searches(), 1);
}

#[test]
fn pluck_outside_selection_makes_no_call() {
    let client = Arc::new(RecordingClient::canned(joined_response()));
    let rel = session(client.clone())
        .relation("products")
        .unwrap()
        .select(["name"])
        .unwrap();

    let err = rel.pluck(["price"]).unwrap_err();
    let RuntimeError::Query(Error::SelectionConflict { field, hint }) = err else {
        panic!("unexpected {err:?}");
    };
    assert_eq!(field, "price");
    assert_eq!(hint, SelectionHint::Reselect(vec!["name".into(), "price".into()]));

    let err = rel.ids().unwrap_err();
    assert_eq!(
        err.to_string(),
        "field `id` is outside the effective selection; use reselect(name, id)"
    );
    assert_eq!(client.searches(), 0);
}

#[test]
fn pluck_excluded_field_suggests_removing_exclude() {
    let client = Arc::new(RecordingClient::canned(joined_response()));
    let rel = session(client.clone())
        .relation("products")
        .unwrap()
        .exclude(["price"])
        .unwrap();
    let err = rel.pluck(["price"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "field `price` is outside the effective selection; remove exclude(price)"
    );
    assert!(rel.pluck(["name"]).is_ok());
    assert!(matches!(
        rel.pluck(Vec::<&str>::new()),
        Err(RuntimeError::Query(Error::InvalidArgument(_)))
    ));
    assert_eq!(client.searches(), 1);
}

#[test]
fn peek_uses_preview_cache_only() {
    let client = Arc::new(RecordingClient::paged(catalogue(20)));
    let rel = session(client.clone()).relation("products").unwrap();

    assert_eq!(rel.peek(3).unwrap().len(), 3);
    assert_eq!(rel.peek(2).unwrap().len(), 2);
    assert_eq!(client.searches(), 1);
    assert!(!rel.is_loaded());
    assert_eq!(client.requests()[0]["per_page"], json!(3));

    assert_eq!(rel.to_a().unwrap().len(), 10);
    assert_eq!(client.searches(), 2);
    rel.peek(5).unwrap();
    assert_eq!(client.searches(), 2);
}

#[test]
fn strict_missing_fields_fail_on_materialize() {
    let client = Arc::new(RecordingClient::canned(json!({
        "found": 1,
        "hits": [{ "document": { "id": "p1" } }]
    })));
    let session = session_with(client, Config::default().strict_missing(true));
    let rel = session
        .relation("products")
        .unwrap()
        .select(["id", "name", "description"])
        .unwrap();

    assert!(rel.explain().is_ok());
    let err = rel.to_a().unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Hydration(HydrationError::MissingField { ref id, ref field })
            if id == "p1" && field == "name"
    ));
}

#[test]
fn validated_hit_limit() {
    let client = Arc::new(RecordingClient::paged(catalogue(6)));
    let rel = session(client)
        .relation("products")
        .unwrap()
        .validate_hits(5)
        .unwrap();
    assert!(matches!(
        rel.first(),
        Err(RuntimeError::Hydration(HydrationError::HitLimitExceeded { found: 6, max: 5 }))
    ));
    assert_eq!(rel.count().unwrap(), 6);
}

#[test]
fn explain_and_to_params() {
    let client = Arc::new(RecordingClient::paged(Vec::new()));
    let rel = session_with(client.clone(), Config::default().strict_missing(true))
        .relation("products")
        .unwrap()
        .scope("cheap")
        .unwrap()
        .limit_hits(3)
        .unwrap();
    insta::assert_snapshot!(rel.explain().unwrap().dump(), @r#"
    q=*
    filter_by=price:<50
    per_page=3
    _hits={"early_limit":3}
    _runtime_flags={"strict_missing":true}
    "#);
    let wire = rel.to_params().unwrap();
    let keys: Vec<&str> = wire.keys().map(String::as_str).collect();
    assert_eq!(keys, ["q", "filter_by", "per_page"]);
    assert_eq!(client.searches(), 0);
}
