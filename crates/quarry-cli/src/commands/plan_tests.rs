use indoc::indoc;

use super::check::{CheckArgs, check};
use super::compile::{CompileArgs, OutputFormat, render};
use super::loader::LoadError;
use super::test_utils::Fixtures;

const PLAN: &str = indoc! {r#"
    {
      "collection": "products",
      "steps": [
        { "search": "runner" },
        { "query_by": ["name", "description"] },
        { "joins": ["brand"] },
        { "where": { "brand_id": [1, 2], "brand": { "country": "DE" } } },
        { "not": { "tags": [] } },
        { "scope": "cheap" },
        { "order": "price:desc" },
        { "select": ["id", "name", "brand.name"] },
        { "facet_by": { "field": "brand_id", "max_values": 10 } },
        { "page": 2 },
        { "per": 20 },
        { "limit_hits": 10 }
      ]
    }
"#};

fn args(fx: &Fixtures, plan: &str) -> CompileArgs {
    CompileArgs {
        schema_path: fx.schema(),
        plan_path: fx.write("plan.json", plan),
        config_path: None,
        collection: None,
        diagnostics: false,
        format: OutputFormat::Dump,
    }
}

#[test]
fn compile_dump_with_diagnostics() {
    let fx = Fixtures::new();
    let out = render(&CompileArgs {
        diagnostics: true,
        ..args(&fx, PLAN)
    })
    .unwrap();
    insta::assert_snapshot!(out, @r#"
    q=runner
    query_by=name,description
    filter_by=brand_id:=[1, 2] && $brand(country:="DE") && tags_empty:=false && price:<50
    sort_by=price:desc
    include_fields=$brand(name),id,name
    facet_by=brand_id
    max_facet_values=10
    page=2
    per_page=10
    _hits={"early_limit":10}
    _join={"assocs":["brand"],"include":["brand"],"filter":["brand"],"sort":[]}
    "#);
}

#[test]
fn compile_json_strips_diagnostics() {
    let fx = Fixtures::new();
    let plan = r#"[{ "limit_hits": 3 }, { "order": "name" }]"#;
    let out = render(&CompileArgs {
        collection: Some("brands".into()),
        format: OutputFormat::Json,
        ..args(&fx, plan)
    })
    .unwrap();
    insta::assert_snapshot!(out, @r#"
    {
      "q": "*",
      "sort_by": "name:asc",
      "per_page": 3
    }
    "#);
}

#[test]
fn presets_and_ranking_steps() {
    let fx = Fixtures::new();
    let plan = indoc! {r#"
        [
          { "query_by": ["name"] },
          { "ranking": { "num_typos": 1, "weights": { "name": 3 } } },
          { "highlight": { "fields": ["name"], "start_tag": "<b>", "end_tag": "</b>" } },
          { "curate": { "pin": ["p9"], "filter_curated_hits": true } },
          { "group_by": { "field": "brand_id", "limit": 2 } },
          { "infix": "fallback" },
          { "use_synonyms": false },
          { "preset": { "name": "listing", "mode": "only" } }
        ]
    "#};
    let out = render(&CompileArgs {
        collection: Some("products".into()),
        ..args(&fx, plan)
    })
    .unwrap();
    insta::assert_snapshot!(out, @r"
    q=*
    preset=listing
    ");
}

#[test]
fn unscope_step() {
    let fx = Fixtures::new();
    let plan = r#"[{ "where": { "price": 3 } }, { "limit": 5 }, { "unscope": ["where", "limit"] }]"#;
    let out = render(&CompileArgs {
        collection: Some("products".into()),
        ..args(&fx, plan)
    })
    .unwrap();
    assert_eq!(out, "q=*");

    let bad = r#"[{ "unscope": ["everything"] }]"#;
    let err = render(&CompileArgs {
        collection: Some("products".into()),
        ..args(&fx, bad)
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "plan step 0 (`unscope`): invalid unscope option: unknown part `everything`"
    );
}

#[test]
fn failing_step_is_located() {
    let fx = Fixtures::new();
    let plan = r#"[{ "search": "x" }, { "order": "brand.name" }]"#;
    let err = render(&CompileArgs {
        collection: Some("products".into()),
        ..args(&fx, plan)
    })
    .unwrap_err();
    assert!(matches!(err, LoadError::Step { index: 1, step: "order", .. }));
    assert_eq!(
        err.to_string(),
        "plan step 1 (`order`): association `brand` used in order before joins(:brand)"
    );
}

#[test]
fn collection_resolution() {
    let fx = Fixtures::new();
    let plan = r#"[{ "search": "x" }]"#;
    let err = render(&args(&fx, plan)).unwrap_err();
    assert!(matches!(err, LoadError::NoCollection));

    let err = render(&CompileArgs {
        collection: Some("prodcts".into()),
        ..args(&fx, plan)
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported input: collection `prodcts` is not in the schema; did you mean products?"
    );
}

#[test]
fn check_is_silent_on_success() {
    let fx = Fixtures::new();
    let ok = CheckArgs {
        schema_path: fx.schema(),
        plan_path: fx.write("plan.json", PLAN),
        config_path: None,
        collection: None,
    };
    assert!(check(&ok).is_ok());

    let weights = r#"[{ "ranking": { "weights": { "name": 2 } } }]"#;
    let bad = CheckArgs {
        plan_path: fx.write("bad.json", weights),
        collection: Some("products".into()),
        ..ok
    };
    assert!(matches!(check(&bad), Err(LoadError::Query(_))));
}
