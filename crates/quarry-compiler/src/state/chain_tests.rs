use quarry_core::{Error, Value};

use super::{Curation, Direction, Grouping, Part, PresetMode, Ranking, State};
use crate::dsl::{Condition, Operand};
use crate::test_utils::Fixture;

#[test]
fn chainers_never_touch_the_receiver() {
    let fx = Fixture::new();
    let base = State::new().where_(fx.ctx(), ("id", 1)).unwrap();
    let snapshot = base.clone();

    let a = base.where_(fx.ctx(), ("brand_id", [2, 3])).unwrap();
    let b = base.order(fx.ctx(), "price:desc").unwrap();
    let _ = base.limit(0).unwrap_err();

    assert_eq!(base, snapshot);
    assert_eq!(a.predicates().len(), 2);
    assert_eq!(b.predicates().len(), 1);
    assert!(a.orders().is_empty());
}

#[test]
fn empty_where_is_a_noop() {
    let fx = Fixture::new();
    let state = State::new();
    let pairs: Vec<(&str, Operand)> = Vec::new();
    assert_eq!(state.where_(fx.ctx(), pairs).unwrap(), state);
}

#[test]
fn where_not_negates() {
    let fx = Fixture::new();
    let state = State::new()
        .where_not(fx.ctx(), ("id", 1))
        .unwrap()
        .where_not(fx.ctx(), ("brand_id", [1, 2]))
        .unwrap();
    assert_eq!(fx.filter(&state), "id:!=1 && brand_id:!=[1, 2]");
}

#[test]
fn rewhere_replaces_predicates_on_same_field() {
    let fx = Fixture::new();
    let state = State::new()
        .where_(fx.ctx(), ("brand_id", 1))
        .unwrap()
        .where_(fx.ctx(), ("price", 10))
        .unwrap()
        .rewhere(fx.ctx(), ("brand_id", 2))
        .unwrap();
    assert_eq!(fx.filter(&state), "price:=10 && brand_id:=2");
    assert_eq!(state.fragments(), ["price:=10", "brand_id:=2"]);
}

#[test]
fn legacy_fragments_compile_only_without_ast() {
    let fx = Fixture::new();
    let legacy = State::new()
        .filter_raw("a:=1")
        .unwrap()
        .filter_raw("b:>2")
        .unwrap();
    assert_eq!(fx.filter(&legacy), "a:=1 && b:>2");

    let mixed = legacy.where_(fx.ctx(), ("id", 3)).unwrap();
    assert_eq!(fx.filter(&mixed), "id:=3");
}

#[test]
fn named_scopes_apply_locally() {
    let fx = Fixture::new();
    let state = State::new().scope(fx.ctx(), "cheap").unwrap();
    assert_eq!(fx.filter(&state), "price:<50");
    let err = State::new().scope(fx.ctx(), "chep").unwrap_err();
    assert!(matches!(err, Error::UnknownScope { .. }));
}

#[test]
fn order_keeps_position_and_last_direction() {
    let fx = Fixture::new();
    let state = State::new()
        .order(fx.ctx(), "price:desc, name")
        .unwrap()
        .order(fx.ctx(), "price asc")
        .unwrap();
    let entries: Vec<(String, Direction)> = state
        .orders()
        .iter()
        .map(|(f, d)| (f.to_string(), *d))
        .collect();
    assert_eq!(
        entries,
        [
            ("price".to_owned(), Direction::Asc),
            ("name".to_owned(), Direction::Asc),
        ]
    );
    assert!(matches!(
        State::new().order(fx.ctx(), "price:sideways"),
        Err(Error::InvalidOption { option: "order", .. })
    ));
}

#[test]
fn joined_sort_requires_join() {
    let fx = Fixture::new();
    let err = State::new().order(fx.ctx(), "brand.name").unwrap_err();
    assert!(matches!(err, Error::JoinNotApplied { .. }));
    let state = State::new()
        .joins(fx.ctx(), ["brand"])
        .unwrap()
        .order(fx.ctx(), "brand.name:desc")
        .unwrap();
    assert_eq!(fx.compile(&state).get_str("sort_by"), Some("$brand(name:desc)"));
}

#[test]
fn joins_validate_and_keep_repeats() {
    let fx = Fixture::new();
    let state = State::new()
        .joins(fx.ctx(), ["brand", "brand"])
        .unwrap();
    assert_eq!(state.applied_joins(), ["brand", "brand"]);
    assert!(matches!(
        State::new().joins(fx.ctx(), ["supplier"]),
        Err(Error::IncompleteJoin { .. })
    ));
    assert!(matches!(
        State::new().joins(fx.ctx(), ["maker"]),
        Err(Error::UnknownAssociation { .. })
    ));
}

#[test]
fn reselect_replaces_includes() {
    let fx = Fixture::new();
    let state = State::new()
        .select(fx.ctx(), ["id", "name"])
        .unwrap()
        .reselect(fx.ctx(), ["name"])
        .unwrap();
    assert_eq!(fx.compile(&state).get_str("include_fields"), Some("name"));
}

#[test]
fn pagination_rejects_zero() {
    let state = State::new();
    for err in [
        state.limit(0).unwrap_err(),
        state.page(0).unwrap_err(),
        state.per(0).unwrap_err(),
    ] {
        assert!(matches!(err, Error::InvalidOption { .. }));
    }
    assert!(state.offset(0).is_ok());
}

#[test]
fn option_validation() {
    let fx = Fixture::new();
    let state = State::new();
    assert!(matches!(
        state.group_by(fx.ctx(), Grouping::new("brand_id").limit(100)),
        Err(Error::InvalidOption { option: "group_by", .. })
    ));
    assert!(matches!(
        state.facet_query("brand_id", "1"),
        Err(Error::InvalidOption { option: "facet_query", .. })
    ));
    assert!(matches!(
        state.ranking(Ranking::new().num_typos(3)),
        Err(Error::InvalidOption { option: "ranking", .. })
    ));
    assert!(matches!(
        state.preset("  ", PresetMode::Lock),
        Err(Error::InvalidOption { option: "preset", .. })
    ));
    assert!(matches!(
        state.curate(Curation::new().pin(["1", " "])),
        Err(Error::InvalidOption { option: "curate", .. })
    ));
}

#[test]
fn ranking_merges_field_by_field() {
    let state = State::new()
        .ranking(Ranking::new().num_typos(1).weight("name", 3))
        .unwrap()
        .ranking(Ranking::new().prioritize_exact_match(true).weight("name", 5))
        .unwrap();
    let r = state.ranking_spec();
    assert_eq!(r.num_typos, Some(1));
    assert_eq!(r.prioritize_exact_match, Some(true));
    assert_eq!(r.weights.get("name"), Some(&5));
}

#[test]
fn curation_accumulates() {
    let state = State::new()
        .pin(["a", "b"])
        .unwrap()
        .pin(["a", "c"])
        .unwrap()
        .hide(["z"])
        .unwrap();
    let pinned: Vec<&str> = state.curation().pinned.iter().map(String::as_str).collect();
    assert_eq!(pinned, ["a", "b", "c"]);
    assert_eq!(state.curation().hidden.len(), 1);
}

#[test]
fn unscope_clears_named_parts() {
    let fx = Fixture::new();
    let state = State::new()
        .where_(fx.ctx(), ("id", 1))
        .unwrap()
        .order(fx.ctx(), "price")
        .unwrap()
        .limit(5)
        .unwrap()
        .unscope(&[Part::Where, Part::Pagination])
        .unwrap();
    assert!(state.predicates().is_empty());
    assert!(state.fragments().is_empty());
    assert!(state.pagination().is_empty());
    assert_eq!(state.orders().len(), 1);
    assert_eq!(Part::parse("limit"), Some(Part::Pagination));
    assert_eq!(Part::parse("bogus"), None);
}

#[test]
fn where_accepts_json_conditions() {
    let fx = Fixture::new();
    let json = serde_json::json!({"description": null, "price": 3});
    let state = State::new()
        .where_(fx.ctx(), Condition::from_json(&json).unwrap())
        .unwrap();
    assert_eq!(fx.filter(&state), "description_blank:=true && price:=3");
    let null_only = State::new()
        .where_(fx.ctx(), ("description", Value::Null))
        .unwrap();
    assert_eq!(fx.filter(&null_only), "description_blank:=true");
}
