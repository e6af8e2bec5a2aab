use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::test_utils::{RecordingClient, catalogue, session};

#[test]
fn execute_is_memoized() {
    let client = Arc::new(RecordingClient::paged(catalogue(3)));
    let rel = session(client.clone()).relation("products").unwrap();
    assert!(!rel.is_loaded());

    let a = rel.execute().unwrap();
    let b = rel.execute().unwrap();
    rel.to_a().unwrap();
    rel.first().unwrap();
    rel.last().unwrap();
    rel.take(2).unwrap();
    rel.count().unwrap();
    rel.exists().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(rel.is_loaded());
    assert_eq!(client.searches(), 1);
}

#[test]
fn concurrent_callers_share_one_round_trip() {
    const THREADS: usize = 8;
    let client = Arc::new(RecordingClient::paged(catalogue(5)).with_delay(Duration::from_millis(20)));
    let rel = Arc::new(session(client.clone()).relation("products").unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let rel = Arc::clone(&rel);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                rel.execute().unwrap()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(client.searches(), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn chainers_spawn_unexecuted_relations() {
    let client = Arc::new(RecordingClient::paged(catalogue(3)));
    let rel = session(client.clone()).relation("products").unwrap();
    let memo = rel.execute().unwrap();

    let narrowed = rel.where_(("brand_id", 1)).unwrap();
    assert!(!narrowed.is_loaded());
    assert!(rel.state().predicates().is_empty());
    assert!(Arc::ptr_eq(&rel.execute().unwrap(), &memo));

    narrowed.execute().unwrap();
    assert_eq!(client.searches(), 2);

    let copy = rel.fresh();
    assert!(!copy.is_loaded());
    assert_eq!(copy.state(), rel.state());
}

#[test]
fn failures_are_not_memoized() {
    let client = Arc::new(RecordingClient::failing("connection refused"));
    let rel = session(client.clone()).relation("products").unwrap();

    let err = rel.execute().unwrap_err();
    assert!(matches!(err, RuntimeError::Client { ref collection, .. } if collection == "products"));
    assert_eq!(
        err.to_string(),
        "search on `products` failed: connection refused"
    );
    assert!(rel.execute().is_err());
    assert!(!rel.is_loaded());
    assert_eq!(client.searches(), 2);
}

#[test]
fn invalid_queries_never_reach_the_client() {
    let client = Arc::new(RecordingClient::paged(catalogue(3)));
    let rel = session(client.clone()).relation("products").unwrap();
    let err = rel
        .ranking(quarry_compiler::Ranking::new().weight("name", 2))
        .unwrap()
        .execute()
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Query(_)));
    assert_eq!(client.searches(), 0);
}

#[test]
fn unknown_collection() {
    let client = Arc::new(RecordingClient::paged(Vec::new()));
    let err = session(client).relation("prodcts").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported input: collection `prodcts` is not registered; did you mean products?"
    );
}
