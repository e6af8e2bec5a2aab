//! An in-memory client that records calls and replays canned responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value as Json, json};

use quarry_core::schema::AttributeType as T;
use quarry_core::{Capabilities, Config, JoinConfig, Model, Registry, ast};

use crate::client::{Client, Params};
use crate::error::ClientError;
use crate::session::Session;

type Responder = Box<dyn Fn(&str, &Params) -> Result<Json, ClientError> + Send + Sync>;

pub struct RecordingClient {
    responder: Responder,
    delay: Option<Duration>,
    searches: AtomicUsize,
    multi_searches: AtomicUsize,
    log: Mutex<Vec<Params>>,
}

impl RecordingClient {
    pub fn new(
        responder: impl Fn(&str, &Params) -> Result<Json, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            searches: AtomicUsize::new(0),
            multi_searches: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `response`.
    pub fn canned(response: Json) -> Self {
        Self::new(move |_, _| Ok(response.clone()))
    }

    /// Answer from a fixed list of documents, honouring `page`/`per_page`.
    pub fn paged(docs: Vec<Json>) -> Self {
        Self::new(move |_, params| {
            let int = |key: &str, default: u64| {
                params.get(key).and_then(Json::as_u64).unwrap_or(default) as usize
            };
            let per_page = int("per_page", 10);
            let start = (int("page", 1) - 1) * per_page;
            let hits: Vec<Json> = docs
                .iter()
                .skip(start)
                .take(per_page)
                .map(|d| json!({ "document": d }))
                .collect();
            Ok(json!({ "found": docs.len(), "out_of": docs.len(), "hits": hits }))
        })
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_owned();
        Self::new(move |_, _| Err(ClientError::new(message.clone())))
    }

    /// Sleep inside every search, widening race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn multi_searches(&self) -> usize {
        self.multi_searches.load(Ordering::SeqCst)
    }

    /// Parameters of every search, multi-search entries included.
    pub fn requests(&self) -> Vec<Params> {
        self.log.lock().expect("log lock").clone()
    }

    fn answer(&self, collection: &str, params: &Params) -> Result<Json, ClientError> {
        self.log.lock().expect("log lock").push(params.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        (self.responder)(collection, params)
    }
}

impl Client for RecordingClient {
    fn search(&self, collection: &str, params: &Params) -> Result<Json, ClientError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.answer(collection, params)
    }

    fn multi_search(&self, searches: &[(String, Params)]) -> Result<Json, ClientError> {
        self.multi_searches.fetch_add(1, Ordering::SeqCst);
        let results = searches
            .iter()
            .map(|(collection, params)| match self.answer(collection, params) {
                Ok(json) => json,
                Err(err) => json!({ "error": err.message() }),
            })
            .collect::<Vec<_>>();
        Ok(json!({ "results": results }))
    }
}

pub fn products() -> Model {
    Model::builder("products")
        .attribute("name", T::String)
        .attribute("price", T::Float)
        .attribute("brand_id", T::Int64)
        .attribute_with("description", T::String, Capabilities::OPTIONAL)
        .join("brand", JoinConfig::new("brands", "brand_id", "id"))
        .scope("cheap", vec![ast::lt("price", 50.0).expect("valid")])
        .build()
}

pub fn brands() -> Model {
    Model::builder("brands")
        .attribute("name", T::String)
        .attribute("country", T::String)
        .build()
}

pub fn session(client: Arc<RecordingClient>) -> Session {
    session_with(client, Config::default())
}

pub fn session_with(client: Arc<RecordingClient>, config: Config) -> Session {
    let mut registry = Registry::new();
    registry.register(products());
    registry.register(brands());
    Session::new(registry, config, client)
}

/// `n` product documents with ids `p1..pn`.
pub fn catalogue(n: usize) -> Vec<Json> {
    (1..=n)
        .map(|i| json!({ "id": format!("p{i}"), "name": format!("Product {i}"), "price": i }))
        .collect()
}
