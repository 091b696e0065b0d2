//! Test domain: a minimal ordered item plus store helpers.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use portfolio_sync::ordered::{Ordered, Snapshot};
use portfolio_sync::store::{DocumentStore, Fields, InMemoryDocumentStore};
use serde::Deserialize;
use serde_json::{json, Value};

pub const ITEMS: &str = "items";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: Option<u64>,
}

impl Ordered for Item {
    fn order(&self) -> Option<u64> {
        self.order
    }
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Insert one item per id with `order` equal to its position.
pub async fn seed(store: &InMemoryDocumentStore, item_ids: &[&str]) {
    for (position, id) in item_ids.iter().enumerate() {
        store
            .insert_with_id(
                ITEMS,
                id,
                fields(json!({ "title": id.to_uppercase(), "order": position })),
            )
            .await
            .unwrap();
    }
    store.clear_writes().unwrap();
}

pub async fn stored_order(store: &InMemoryDocumentStore, id: &str) -> Option<u64> {
    store.get(ITEMS, id).await.unwrap().order()
}

/// A render callback that only counts its invocations.
pub fn counting_render() -> (Arc<AtomicUsize>, impl FnMut(&Snapshot<Item>) + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    (count, move |_: &Snapshot<Item>| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Fail the test instead of hanging when an expected delivery never comes.
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out waiting for the change feed")
}
