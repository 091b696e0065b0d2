//! The observable guarantees of reorder + subscribe.

use std::sync::Arc;
use std::time::Duration;

use portfolio_sync::ordered::{CollectionRef, OrderedCollectionSync, SubscriptionManager, SyncError};
use portfolio_sync::store::{DocumentStore, InMemoryDocumentStore, StoreError};
use serde_json::json;

use crate::support::{
    count, counting_render, fields, ids, seed, stored_order, within, Item, ITEMS,
};

fn setup() -> (
    Arc<InMemoryDocumentStore>,
    OrderedCollectionSync<InMemoryDocumentStore>,
    SubscriptionManager<InMemoryDocumentStore>,
) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let sync = OrderedCollectionSync::new(Arc::clone(&store), CollectionRef::documents(ITEMS));
    let manager = SubscriptionManager::new(Arc::clone(&store));
    (store, sync, manager)
}

#[tokio::test]
async fn reorder_round_trip() {
    let (store, sync, mut manager) = setup();
    seed(&store, &["a", "b", "c"]).await;
    let mut live = sync.subscribe::<Item, _>(&mut manager, |_| {}).await.unwrap();
    assert_eq!(within(live.ready()).await.unwrap().ids(), vec!["a", "b", "c"]);

    let report = sync.reorder(&ids(&["c", "a", "b"])).await.unwrap();
    assert_eq!(report.writes, 3);

    assert_eq!(stored_order(&store, "a").await, Some(1));
    assert_eq!(stored_order(&store, "b").await, Some(2));
    assert_eq!(stored_order(&store, "c").await, Some(0));

    let snap = within(live.wait_until(|s| s.ids() == vec!["c", "a", "b"]))
        .await
        .unwrap();
    assert!(snap.is_dense());
}

#[tokio::test]
async fn orders_are_dense_after_reorder_even_from_gaps() {
    let (store, sync, mut manager) = setup();
    for (id, order) in [("a", 7), ("b", 3), ("c", 12)] {
        store
            .insert_with_id(ITEMS, id, fields(json!({ "order": order })))
            .await
            .unwrap();
    }
    let mut live = sync.subscribe::<Item, _>(&mut manager, |_| {}).await.unwrap();
    let before = within(live.ready()).await.unwrap();
    assert_eq!(before.ids(), vec!["b", "a", "c"]);
    assert!(!before.is_dense());

    sync.reorder(&ids(&["b", "a", "c"])).await.unwrap();
    let after = within(live.wait_until(|s| s.is_dense())).await.unwrap();
    assert_eq!(after.ids(), vec!["b", "a", "c"]);
    assert_eq!(after.orders(), vec![Some(0), Some(1), Some(2)]);
}

#[tokio::test]
async fn reorder_with_current_order_is_idempotent() {
    let (store, sync, mut manager) = setup();
    seed(&store, &["a", "b", "c"]).await;
    let mut live = sync.subscribe::<Item, _>(&mut manager, |_| {}).await.unwrap();
    let before = within(live.ready()).await.unwrap();

    sync.reorder(&ids(&["a", "b", "c"])).await.unwrap();
    let echoed_version = before.version() + 3;
    let after = within(live.wait_until(|s| s.version() >= echoed_version))
        .await
        .unwrap();

    assert_eq!(after.records(), before.records());
}

#[tokio::test]
async fn subscribing_twice_renders_once_per_change() {
    let (store, sync, mut manager) = setup();
    seed(&store, &["a", "b"]).await;

    let (first_renders, first) = counting_render();
    let (second_renders, second) = counting_render();
    let mut first_live = sync.subscribe::<Item, _>(&mut manager, first).await.unwrap();
    within(first_live.ready()).await.unwrap();
    let mut live = sync.subscribe::<Item, _>(&mut manager, second).await.unwrap();
    within(live.ready()).await.unwrap();
    assert_eq!(manager.len(), 1);

    let first_before = count(&first_renders);
    let second_before = count(&second_renders);

    store
        .update(ITEMS, "a", fields(json!({ "title": "renamed" })))
        .await
        .unwrap();
    let snap = within(live.next_change()).await.unwrap();
    assert_eq!(snap.get("a").unwrap().data.title, "renamed");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(count(&first_renders), first_before);
    assert_eq!(count(&second_renders), second_before + 1);
    assert_eq!(store.subscriber_count(ITEMS), 1);
}

#[tokio::test]
async fn remote_delete_replaces_the_whole_snapshot() {
    let (store, sync, mut manager) = setup();
    seed(&store, &["a", "b", "c"]).await;
    let mut live = sync.subscribe::<Item, _>(&mut manager, |_| {}).await.unwrap();
    within(live.ready()).await.unwrap();

    store.delete(ITEMS, "b").await.unwrap();

    let snap = within(live.wait_until(|s| s.len() == 2)).await.unwrap();
    assert_eq!(snap.ids(), vec!["a", "c"]);
}

#[tokio::test]
async fn partial_failure_is_reported_and_successes_stay_visible() {
    let (store, sync, mut manager) = setup();
    seed(&store, &["a", "b", "c"]).await;
    let mut live = sync.subscribe::<Item, _>(&mut manager, |_| {}).await.unwrap();
    within(live.ready()).await.unwrap();

    store
        .fail_next_update(ITEMS, "b", StoreError::Unavailable("flaky link".into()))
        .unwrap();

    let err = sync.reorder(&ids(&["c", "a", "b"])).await.unwrap_err();
    match &err {
        SyncError::ReorderFailed {
            attempted,
            failures,
        } => {
            assert_eq!(*attempted, 3);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "b");
            assert!(failures[0].1.is_transient());
        }
        other => panic!("expected ReorderFailed, got {other:?}"),
    }

    let snap = within(live.wait_until(|s| {
        s.get("c").and_then(|r| r.data.order) == Some(0)
            && s.get("a").and_then(|r| r.data.order) == Some(1)
    }))
    .await
    .unwrap();
    assert_eq!(snap.get("b").unwrap().data.order, Some(1));
    assert_eq!(stored_order(&store, "b").await, Some(1));
}

#[tokio::test]
async fn repeated_ids_are_written_once() {
    let (store, sync, _manager) = setup();
    seed(&store, &["a", "b", "c"]).await;

    let report = sync
        .reorder(&ids(&["b", "a", "b", "c", "a"]))
        .await
        .unwrap();

    assert_eq!(report.writes, 3);
    assert_eq!(
        report.assignments,
        vec![("b".to_string(), 0), ("a".to_string(), 1), ("c".to_string(), 2)]
    );
    assert_eq!(store.update_count(ITEMS, "a"), 1);
    assert_eq!(store.update_count(ITEMS, "b"), 1);
    assert_eq!(store.update_count(ITEMS, "c"), 1);
}
