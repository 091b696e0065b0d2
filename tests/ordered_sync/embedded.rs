//! Reordering entries embedded in a parent document.

use std::sync::Arc;

use portfolio_sync::content::SkillEntry;
use portfolio_sync::ordered::{
    CollectionRef, OrderedCollectionSync, ReorderPolicy, SubscriptionManager, SyncError,
};
use portfolio_sync::store::{DocumentStore, InMemoryDocumentStore};
use serde_json::json;

use crate::support::{fields, ids, within};

async fn category(store: &InMemoryDocumentStore) -> CollectionRef {
    store
        .insert_with_id(
            "skills",
            "langs",
            fields(json!({
                "categoryName": "Languages",
                "order": 0,
                "skills": [
                    { "name": "Rust", "order": 0 },
                    { "name": "Go", "order": 1 },
                    { "name": "Zig", "order": 2 }
                ]
            })),
        )
        .await
        .unwrap();
    store.clear_writes().unwrap();
    CollectionRef::embedded("skills", "langs", "skills")
}

#[tokio::test]
async fn embedded_reorder_is_one_update_of_the_parent() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let target = category(&store).await;
    let sync = OrderedCollectionSync::new(Arc::clone(&store), target.clone());
    let mut manager = SubscriptionManager::new(Arc::clone(&store));
    let mut live = sync
        .subscribe::<SkillEntry, _>(&mut manager, |_| {})
        .await
        .unwrap();
    assert_eq!(
        within(live.ready()).await.unwrap().ids(),
        vec!["Rust", "Go", "Zig"]
    );

    let report = sync.reorder(&ids(&["Zig", "Rust", "Go"])).await.unwrap();
    assert_eq!(report.writes, 1);
    assert_eq!(store.update_count("skills", "langs"), 1);

    let snap = within(live.wait_until(|s| s.ids() == vec!["Zig", "Rust", "Go"]))
        .await
        .unwrap();
    assert!(snap.is_dense());

    let parent = store.get("skills", "langs").await.unwrap();
    assert_eq!(parent.get("categoryName"), Some(&json!("Languages")));
    assert_eq!(parent.order(), Some(0));
}

#[tokio::test]
async fn strict_embedded_reorder_needs_every_name() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let target = category(&store).await;
    let sync = OrderedCollectionSync::new(Arc::clone(&store), target);

    let err = sync.reorder(&ids(&["Zig", "Rust"])).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ref m) if m.contains("missing ids [Go]")));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn best_effort_embedded_reorder_keeps_unlisted_entries() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let target = category(&store).await;
    let sync = OrderedCollectionSync::new(Arc::clone(&store), target)
        .with_policy(ReorderPolicy::BestEffort);

    let report = sync.reorder(&ids(&["Zig", "Typo"])).await.unwrap();
    assert_eq!(report.writes, 1);
    assert_eq!(
        report.assignments,
        vec![
            ("Zig".to_string(), 0),
            ("Rust".to_string(), 1),
            ("Go".to_string(), 2)
        ]
    );

    let parent = store.get("skills", "langs").await.unwrap();
    assert_eq!(
        parent.get("skills"),
        Some(&json!([
            { "name": "Zig", "order": 0 },
            { "name": "Rust", "order": 1 },
            { "name": "Go", "order": 2 }
        ]))
    );
}

#[tokio::test]
async fn missing_parent_is_not_found() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let sync = OrderedCollectionSync::new(
        Arc::clone(&store),
        CollectionRef::embedded("skills", "deleted", "skills"),
    );

    let err = sync.reorder(&ids(&["Rust"])).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn legacy_string_entries_are_upgraded_on_reorder() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .insert_with_id(
            "skills",
            "tools",
            fields(json!({ "categoryName": "Tools", "skills": ["Git", "Docker"] })),
        )
        .await
        .unwrap();
    let sync = OrderedCollectionSync::new(
        Arc::clone(&store),
        CollectionRef::embedded("skills", "tools", "skills"),
    );

    sync.reorder(&ids(&["Docker", "Git"])).await.unwrap();

    let parent = store.get("skills", "tools").await.unwrap();
    assert_eq!(
        parent.get("skills"),
        Some(&json!([
            { "name": "Docker", "order": 0 },
            { "name": "Git", "order": 1 }
        ]))
    );
}
