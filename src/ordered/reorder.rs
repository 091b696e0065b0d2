//! OrderedCollectionSync - turns a drag-and-drop result into persisted `order` values.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{
    embedded_entries, CollectionRef, LiveSnapshot, Snapshot, SnapshotItem, SubscriptionManager,
    SyncError,
};
use crate::store::{DocumentStore, Fields, Query, StoreError, ORDER_FIELD};

/// How a reorder treats an id sequence that is not a permutation of the
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderPolicy {
    /// Read the collection first; reject missing or unknown ids before any write.
    #[default]
    Strict,
    /// Write a position for every supplied id without reading first.
    /// Embedded lists keep unlisted entries after the listed ones and skip
    /// unknown names.
    BestEffort,
}

impl std::str::FromStr for ReorderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ReorderPolicy::Strict),
            "best-effort" | "best_effort" | "besteffort" => Ok(ReorderPolicy::BestEffort),
            other => Err(format!(
                "unknown reorder policy `{}` (expected strict or best-effort)",
                other
            )),
        }
    }
}

/// Outcome of a fully successful reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderReport {
    /// `(id, new order)` in the requested sequence, duplicates removed.
    pub assignments: Vec<(String, u64)>,
    /// Store writes issued: one per record, or one for an embedded list.
    pub writes: usize,
}

/// Keep the first occurrence of every id, preserving sequence order.
pub fn dedupe_ids(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Reorder and subscribe operations for one ordering domain.
pub struct OrderedCollectionSync<S> {
    store: Arc<S>,
    collection: CollectionRef,
    policy: ReorderPolicy,
}

impl<S> Clone for OrderedCollectionSync<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            policy: self.policy,
        }
    }
}

impl<S: DocumentStore> OrderedCollectionSync<S> {
    pub fn new(store: Arc<S>, collection: CollectionRef) -> Self {
        Self {
            store,
            collection,
            policy: ReorderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReorderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn policy(&self) -> ReorderPolicy {
        self.policy
    }

    /// Subscribe this domain through the session's manager.
    pub async fn subscribe<T, F>(
        &self,
        subscriptions: &mut SubscriptionManager<S>,
        render: F,
    ) -> Result<LiveSnapshot<T>, SyncError>
    where
        T: SnapshotItem,
        F: FnMut(&Snapshot<T>) + Send + 'static,
    {
        subscriptions.subscribe(self.collection.clone(), render).await
    }

    /// Persist `ids` as the new presentation order: the record at position `i`
    /// gets `order = i`.
    ///
    /// Repeated ids are written once, at their first position. The local
    /// snapshot is not touched; the change feed delivers the result. If any
    /// write fails the error lists every failed id and the successful writes
    /// stay in place.
    pub async fn reorder(&self, ids: &[String]) -> Result<ReorderReport, SyncError> {
        let ids = dedupe_ids(ids);
        if ids.is_empty() {
            return Err(SyncError::Validation(
                "reorder needs at least one id".into(),
            ));
        }
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(SyncError::Validation("reorder ids must not be empty".into()));
        }

        match &self.collection {
            CollectionRef::Documents { collection } => self.reorder_documents(collection, &ids).await,
            CollectionRef::Embedded {
                collection,
                parent_id,
                field,
            } => {
                self.reorder_embedded(collection, parent_id, field, &ids)
                    .await
            }
        }
    }

    async fn reorder_documents(
        &self,
        collection: &str,
        ids: &[&str],
    ) -> Result<ReorderReport, SyncError> {
        if self.policy == ReorderPolicy::Strict {
            let current = self.store.query(collection, &Query::new()).await?;
            check_permutation(ids, current.iter().map(|d| d.id.as_str()))?;
        }

        debug!(collection, records = ids.len(), "dispatching reorder");
        let mut updates = JoinSet::new();
        for (position, id) in ids.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let collection = collection.to_string();
            let id = id.to_string();
            updates.spawn(async move {
                let mut patch = Fields::new();
                patch.insert(ORDER_FIELD.to_string(), json!(position));
                let result = store.update(&collection, &id, patch).await;
                (id, result)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = updates.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((id, Err(err))) => failures.push((id, err)),
                Err(join_err) => failures.push((
                    String::from("<update task>"),
                    StoreError::Storage(join_err.to_string()),
                )),
            }
        }

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.0.cmp(&b.0));
            warn!(
                collection,
                attempted = ids.len(),
                failed = failures.len(),
                "reorder partially failed"
            );
            return Err(SyncError::ReorderFailed {
                attempted: ids.len(),
                failures,
            });
        }

        info!(collection, records = ids.len(), "reorder persisted");
        Ok(ReorderReport {
            assignments: assignments(ids),
            writes: ids.len(),
        })
    }

    async fn reorder_embedded(
        &self,
        collection: &str,
        parent_id: &str,
        field: &str,
        names: &[&str],
    ) -> Result<ReorderReport, SyncError> {
        let parent = self.store.get(collection, parent_id).await?;
        let current = embedded_entries(&parent, field);

        if self.policy == ReorderPolicy::Strict {
            check_permutation(names, current.iter().map(|(name, _)| name.as_str()))?;
        }

        let (placed, unknown): (Vec<&str>, Vec<&str>) = names
            .iter()
            .copied()
            .partition(|name| current.iter().any(|(n, _)| n == *name));
        if !unknown.is_empty() {
            warn!(collection, parent_id, unknown = ?unknown, "skipping unknown entries");
        }

        // Unlisted entries keep their relative order after the listed ones.
        let mut rest: Vec<(usize, &(String, Value))> = current
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| !placed.contains(&name.as_str()))
            .collect();
        rest.sort_by_key(|(index, (_, entry))| {
            (entry.get(ORDER_FIELD).and_then(Value::as_u64).unwrap_or(u64::MAX), *index)
        });

        let mut order: Vec<&str> = placed;
        order.extend(rest.iter().map(|(_, (name, _))| name.as_str()));

        let entries: Vec<Value> = order
            .iter()
            .enumerate()
            .map(|(position, name)| {
                let existing = current
                    .iter()
                    .find(|(n, _)| n == *name)
                    .map(|(_, entry)| entry.clone());
                match existing {
                    Some(Value::Object(mut entry)) => {
                        entry.insert(ORDER_FIELD.to_string(), json!(position));
                        Value::Object(entry)
                    }
                    _ => json!({ "name": name, "order": position }),
                }
            })
            .collect();

        let mut patch = Fields::new();
        patch.insert(field.to_string(), Value::Array(entries));
        if let Err(err) = self.store.update(collection, parent_id, patch).await {
            warn!(collection, parent_id, error = %err, "embedded reorder failed");
            return Err(SyncError::ReorderFailed {
                attempted: 1,
                failures: vec![(parent_id.to_string(), err)],
            });
        }

        info!(collection, parent_id, field, entries = order.len(), "embedded reorder persisted");
        Ok(ReorderReport {
            assignments: assignments(&order),
            writes: 1,
        })
    }
}

fn assignments(ids: &[&str]) -> Vec<(String, u64)> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), i as u64))
        .collect()
}

/// Fail unless `requested` holds exactly the ids in `existing`.
fn check_permutation<'a>(
    requested: &[&str],
    existing: impl Iterator<Item = &'a str>,
) -> Result<(), SyncError> {
    let existing: HashSet<&str> = existing.collect();
    let requested_set: HashSet<&str> = requested.iter().copied().collect();

    let mut unknown: Vec<&str> = requested
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();
    let mut missing: Vec<&str> = existing
        .iter()
        .copied()
        .filter(|id| !requested_set.contains(id))
        .collect();

    if unknown.is_empty() && missing.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    missing.sort_unstable();
    let mut problems = Vec::new();
    if !unknown.is_empty() {
        problems.push(format!("unknown ids [{}]", unknown.join(", ")));
    }
    if !missing.is_empty() {
        problems.push(format!("missing ids [{}]", missing.join(", ")));
    }
    Err(SyncError::Validation(format!(
        "reorder must list every record exactly once: {}",
        problems.join("; ")
    )))
}
