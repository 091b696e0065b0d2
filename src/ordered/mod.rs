//! Ordered collections - user-reorderable lists kept in sync with a document store.
//!
//! Every list the admin panel lets the user drag around (projects, skill
//! categories, the skills inside one category, education entries) follows the
//! same protocol:
//!
//! ```text
//! drag gesture ──► OrderedCollectionSync::reorder(ids)
//!                        │  one `order` update per record, issued concurrently
//!                        ▼
//!                  DocumentStore ──change feed──► SubscriptionManager
//!                                                      │ full replace + sort
//!                                                      ▼
//!                                                 render(&Snapshot)
//! ```
//!
//! Writes never touch the local snapshot; the change feed is the only thing that
//! replaces it. A subscription moves through
//! `Unsubscribed → Subscribing → Live → (Error → Live via resubscribe) → Unsubscribed`.

mod error;
mod reorder;
mod snapshot;
mod subscription;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::Document;

pub use error::SyncError;
pub use reorder::{dedupe_ids, OrderedCollectionSync, ReorderPolicy, ReorderReport};
pub use snapshot::{Record, Snapshot};
pub use subscription::{LiveSnapshot, SubscriptionManager, SubscriptionState};

/// A value ranked by an optional `order` position.
///
/// Values without an order sort after every ordered value.
pub trait Ordered {
    fn order(&self) -> Option<u64>;

    /// Sort key with missing orders mapped to the maximum position.
    fn sort_key(&self) -> u64 {
        self.order().unwrap_or(u64::MAX)
    }
}

/// Anything a snapshot can hold.
pub trait SnapshotItem: Ordered + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> SnapshotItem for T where T: Ordered + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Reference to one ordering domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionRef {
    /// Each document of the collection is one record.
    Documents { collection: String },
    /// Records are entries of an array field embedded in one parent document.
    /// Entries are `{ "name": .., "order": .. }` objects (plain strings are
    /// read as names ranked by array position) and are identified by name.
    Embedded {
        collection: String,
        parent_id: String,
        field: String,
    },
}

impl CollectionRef {
    pub fn documents(collection: impl Into<String>) -> Self {
        CollectionRef::Documents {
            collection: collection.into(),
        }
    }

    pub fn embedded(
        collection: impl Into<String>,
        parent_id: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        CollectionRef::Embedded {
            collection: collection.into(),
            parent_id: parent_id.into(),
            field: field.into(),
        }
    }

    /// The store collection whose feed drives this reference.
    pub fn collection(&self) -> &str {
        match self {
            CollectionRef::Documents { collection } => collection,
            CollectionRef::Embedded { collection, .. } => collection,
        }
    }

    /// Turn the full contents of the underlying collection into
    /// `(record id, record value)` pairs.
    pub(crate) fn project(&self, docs: Vec<Document>) -> Vec<(String, Value)> {
        match self {
            CollectionRef::Documents { .. } => docs
                .into_iter()
                .map(|doc| (doc.id, Value::Object(doc.fields)))
                .collect(),
            CollectionRef::Embedded {
                parent_id, field, ..
            } => docs
                .into_iter()
                .find(|doc| &doc.id == parent_id)
                .map(|doc| embedded_entries(&doc, field))
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionRef::Documents { collection } => write!(f, "{}", collection),
            CollectionRef::Embedded {
                collection,
                parent_id,
                field,
            } => write!(f, "{}/{}.{}", collection, parent_id, field),
        }
    }
}

/// Read the embedded entries of `field` as `(name, entry)` pairs.
pub(crate) fn embedded_entries(doc: &Document, field: &str) -> Vec<(String, Value)> {
    let Some(Value::Array(items)) = doc.get(field) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::String(name) => Some((
                name.clone(),
                serde_json::json!({ "name": name, "order": index }),
            )),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(|name| (name.to_string(), item.clone())),
            _ => None,
        })
        .collect()
}
