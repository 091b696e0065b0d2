//! Document store - the remote collaborator that holds every content collection.
//!
//! A store keeps schemaless documents grouped in named collections. It offers
//! CRUD, filtered/ordered queries, and a change feed per collection that pushes
//! the full contents of the collection after every mutation.
//!
//! ## Example
//!
//! ```ignore
//! use portfolio_sync::store::{DocumentStore, InMemoryDocumentStore, Query};
//!
//! let store = InMemoryDocumentStore::new();
//! let id = store.create("projects", fields).await?;
//! let mut feed = store.subscribe("projects").await?;
//! let current = feed.next().await; // full contents, then one item per change
//! ```

mod document_store;
mod feed;
mod in_memory;
mod persist;
mod query;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use document_store::DocumentStore;
pub use feed::{ChangeFeed, FeedItem};
pub use in_memory::{InMemoryDocumentStore, WriteOp, WriteRecord, WRITE_LOG_CAPACITY};
pub use persist::StoreDump;
pub use query::{Direction, Filter, OrderBy, Query};

/// Field map of a document. Top-level keys are field names.
pub type Fields = Map<String, Value>;

/// The field every ordered collection ranks by.
pub const ORDER_FIELD: &str = "order";

/// A stored document: a store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The `order` field, if present and a non-negative integer.
    pub fn order(&self) -> Option<u64> {
        self.fields.get(ORDER_FIELD).and_then(Value::as_u64)
    }

    /// The fields as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced document does not exist (often a concurrent delete).
    NotFound { collection: String, id: String },
    /// The store cannot be reached right now. Callers decide whether to retry.
    Unavailable(String),
    /// The caller is not allowed to perform the operation.
    PermissionDenied(String),
    /// The request itself is malformed.
    Invalid(String),
    /// Serialization/deserialization error.
    Serde(String),
    /// Storage-level error.
    Storage(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// True for failures that may succeed if tried again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { collection, id } => {
                write!(f, "document not found: {}/{}", collection, id)
            }
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StoreError::Invalid(msg) => write!(f, "invalid request: {}", msg),
            StoreError::Serde(msg) => write!(f, "document serialization error: {}", msg),
            StoreError::Storage(msg) => write!(f, "document storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Serialize a value into a top-level field map.
///
/// Fails with `StoreError::Invalid` when the value is not a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Invalid(format!(
            "documents must be JSON objects, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
