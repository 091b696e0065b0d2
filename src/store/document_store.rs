//! DocumentStore - abstract async storage for schemaless documents.

use async_trait::async_trait;

use super::{ChangeFeed, Document, Fields, Query, StoreError};

/// Abstract document storage with a per-collection change feed.
///
/// Every method is a suspension point; implementations must not block the
/// calling task while waiting on I/O.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Create a document and return its store-assigned id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Fetch one document. Fails with `StoreError::NotFound` if it is absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// Merge `patch` into the document's top-level fields.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError>;

    /// Delete a document. Fails with `StoreError::NotFound` if it is absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a query against one collection.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Open a change feed for one collection.
    async fn subscribe(&self, collection: &str) -> Result<ChangeFeed, StoreError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.query(collection, &Query::new()).await?.len())
    }
}
