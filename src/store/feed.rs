//! ChangeFeed - push-based stream of full collection contents.

use tokio::sync::mpsc;

use super::{Document, StoreError};

/// One delivery on a change feed: the full current contents of the collection,
/// or the error that ended the feed.
pub type FeedItem = Result<Vec<Document>, StoreError>;

/// Receiving end of a collection subscription.
///
/// The first item is the collection as it stands when the subscription opens;
/// every later mutation delivers the whole collection again. After an `Err`
/// item the store closes the feed. Dropping the feed unsubscribes.
pub struct ChangeFeed {
    collection: String,
    rx: mpsc::UnboundedReceiver<FeedItem>,
}

impl ChangeFeed {
    pub fn new(collection: impl Into<String>, rx: mpsc::UnboundedReceiver<FeedItem>) -> Self {
        Self {
            collection: collection.into(),
            rx,
        }
    }

    /// A connected pair: the sender half stays with the store.
    pub fn channel(collection: impl Into<String>) -> (mpsc::UnboundedSender<FeedItem>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(collection, rx))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next delivery. `None` once the store has closed the feed.
    pub async fn next(&mut self) -> Option<FeedItem> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("collection", &self.collection)
            .finish()
    }
}
