//! InMemoryDocumentStore - HashMap-backed document store with live change feeds.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::feed::{ChangeFeed, FeedItem};
use super::{Document, DocumentStore, Fields, Query, StoreError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Most recent mutations kept in the write log; older ones are dropped.
pub const WRITE_LOG_CAPACITY: usize = 1024;

/// Kind of mutation recorded in the write log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// One successful mutation, as seen by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub op: WriteOp,
    pub collection: String,
    pub id: String,
    pub fields: Fields,
}

#[derive(Default)]
pub(super) struct State {
    pub(super) collections: HashMap<String, BTreeMap<String, Fields>>,
    feeds: HashMap<String, Vec<mpsc::UnboundedSender<FeedItem>>>,
    update_faults: HashMap<(String, String), StoreError>,
    unavailable: Option<String>,
    writes: VecDeque<WriteRecord>,
}

impl State {
    fn record(&mut self, write: WriteRecord) {
        if self.writes.len() == WRITE_LOG_CAPACITY {
            self.writes.pop_front();
        }
        self.writes.push_back(write);
    }

    fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match &self.unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    /// Push the full contents of `collection` to every open feed, dropping
    /// feeds whose receiver is gone.
    pub(super) fn broadcast(&mut self, collection: &str) {
        let docs = self.documents(collection);
        if let Some(feeds) = self.feeds.get_mut(collection) {
            feeds.retain(|tx| tx.send(Ok(docs.clone())).is_ok());
        }
    }
}

/// In-memory document store backed by a HashMap of collections.
///
/// Clone-friendly via Arc: clones share documents, feeds and the write log.
/// Besides the `DocumentStore` contract it exposes fault injection hooks
/// (`fail_next_update`, `set_unavailable`, `break_feeds`) and a write log so
/// callers can observe exactly what reached the store.
///
/// When created with `with_autosave`, the whole store is written to a JSON file
/// after every successful mutation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<State>>,
    autosave: Option<Arc<PathBuf>>,
    pub(super) save_lock: Arc<tokio::sync::Mutex<()>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist the store to `path` after every mutation.
    pub fn with_autosave(mut self, path: impl Into<PathBuf>) -> Self {
        self.autosave = Some(Arc::new(path.into()));
        self
    }

    fn generate_id() -> String {
        let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&nanos.to_be_bytes());
        raw[8..].copy_from_slice(&seq.to_be_bytes());
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub(super) fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    pub(super) fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    /// Apply a mutation to one collection and notify its feeds on success.
    fn mutate<R>(
        &self,
        collection: &str,
        apply: impl FnOnce(&mut State) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut state = self.write()?;
        state.check_available()?;
        let out = apply(&mut state)?;
        state.broadcast(collection);
        Ok(out)
    }

    async fn after_write(&self) {
        if let Some(path) = &self.autosave {
            if let Err(err) = self.save_to_file(path.as_path()).await {
                warn!(path = %path.display(), error = %err, "autosave failed");
            }
        }
    }

    /// Insert a document under a caller-chosen id, replacing any existing one.
    pub async fn insert_with_id(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(StoreError::Invalid("document id must not be empty".into()));
        }
        self.mutate(collection, |state| {
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), fields.clone());
            state.record(WriteRecord {
                op: WriteOp::Create,
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            });
            Ok(())
        })?;
        self.after_write().await;
        Ok(())
    }

    /// Make the next `update` of `collection/id` fail with `error`.
    pub fn fail_next_update(
        &self,
        collection: &str,
        id: &str,
        error: StoreError,
    ) -> Result<(), StoreError> {
        self.write()?
            .update_faults
            .insert((collection.to_string(), id.to_string()), error);
        Ok(())
    }

    /// Make every operation fail with `StoreError::Unavailable` until cleared
    /// with `None`.
    pub fn set_unavailable(&self, reason: Option<&str>) -> Result<(), StoreError> {
        self.write()?.unavailable = reason.map(str::to_string);
        Ok(())
    }

    /// Deliver `error` to every open feed of `collection` and close them.
    pub fn break_feeds(&self, collection: &str, error: StoreError) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        let feeds = state.feeds.remove(collection).unwrap_or_default();
        let count = feeds.len();
        for tx in feeds {
            let _ = tx.send(Err(error.clone()));
        }
        warn!(collection, feeds = count, error = %error, "change feeds broken");
        Ok(count)
    }

    /// Number of feeds on `collection` whose receiver is still alive.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.read()
            .map(|state| {
                state
                    .feeds
                    .get(collection)
                    .map(|feeds| feeds.iter().filter(|tx| !tx.is_closed()).count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// The most recent successful mutations (at most `WRITE_LOG_CAPACITY`),
    /// oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.read()
            .map(|s| s.writes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of successful updates applied to one document.
    pub fn update_count(&self, collection: &str, id: &str) -> usize {
        self.writes()
            .iter()
            .filter(|w| w.op == WriteOp::Update && w.collection == collection && w.id == id)
            .count()
    }

    /// Forget the write log.
    pub fn clear_writes(&self) -> Result<(), StoreError> {
        self.write()?.writes.clear();
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = Self::generate_id();
        self.mutate(collection, |state| {
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields.clone());
            state.record(WriteRecord {
                op: WriteOp::Create,
                collection: collection.to_string(),
                id: id.clone(),
                fields,
            });
            Ok(())
        })?;
        debug!(collection, id = %id, "document created");
        self.after_write().await;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let state = self.read()?;
        state.check_available()?;
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()))
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError> {
        self.mutate(collection, |state| {
            if let Some(err) = state
                .update_faults
                .remove(&(collection.to_string(), id.to_string()))
            {
                return Err(err);
            }
            let doc = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            for (key, value) in patch.iter() {
                doc.insert(key.clone(), value.clone());
            }
            state.record(WriteRecord {
                op: WriteOp::Update,
                collection: collection.to_string(),
                id: id.to_string(),
                fields: patch,
            });
            Ok(())
        })?;
        self.after_write().await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.mutate(collection, |state| {
            state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            state.record(WriteRecord {
                op: WriteOp::Delete,
                collection: collection.to_string(),
                id: id.to_string(),
                fields: Fields::new(),
            });
            Ok(())
        })?;
        debug!(collection, id, "document deleted");
        self.after_write().await;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let state = self.read()?;
        state.check_available()?;
        Ok(query.apply(state.documents(collection)))
    }

    async fn subscribe(&self, collection: &str) -> Result<ChangeFeed, StoreError> {
        let mut state = self.write()?;
        state.check_available()?;
        let (tx, feed) = ChangeFeed::channel(collection);
        // Initial delivery: the collection as it stands now.
        tx.send(Ok(state.documents(collection)))
            .map_err(|_| StoreError::Storage("change feed closed before first delivery".into()))?;
        let feeds = state.feeds.entry(collection.to_string()).or_default();
        feeds.retain(|tx| !tx.is_closed());
        feeds.push(tx);
        debug!(collection, feeds = feeds.len(), "change feed opened");
        Ok(feed)
    }
}
