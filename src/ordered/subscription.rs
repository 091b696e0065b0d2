//! SubscriptionManager - at most one live change feed per collection per session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CollectionRef, Snapshot, SnapshotItem, SyncError};
use crate::store::{ChangeFeed, DocumentStore};

/// Lifecycle of one collection subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    /// Feed requested, first delivery not yet received.
    Subscribing,
    /// At least one delivery applied; re-entered after every change.
    Live,
    /// The feed failed. Only an explicit resubscribe leaves this state.
    Error(SyncError),
}

/// Read handle on a subscribed collection.
///
/// The snapshot behind it is replaced wholesale by the subscription task on
/// every change event; the handle itself never mutates it.
pub struct LiveSnapshot<T> {
    collection: CollectionRef,
    snapshot: watch::Receiver<Arc<Snapshot<T>>>,
    state: watch::Receiver<SubscriptionState>,
}

impl<T> Clone for LiveSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            snapshot: self.snapshot.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for LiveSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSnapshot")
            .field("collection", &self.collection)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl<T: SnapshotItem> LiveSnapshot<T> {
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// The latest snapshot.
    pub fn current(&self) -> Arc<Snapshot<T>> {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Wait for the first delivery. Fails if the feed errors first.
    pub async fn ready(&mut self) -> Result<Arc<Snapshot<T>>, SyncError> {
        let state = self
            .state
            .wait_for(|s| *s != SubscriptionState::Subscribing)
            .await
            .map(|s| s.clone())
            .map_err(|_| SyncError::FeedClosed(self.collection.to_string()))?;
        match state {
            SubscriptionState::Live => Ok(self.current()),
            SubscriptionState::Error(err) => Err(err),
            _ => Err(SyncError::FeedClosed(self.collection.to_string())),
        }
    }

    /// Wait until a snapshot satisfies `predicate`, or the subscription ends.
    pub async fn wait_until<F>(&mut self, predicate: F) -> Result<Arc<Snapshot<T>>, SyncError>
    where
        F: Fn(&Snapshot<T>) -> bool,
    {
        let collection = self.collection.to_string();
        let observed = self.state.clone();
        tokio::select! {
            found = self.snapshot.wait_for(|snap| predicate(snap)) => match found {
                Ok(snap) => Ok(snap.clone()),
                Err(_) => Err(ended(&observed, collection)),
            },
            state = self.state.wait_for(|s| matches!(
                s,
                SubscriptionState::Error(_) | SubscriptionState::Unsubscribed
            )) => Err(match state {
                Ok(state) => match &*state {
                    SubscriptionState::Error(err) => err.clone(),
                    _ => SyncError::FeedClosed(collection),
                },
                Err(_) => SyncError::FeedClosed(collection),
            }),
        }
    }

    /// Wait for the next snapshot after the current one.
    pub async fn next_change(&mut self) -> Result<Arc<Snapshot<T>>, SyncError> {
        let seen = self.current().version();
        self.wait_until(|snap| snap.version() > seen).await
    }
}

fn ended(state: &watch::Receiver<SubscriptionState>, collection: String) -> SyncError {
    match &*state.borrow() {
        SubscriptionState::Error(err) => err.clone(),
        _ => SyncError::FeedClosed(collection),
    }
}

/// Set to false when the subscription closes. `run_feed` holds the lock while
/// rendering, so no render starts or is still running once `close` returns.
type RenderGate = Arc<Mutex<bool>>;

struct ActiveSubscription {
    task: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<SubscriptionState>>,
    gate: RenderGate,
}

impl ActiveSubscription {
    fn close(self) {
        *self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = false;
        if let Some(task) = self.task {
            task.abort();
        }
        self.state.send_replace(SubscriptionState::Unsubscribed);
    }
}

/// Owns the change-feed subscriptions of one session.
///
/// Subscribing to a collection that already has a subscription closes the old
/// one first, so each collection has at most one feed and one render callback.
/// Dropping the manager closes everything.
pub struct SubscriptionManager<S> {
    store: Arc<S>,
    active: HashMap<CollectionRef, ActiveSubscription>,
}

impl<S: DocumentStore> SubscriptionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            active: HashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Open (or reopen) the change feed for `collection`.
    ///
    /// `render` runs after every wholesale snapshot replacement, starting with
    /// the initial load. A feed error moves the subscription to
    /// `SubscriptionState::Error`; nothing retries automatically.
    pub async fn subscribe<T, F>(
        &mut self,
        collection: CollectionRef,
        render: F,
    ) -> Result<LiveSnapshot<T>, SyncError>
    where
        T: SnapshotItem,
        F: FnMut(&Snapshot<T>) + Send + 'static,
    {
        if self.unsubscribe(&collection) {
            debug!(collection = %collection, "replacing existing subscription");
        }

        let (state_tx, state_rx) = watch::channel(SubscriptionState::Subscribing);
        let state_tx = Arc::new(state_tx);

        let feed = match self.store.subscribe(collection.collection()).await {
            Ok(feed) => feed,
            Err(err) => {
                let err = SyncError::Store(err);
                warn!(collection = %collection, error = %err, "subscribe failed");
                state_tx.send_replace(SubscriptionState::Error(err.clone()));
                self.active.insert(
                    collection,
                    ActiveSubscription {
                        task: None,
                        state: state_tx,
                        gate: Arc::new(Mutex::new(false)),
                    },
                );
                return Err(err);
            }
        };

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::empty()));
        let gate: RenderGate = Arc::new(Mutex::new(true));
        let task = tokio::spawn(run_feed(
            collection.clone(),
            feed,
            snapshot_tx,
            Arc::clone(&state_tx),
            Arc::clone(&gate),
            render,
        ));
        info!(collection = %collection, "subscription opened");

        self.active.insert(
            collection.clone(),
            ActiveSubscription {
                task: Some(task),
                state: state_tx,
                gate,
            },
        );

        Ok(LiveSnapshot {
            collection,
            snapshot: snapshot_rx,
            state: state_rx,
        })
    }

    /// Close the subscription for `collection`. Returns false if there was none.
    ///
    /// Writes already in flight are not affected.
    pub fn unsubscribe(&mut self, collection: &CollectionRef) -> bool {
        match self.active.remove(collection) {
            Some(sub) => {
                sub.close();
                info!(collection = %collection, "subscription closed");
                true
            }
            None => false,
        }
    }

    /// Close every subscription (session end). Returns how many were open.
    pub fn unsubscribe_all(&mut self) -> usize {
        let count = self.active.len();
        for (_, sub) in self.active.drain() {
            sub.close();
        }
        count
    }

    pub fn state(&self, collection: &CollectionRef) -> SubscriptionState {
        self.active
            .get(collection)
            .map(|sub| sub.state.borrow().clone())
            .unwrap_or(SubscriptionState::Unsubscribed)
    }

    /// Number of collections with a subscription entry (live, pending or failed).
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl<S> Drop for SubscriptionManager<S> {
    fn drop(&mut self) {
        for (_, sub) in self.active.drain() {
            sub.close();
        }
    }
}

async fn run_feed<T, F>(
    collection: CollectionRef,
    mut feed: ChangeFeed,
    snapshot_tx: watch::Sender<Arc<Snapshot<T>>>,
    state_tx: Arc<watch::Sender<SubscriptionState>>,
    gate: RenderGate,
    mut render: F,
) where
    T: SnapshotItem,
    F: FnMut(&Snapshot<T>) + Send + 'static,
{
    let mut version = 0u64;
    loop {
        match feed.next().await {
            Some(Ok(docs)) => {
                version += 1;
                let snapshot = Snapshot::<T>::from_entries(collection.project(docs), version);
                debug!(
                    collection = %collection,
                    version,
                    records = snapshot.len(),
                    "snapshot replaced"
                );
                {
                    let open = gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    if !*open {
                        return;
                    }
                    render(&snapshot);
                }
                snapshot_tx.send_replace(Arc::new(snapshot));
                state_tx.send_if_modified(|state| match state {
                    SubscriptionState::Unsubscribed | SubscriptionState::Live => false,
                    _ => {
                        *state = SubscriptionState::Live;
                        true
                    }
                });
            }
            Some(Err(err)) => {
                warn!(collection = %collection, error = %err, "change feed failed");
                set_error(&state_tx, SyncError::Store(err));
                return;
            }
            None => {
                warn!(collection = %collection, "change feed closed by store");
                set_error(&state_tx, SyncError::FeedClosed(collection.to_string()));
                return;
            }
        }
    }
}

fn set_error(state_tx: &watch::Sender<SubscriptionState>, err: SyncError) {
    state_tx.send_if_modified(|state| {
        if *state == SubscriptionState::Unsubscribed {
            return false;
        }
        *state = SubscriptionState::Error(err);
        true
    });
}
