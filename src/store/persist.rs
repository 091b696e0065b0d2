//! JSON file persistence for the in-memory store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Fields, InMemoryDocumentStore, StoreError};

/// Serializable image of every collection in a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDump {
    pub collections: BTreeMap<String, BTreeMap<String, Fields>>,
}

impl InMemoryDocumentStore {
    /// Copy every collection out of the store.
    pub fn dump(&self) -> Result<StoreDump, StoreError> {
        let state = self.read()?;
        Ok(StoreDump {
            collections: state
                .collections
                .iter()
                .map(|(name, docs)| (name.clone(), docs.clone()))
                .collect(),
        })
    }

    /// Replace the store's documents with `dump`. Open feeds of every touched
    /// collection receive the new contents.
    pub fn restore(&self, dump: StoreDump) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let mut touched: Vec<String> = state.collections.keys().cloned().collect();
        touched.extend(dump.collections.keys().cloned());
        touched.sort();
        touched.dedup();

        state.collections = dump.collections.into_iter().collect();
        for collection in touched {
            state.broadcast(&collection);
        }
        Ok(())
    }

    /// Write the store to `path` as pretty JSON, via a temporary sibling file.
    pub async fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let _guard = self.save_lock.lock().await;
        let bytes = serde_json::to_vec_pretty(&self.dump()?)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Storage(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Storage(format!("rename to {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Load a store previously written by `save_to_file`.
    ///
    /// A missing file yields an empty store.
    pub async fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new();
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let dump: StoreDump = serde_json::from_slice(&bytes)?;
                let documents: usize = dump.collections.values().map(BTreeMap::len).sum();
                store.restore(dump)?;
                info!(path = %path.display(), documents, "store loaded from file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no store file yet, starting empty");
            }
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )))
            }
        }
        Ok(store)
    }
}
