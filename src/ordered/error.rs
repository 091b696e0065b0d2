use std::error::Error;
use std::fmt;

use crate::store::StoreError;

/// Error type for ordered-collection synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Input rejected before anything was sent to the store.
    Validation(String),
    /// A single store operation failed.
    Store(StoreError),
    /// Some of the per-record updates of one reorder failed. The updates that
    /// succeeded are not rolled back.
    ReorderFailed {
        attempted: usize,
        failures: Vec<(String, StoreError)>,
    },
    /// The change feed ended without an error (the store went away).
    FeedClosed(String),
}

impl SyncError {
    /// The store error behind this failure, when there is exactly one kind.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SyncError::Store(e) => Some(e),
            SyncError::ReorderFailed { failures, .. } => failures.first().map(|(_, e)| e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound { .. }))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Validation(msg) => write!(f, "validation failed: {}", msg),
            SyncError::Store(e) => write!(f, "{}", e),
            SyncError::ReorderFailed {
                attempted,
                failures,
            } => {
                write!(
                    f,
                    "reorder failed for {} of {} records",
                    failures.len(),
                    attempted
                )?;
                for (id, err) in failures {
                    write!(f, "; {}: {}", id, err)?;
                }
                Ok(())
            }
            SyncError::FeedClosed(collection) => {
                write!(f, "change feed for {} closed", collection)
            }
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Store(StoreError::Serde(err.to_string()))
    }
}
