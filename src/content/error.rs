//! Error types for content administration.

use std::error::Error;
use std::fmt;

use crate::ordered::SyncError;
use crate::store::StoreError;

/// Error type for admin operations on site content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Input rejected before reaching the store.
    Validation(String),
    /// The referenced content does not exist (or was deleted concurrently).
    NotFound(String),
    /// The content already exists.
    Duplicate(String),
    /// Missing or invalid admin credentials.
    Unauthorized(String),
    /// Reading seed or data files failed.
    Io(String),
    /// Store or synchronization failure.
    Sync(SyncError),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Validation(msg) => write!(f, "validation error: {}", msg),
            AdminError::NotFound(msg) => write!(f, "{}", msg),
            AdminError::Duplicate(msg) => write!(f, "{}", msg),
            AdminError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            AdminError::Io(msg) => write!(f, "io error: {}", msg),
            AdminError::Sync(e) => write!(f, "{}", e),
        }
    }
}

impl Error for AdminError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AdminError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyncError> for AdminError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(msg) => AdminError::Validation(msg),
            other => AdminError::Sync(other),
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        AdminError::Sync(SyncError::Store(err))
    }
}

impl AdminError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::Validation(_) => 400,
            AdminError::NotFound(_) => 404,
            AdminError::Duplicate(_) => 409,
            AdminError::Unauthorized(_) => 401,
            AdminError::Io(_) => 500,
            AdminError::Sync(e) => match e.store_error() {
                Some(StoreError::NotFound { .. }) => 404,
                Some(StoreError::Unavailable(_)) => 503,
                Some(StoreError::PermissionDenied(_)) => 403,
                Some(StoreError::Invalid(_)) => 400,
                _ => match e {
                    SyncError::Validation(_) => 400,
                    SyncError::FeedClosed(_) => 503,
                    _ => 500,
                },
            },
        }
    }
}
