//! Snapshot - the local, wholesale-rebuilt mirror of one ordered collection.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{Ordered, SnapshotItem};

/// One record of an ordered collection: its id plus the decoded payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Ordered> Ordered for Record<T> {
    fn order(&self) -> Option<u64> {
        self.data.order()
    }
}

/// An ordered view of a collection at one point in time.
///
/// Records are sorted by ascending `order`; records without an order come last,
/// and ties are broken by id so the presentation is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    records: Vec<Record<T>>,
    version: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            version: 0,
        }
    }
}

impl<T: SnapshotItem> Snapshot<T> {
    /// Decode and sort `(id, value)` pairs into a snapshot.
    ///
    /// Entries that do not decode as `T` are skipped with a warning.
    pub fn from_entries(entries: Vec<(String, Value)>, version: u64) -> Self {
        let mut records: Vec<Record<T>> = entries
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<T>(value) {
                Ok(data) => Some(Record { id, data }),
                Err(err) => {
                    warn!(id = %id, error = %err, "skipping undecodable record");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { records, version }
    }
}

impl<T> Snapshot<T> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record<T>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record<T>> {
        self.records
    }

    /// Record ids in presentation order.
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Record<T>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// How many change events produced this snapshot. Zero means nothing has
    /// been received yet.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: Ordered> Snapshot<T> {
    /// The `order` values in presentation order.
    pub fn orders(&self) -> Vec<Option<u64>> {
        self.records.iter().map(|r| r.order()).collect()
    }

    /// True when the orders are exactly `0..len` in presentation order.
    pub fn is_dense(&self) -> bool {
        self.records
            .iter()
            .enumerate()
            .all(|(i, r)| r.order() == Some(i as u64))
    }
}
