// 📒 Record Store - ordered, persisted collection of records
// Every mutation rewrites the whole serialized sequence before returning.
// If the write fails the in-memory change is undone, so memory and storage never diverge.

use crate::record::Record;
use crate::storage::{KeyValueStorage, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key the tracker uses unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "tracker_history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record index {index} is out of range (store holds {len} records)")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid record index {0:?}")]
    InvalidIndex(String),

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist records: {0}")]
    Persist(#[from] StorageError),
}

pub struct RecordStore<S> {
    storage: S,
    key: String,
    records: Vec<Record>,
}

impl<S: KeyValueStorage> RecordStore<S> {
    /// Loads the persisted sequence. Missing or malformed data opens an empty store.
    pub fn open(storage: S, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();

        let records = match storage.get(&key)? {
            None => {
                debug!("No persisted records under {key:?}, starting empty");
                Vec::new()
            }
            Some(raw) => match parse_records(&raw) {
                Ok(records) => {
                    debug!("Loaded {} records from {key:?}", records.len());
                    records
                }
                Err(e) => {
                    warn!("Persisted records under {key:?} are malformed, starting empty: {e}");
                    Vec::new()
                }
            },
        };

        Ok(Self {
            storage,
            key,
            records,
        })
    }

    /// Appends `record` and persists. No shape validation happens here.
    pub fn add(&mut self, record: Record) -> Result<(), StoreError> {
        self.records.push(record);

        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }

        info!(
            "Added {} record (store now holds {})",
            self.records.last().map(|r| r.record_type.as_str()).unwrap_or(""),
            self.records.len()
        );
        Ok(())
    }

    /// Removes the record at 0-based `index` and returns it
    pub fn remove(&mut self, index: usize) -> Result<Record, StoreError> {
        let len = self.records.len();
        if index >= len {
            return Err(StoreError::OutOfRange { index, len });
        }

        let removed = self.records.remove(index);

        if let Err(e) = self.save() {
            self.records.insert(index, removed);
            return Err(e);
        }

        info!("Removed {} record at index {index}", removed.record_type);
        Ok(removed)
    }

    /// Removal path for delete actions, which carry the row index as text
    pub fn remove_by_key(&mut self, key: &str) -> Result<Record, StoreError> {
        let index = key
            .trim()
            .parse::<usize>()
            .map_err(|_| StoreError::InvalidIndex(key.to_string()))?;
        self.remove(index)
    }

    /// Independent snapshot in insertion order
    pub fn list(&self) -> Vec<Record> {
        self.records.clone()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The exact text persisted under the storage key
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let json = self.to_json()?;
        self.storage.set(&self.key, &json)?;
        debug!(
            "Persisted {} records ({} bytes) under {:?}",
            self.records.len(),
            json.len(),
            self.key
        );
        Ok(())
    }
}

/// Parse a persisted record array
pub fn parse_records(raw: &str) -> Result<Vec<Record>, serde_json::Error> {
    serde_json::from_str(raw)
}
