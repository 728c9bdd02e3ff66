//! In-memory storage backend
//!
//! Non-persistent storage using a single hashmap.
//! Suitable for tests and embedding. Data is lost on restart.

use async_trait::async_trait;
use pubkey_core::KeyRecord;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::{KeyStore, StorageError};

/// In-memory key store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, KeyRecord>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, KeyRecord>>, StorageError> {
        self.records
            .read()
            .map_err(|_| StorageError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, KeyRecord>>, StorageError> {
        self.records
            .write()
            .map_err(|_| StorageError::Database("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn put_if_absent(&self, record: KeyRecord) -> Result<(), StorageError> {
        let mut records = self.write()?;
        match records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(record.id)),
            Entry::Vacant(slot) => {
                debug!(id = %record.id, "Stored key record in memory");
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<KeyRecord>, StorageError> {
        let records = self.read()?;
        Ok(records.get(id).cloned())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let records = self.read()?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pubkey_core::KeyFormat;

    fn record(id: &str, fill: u8) -> KeyRecord {
        KeyRecord {
            id: id.to_string(),
            public_key: vec![fill; 32],
            format: KeyFormat::Der,
            modulus_bits: 2048,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();

        store.put_if_absent(record("dev-1", 1)).await.unwrap();

        let retrieved = store.get("dev-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, "dev-1");
        assert_eq!(retrieved.public_key, vec![1u8; 32]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_if_absent_keeps_first() {
        let store = MemoryStore::new();

        store.put_if_absent(record("dev-1", 1)).await.unwrap();
        let result = store.put_if_absent(record("dev-1", 2)).await;

        assert!(matches!(result, Err(StorageError::AlreadyExists(id)) if id == "dev-1"));
        let stored = store.get("dev-1").await.unwrap().unwrap();
        assert_eq!(stored.public_key, vec![1u8; 32]);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
