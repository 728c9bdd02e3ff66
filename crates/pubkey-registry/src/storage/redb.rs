//! redb storage backend
//!
//! Persistent storage in a single embedded database file. The file is
//! created on first use and the `public_keys` table is created up front, so
//! readers never observe a missing table.
//!
//! # Durability
//!
//! Every write commits with redb's default immediate durability: the commit
//! is fsynced before `put_if_absent` returns. redb is copy-on-write, so a
//! crash mid-transaction leaves the last committed state intact.
//!
//! # Concurrency
//!
//! Put-if-absent runs check and insert inside one write transaction. redb
//! serializes write transactions, so two submissions for the same id cannot
//! both observe it as absent. Read transactions run concurrently with the
//! writer and only see committed data.

use ::redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use async_trait::async_trait;
use pubkey_core::KeyRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use super::{KeyStore, StorageError};

/// id -> JSON-encoded KeyRecord
const PUBLIC_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("public_keys");

fn db_error(err: impl Into<::redb::Error>) -> StorageError {
    StorageError::Database(err.into().to_string())
}

/// redb-backed key store
///
/// Cloning is cheap and shares the same database handle. The file is closed
/// when the last clone is dropped.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("path", &self.path).finish()
    }
}

impl RedbStore {
    /// Open the database at `path`, creating it if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let db = Database::create(&path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to open key database");
            StorageError::Connection(e.to_string())
        })?;

        let txn = db.begin_write().map_err(db_error)?;
        txn.open_table(PUBLIC_KEYS).map_err(db_error)?;
        txn.commit().map_err(db_error)?;

        info!(path = %path.display(), "Opened key database");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a blocking database call on the blocking thread pool
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(db.as_ref()))
            .await
            .map_err(|e| StorageError::Database(format!("storage task failed: {}", e)))?
    }
}

fn put_if_absent_blocking(db: &Database, id: &str, value: &[u8]) -> Result<bool, StorageError> {
    let txn = db.begin_write().map_err(db_error)?;

    let inserted = {
        let mut table = txn.open_table(PUBLIC_KEYS).map_err(db_error)?;
        let exists = table.get(id).map_err(db_error)?.is_some();
        if !exists {
            table.insert(id, value).map_err(db_error)?;
        }
        !exists
    };

    if inserted {
        txn.commit().map_err(db_error)?;
    } else {
        txn.abort().map_err(db_error)?;
    }

    Ok(inserted)
}

fn get_blocking(db: &Database, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
    let txn = db.begin_read().map_err(db_error)?;
    let table = txn.open_table(PUBLIC_KEYS).map_err(db_error)?;
    let value = table.get(id).map_err(db_error)?;
    Ok(value.map(|guard| guard.value().to_vec()))
}

fn count_blocking(db: &Database) -> Result<usize, StorageError> {
    let txn = db.begin_read().map_err(db_error)?;
    let table = txn.open_table(PUBLIC_KEYS).map_err(db_error)?;
    let len = table.len().map_err(db_error)?;
    Ok(len as usize)
}

#[async_trait]
impl KeyStore for RedbStore {
    async fn put_if_absent(&self, record: KeyRecord) -> Result<(), StorageError> {
        let value = record.to_bytes()?;
        let id = record.id;

        let key = id.clone();
        let inserted = self
            .blocking(move |db| put_if_absent_blocking(db, &key, &value))
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "Failed to store key record");
                e
            })?;

        if !inserted {
            return Err(StorageError::AlreadyExists(id));
        }

        info!(id = %id, "Stored key record in database");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KeyRecord>, StorageError> {
        let key = id.to_string();
        let bytes = self.blocking(move |db| get_blocking(db, &key)).await?;

        match bytes {
            Some(bytes) => Ok(Some(KeyRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.blocking(count_blocking).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pubkey_core::KeyFormat;
    use tempfile::TempDir;

    fn record(id: &str, fill: u8) -> KeyRecord {
        KeyRecord {
            id: id.to_string(),
            public_key: vec![fill; 64],
            format: KeyFormat::Der,
            modulus_bits: 2048,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.db");
        assert!(!path.exists());

        let store = RedbStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path().join("keys.db")).unwrap();

        let original = record("dev-1", 7);
        store.put_if_absent(original.clone()).await.unwrap();

        let retrieved = store.get("dev-1").await.unwrap().unwrap();
        assert_eq!(retrieved, original);
        assert!(store.get("dev-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_if_absent_keeps_first() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path().join("keys.db")).unwrap();

        store.put_if_absent(record("dev-1", 1)).await.unwrap();
        let second = store.put_if_absent(record("dev-1", 2)).await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(id)) if id == "dev-1"));
        let stored = store.get("dev-1").await.unwrap().unwrap();
        assert_eq!(stored.public_key, vec![1u8; 64]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.db");

        let original = record("dev-1", 3);
        {
            let store = RedbStore::open(&path).unwrap();
            store.put_if_absent(original.clone()).await.unwrap();
        }

        let reopened = RedbStore::open(&path).unwrap();
        assert_eq!(reopened.get("dev-1").await.unwrap(), Some(original));
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
