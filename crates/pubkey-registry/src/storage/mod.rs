//! Storage abstraction for the key registry
//!
//! This module provides a trait-based abstraction over record storage,
//! with a persistent embedded backend (redb, default) and an in-memory
//! backend for tests and embedding.
//!
//! Every backend must provide an atomic put-if-absent: the registry relies on
//! it alone to keep identifiers write-once under concurrent submissions.

pub mod memory;
pub mod redb;

pub use self::redb::RedbStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use pubkey_core::{KeyError, KeyRecord};
use std::fmt::Debug;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<KeyError> for StorageError {
    fn from(err: KeyError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Storage backend trait for key records
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait KeyStore: Send + Sync + Debug {
    /// Insert a record only if no record exists for `record.id`
    ///
    /// Returns `StorageError::AlreadyExists` without touching the stored
    /// record when the id is taken. On any other failure the store is left
    /// unchanged.
    async fn put_if_absent(&self, record: KeyRecord) -> Result<(), StorageError>;

    /// Get a record by id
    async fn get(&self, id: &str) -> Result<Option<KeyRecord>, StorageError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, StorageError>;
}
