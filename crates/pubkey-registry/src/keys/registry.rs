//! Key Registry
//!
//! The only component with domain logic. It turns a raw submission into a
//! validated, stored record, and an identifier into a record or a typed
//! absence.
//!
//! Submission checks run in a fixed order: identifier, payload presence, key
//! encoding, then storage. Nothing reaches the store until every check has
//! passed, and the store's put-if-absent is the only write.

use chrono::Utc;
use pubkey_core::{parse_rsa_public_key, validate_id, KeyError, KeyPolicy, KeyRecord};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::storage::{KeyStore, StorageError};

/// Coarse error class, used by the transport to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller sent something unusable
    Validation,
    /// Identifier already taken
    Conflict,
    /// No record for the identifier
    NotFound,
    /// Infrastructure failure
    Storage,
}

/// Errors returned by registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Empty payload")]
    EmptyPayload,

    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::InvalidId(_)
            | RegistryError::EmptyPayload
            | RegistryError::InvalidKeyEncoding(_) => ErrorCategory::Validation,
            RegistryError::DuplicateId(_) => ErrorCategory::Conflict,
            RegistryError::NotFound(_) => ErrorCategory::NotFound,
            RegistryError::Storage(_) => ErrorCategory::Storage,
        }
    }
}

impl From<KeyError> for RegistryError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidId(reason) => RegistryError::InvalidId(reason),
            KeyError::EmptyPayload => RegistryError::EmptyPayload,
            KeyError::MalformedKey(_) | KeyError::ModulusOutOfRange { .. } => {
                RegistryError::InvalidKeyEncoding(err.to_string())
            }
            KeyError::InvalidPolicy(_) | KeyError::SerializationError(_) => {
                RegistryError::Storage(err.to_string())
            }
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyExists(id) => RegistryError::DuplicateId(id),
            other => RegistryError::Storage(other.to_string()),
        }
    }
}

/// Key Registry
///
/// Thread-safe; share it behind an `Arc`. Holds no lock of its own:
/// write-once is enforced by the store's put-if-absent.
#[derive(Debug)]
pub struct KeyRegistry {
    store: Arc<dyn KeyStore>,
    policy: KeyPolicy,
}

impl KeyRegistry {
    /// Create a registry over `store` with the given key policy
    pub fn new(store: Arc<dyn KeyStore>, policy: KeyPolicy) -> Self {
        info!(
            min_modulus_bits = policy.min_modulus_bits(),
            max_modulus_bits = policy.max_modulus_bits(),
            "Key registry initialized"
        );
        Self { store, policy }
    }

    /// Validate and store a public key under `id`
    ///
    /// Returns the stored record. Fails with `DuplicateId` if `id` is already
    /// taken, leaving the existing record untouched.
    pub async fn submit(&self, id: &str, public_key: &[u8]) -> Result<KeyRecord, RegistryError> {
        let record = self.validate(id, public_key).map_err(|e| {
            warn!(id = %id, reason = %e, "Rejected key submission");
            e
        })?;

        match self.store.put_if_absent(record.clone()).await {
            Ok(()) => {
                info!(
                    id = %record.id,
                    format = %record.format,
                    modulus_bits = record.modulus_bits,
                    "Registered public key"
                );
                Ok(record)
            }
            Err(StorageError::AlreadyExists(_)) => {
                warn!(id = %id, "Rejected duplicate id");
                Err(RegistryError::DuplicateId(id.to_string()))
            }
            Err(e) => {
                error!(id = %id, error = %e, "Failed to store public key");
                Err(e.into())
            }
        }
    }

    /// Fetch the record stored under `id`
    pub async fn fetch(&self, id: &str) -> Result<KeyRecord, RegistryError> {
        match self.store.get(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                debug!(id = %id, "No public key for id");
                Err(RegistryError::NotFound(id.to_string()))
            }
            Err(e) => {
                error!(id = %id, error = %e, "Failed to read public key");
                Err(e.into())
            }
        }
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<usize, RegistryError> {
        self.store.count().await.map_err(|e| {
            error!(error = %e, "Failed to count stored keys");
            RegistryError::from(e)
        })
    }

    /// Build a record from a submission without touching the store
    fn validate(&self, id: &str, public_key: &[u8]) -> Result<KeyRecord, RegistryError> {
        validate_id(id)?;

        if public_key.is_empty() {
            return Err(RegistryError::EmptyPayload);
        }

        let parsed = parse_rsa_public_key(public_key, &self.policy)?;

        Ok(KeyRecord {
            id: id.to_string(),
            public_key: public_key.to_vec(),
            format: parsed.format(),
            modulus_bits: parsed.modulus_bits(),
            created_at: Utc::now(),
        })
    }
}
