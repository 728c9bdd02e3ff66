//! Public Key Registry Server
//!
//! A registry for RSA public keys that:
//! - Validates submitted key material (PEM or DER, SPKI or PKCS#1)
//! - Stores each key once under a caller-chosen identifier
//! - Serves stored keys back by identifier
//!
//! ## Invariants
//!
//! 1. **WRITE-ONCE**: an id, once stored, is never overwritten
//! 2. **VALIDITY**: only keys that parse as RSA within the size policy are stored
//! 3. **FIDELITY**: fetched bytes are exactly the submitted bytes
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with stored key count
//! - `POST /api/keys/add` - Register a public key
//! - `GET /api/keys/{id}` - Fetch a public key

pub mod api;
pub mod config;
pub mod keys;
pub mod storage;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{ConfigError, ServerConfig};
pub use keys::{ErrorCategory, KeyRegistry, RegistryError};
pub use storage::{KeyStore, MemoryStore, RedbStore, StorageError};
