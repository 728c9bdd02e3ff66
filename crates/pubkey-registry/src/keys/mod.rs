//! Key registry: validation and orchestration over a key store

mod registry;

pub use registry::{ErrorCategory, KeyRegistry, RegistryError};
