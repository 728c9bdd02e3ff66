//! API request handlers

pub mod keys;

pub use keys::{add_key, get_key, AddKeyRequest, AddKeyResponse, KeyResponse};

use crate::keys::KeyRegistry;

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Key registry; owns the store handle
    pub registry: KeyRegistry,
}

impl AppState {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }
}
