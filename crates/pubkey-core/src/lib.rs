//! # Pubkey Core
//!
//! Domain types and validation for the public key registry.
//!
//! ## Key Concepts
//!
//! - **KeyRecord**: a stored public key, created once and never mutated
//! - **KeyPolicy**: the accepted RSA modulus size range
//! - **Identifier**: caller-chosen, URL-safe name of a record
//!
//! This crate performs no I/O. Storage and transport live in
//! `pubkey-registry`.

pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;

pub use crypto::{decode_rsa_public_key, parse_rsa_public_key, ParsedPublicKey};
pub use error::{KeyError, Result};
pub use types::{KeyFormat, KeyPolicy, KeyRecord};
pub use validation::{validate_id, MAX_ID_LEN};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
