//! Error types for public key validation

use thiserror::Error;

/// Result type alias using KeyError
pub type Result<T> = std::result::Result<T, KeyError>;

/// Errors raised while validating an identifier or key material
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Identifier is empty, too long, or contains unsafe characters
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// No key material was supplied
    #[error("No key material supplied")]
    EmptyPayload,

    /// Bytes do not decode as an RSA public key
    #[error("Malformed RSA public key: {0}")]
    MalformedKey(String),

    /// Key decoded but its modulus size is outside the accepted range
    #[error("RSA modulus is {bits} bits, accepted range is {min}..={max}")]
    ModulusOutOfRange { bits: usize, min: usize, max: usize },

    /// Key policy bounds are inconsistent or unsupported
    #[error("Invalid key policy: {0}")]
    InvalidPolicy(String),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl KeyError {
    /// True when the error concerns the submitted key bytes themselves
    pub fn is_key_encoding(&self) -> bool {
        matches!(self, KeyError::MalformedKey(_) | KeyError::ModulusOutOfRange { .. })
    }
}

impl From<serde_json::Error> for KeyError {
    fn from(err: serde_json::Error) -> Self {
        KeyError::SerializationError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for KeyError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        KeyError::MalformedKey(err.to_string())
    }
}

impl From<rsa::pkcs8::spki::Error> for KeyError {
    fn from(err: rsa::pkcs8::spki::Error) -> Self {
        KeyError::MalformedKey(err.to_string())
    }
}
