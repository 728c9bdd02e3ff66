//! Record and policy types shared by the registry and its storage backends

use crate::error::{KeyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest modulus a policy may accept
pub const MIN_SUPPORTED_MODULUS_BITS: usize = 512;

/// Largest modulus the RSA implementation will decode
pub const MAX_SUPPORTED_MODULUS_BITS: usize = 4096;

/// Default lower bound on modulus size
pub const DEFAULT_MIN_MODULUS_BITS: usize = 2048;

/// Default upper bound on modulus size
pub const DEFAULT_MAX_MODULUS_BITS: usize = 4096;

/// Encoding of the stored key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// PEM text (`PUBLIC KEY` or `RSA PUBLIC KEY` label)
    Pem,
    /// Binary DER (SubjectPublicKeyInfo or PKCS#1)
    Der,
}

impl KeyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFormat::Pem => "pem",
            KeyFormat::Der => "der",
        }
    }
}

impl std::fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted modulus size range for submitted keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    min_modulus_bits: usize,
    max_modulus_bits: usize,
}

impl KeyPolicy {
    /// Create a policy, rejecting bounds the RSA decoder cannot honour
    pub fn new(min_modulus_bits: usize, max_modulus_bits: usize) -> Result<Self> {
        if min_modulus_bits < MIN_SUPPORTED_MODULUS_BITS {
            return Err(KeyError::InvalidPolicy(format!(
                "minimum modulus {} is below {}",
                min_modulus_bits, MIN_SUPPORTED_MODULUS_BITS
            )));
        }
        if max_modulus_bits > MAX_SUPPORTED_MODULUS_BITS {
            return Err(KeyError::InvalidPolicy(format!(
                "maximum modulus {} is above {}",
                max_modulus_bits, MAX_SUPPORTED_MODULUS_BITS
            )));
        }
        if min_modulus_bits > max_modulus_bits {
            return Err(KeyError::InvalidPolicy(format!(
                "minimum modulus {} exceeds maximum {}",
                min_modulus_bits, max_modulus_bits
            )));
        }

        Ok(Self {
            min_modulus_bits,
            max_modulus_bits,
        })
    }

    pub fn min_modulus_bits(&self) -> usize {
        self.min_modulus_bits
    }

    pub fn max_modulus_bits(&self) -> usize {
        self.max_modulus_bits
    }

    /// Check a modulus size against the policy
    pub fn check_modulus(&self, bits: usize) -> Result<()> {
        if bits < self.min_modulus_bits || bits > self.max_modulus_bits {
            return Err(KeyError::ModulusOutOfRange {
                bits,
                min: self.min_modulus_bits,
                max: self.max_modulus_bits,
            });
        }
        Ok(())
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            min_modulus_bits: DEFAULT_MIN_MODULUS_BITS,
            max_modulus_bits: DEFAULT_MAX_MODULUS_BITS,
        }
    }
}

/// A stored public key
///
/// Created once by the registry after validation and never mutated.
/// `public_key` holds exactly the bytes the caller submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Caller-chosen identifier, unique across the store
    pub id: String,

    /// Submitted key bytes (PEM text or DER)
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,

    /// Encoding of `public_key`
    pub format: KeyFormat,

    /// Bit length of the RSA modulus
    pub modulus_bits: usize,

    /// Insertion time, set by the registry
    pub created_at: DateTime<Utc>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl KeyRecord {
    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(KeyError::from)
    }

    /// Deserialize from stored JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(KeyError::from)
    }
}
