//! RSA public key parsing
//!
//! Submitted key material is accepted in four shapes:
//! - PEM `PUBLIC KEY` (X.509 SubjectPublicKeyInfo)
//! - PEM `RSA PUBLIC KEY` (PKCS#1)
//! - DER SubjectPublicKeyInfo
//! - DER PKCS#1 `RSAPublicKey`
//!
//! Parsing only checks structure: the algorithm OID must be `rsaEncryption`,
//! modulus and exponent must be present and accepted by the `rsa` crate, and
//! the modulus size must satisfy the [`KeyPolicy`]. The caller's bytes are
//! never re-encoded.

use crate::error::{KeyError, Result};
use crate::types::{KeyFormat, KeyPolicy};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

const PEM_PREFIX: &str = "-----BEGIN";
const PKCS1_PEM_LABEL: &str = "-----BEGIN RSA PUBLIC KEY-----";

/// A structurally valid RSA public key
#[derive(Debug, Clone)]
pub struct ParsedPublicKey {
    format: KeyFormat,
    key: RsaPublicKey,
}

impl ParsedPublicKey {
    /// Encoding the key was submitted in
    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// Bit length of the modulus
    pub fn modulus_bits(&self) -> usize {
        self.key.n().bits()
    }

    /// The decoded key
    pub fn key(&self) -> &RsaPublicKey {
        &self.key
    }
}

/// Returns the PEM text if `bytes` look like a PEM document
fn as_pem(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    text.starts_with(PEM_PREFIX).then_some(text)
}

/// Decode key material without applying any size policy
pub fn decode_rsa_public_key(bytes: &[u8]) -> Result<ParsedPublicKey> {
    if bytes.is_empty() {
        return Err(KeyError::EmptyPayload);
    }

    if let Some(pem) = as_pem(bytes) {
        let key = if pem.starts_with(PKCS1_PEM_LABEL) {
            RsaPublicKey::from_pkcs1_pem(pem)?
        } else {
            RsaPublicKey::from_public_key_pem(pem)?
        };
        return Ok(ParsedPublicKey {
            format: KeyFormat::Pem,
            key,
        });
    }

    // SPKI first; a PKCS#1 body is the inner SEQUENCE of an SPKI bit string
    let key = match RsaPublicKey::from_public_key_der(bytes) {
        Ok(key) => key,
        Err(spki_err) => RsaPublicKey::from_pkcs1_der(bytes).map_err(|pkcs1_err| {
            KeyError::MalformedKey(format!(
                "not SubjectPublicKeyInfo ({}) nor PKCS#1 ({})",
                spki_err, pkcs1_err
            ))
        })?,
    };

    Ok(ParsedPublicKey {
        format: KeyFormat::Der,
        key,
    })
}

/// Decode key material and check its modulus size against `policy`
pub fn parse_rsa_public_key(bytes: &[u8], policy: &KeyPolicy) -> Result<ParsedPublicKey> {
    let parsed = decode_rsa_public_key(bytes)?;
    policy.check_modulus(parsed.modulus_bits())?;
    Ok(parsed)
}
