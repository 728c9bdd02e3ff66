//! Public Key Handlers
//!
//! Handles submission and lookup of RSA public keys.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use pubkey_core::{KeyFormat, KeyRecord};

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

const PEM_PREFIX: &str = "-----BEGIN";

/// Path segment that selects submission on `POST /api/keys/{segment}`
pub const ADD_ACTION: &str = "add";

/// Request to register a public key
#[derive(Debug, Deserialize)]
pub struct AddKeyRequest {
    /// Identifier to store the key under
    pub id: String,

    /// PEM text, or base64-encoded DER
    #[serde(default)]
    pub key: String,
}

/// Response from key registration
#[derive(Debug, Serialize, Deserialize)]
pub struct AddKeyResponse {
    /// Stored id
    pub id: String,

    /// Success message
    pub message: String,
}

/// A stored public key
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyResponse {
    pub id: String,

    /// PEM text for PEM records, base64 of the DER bytes otherwise
    pub key: String,

    pub format: KeyFormat,

    pub modulus_bits: usize,

    pub created_at: DateTime<Utc>,
}

impl From<KeyRecord> for KeyResponse {
    fn from(record: KeyRecord) -> Self {
        let key = match record.format {
            KeyFormat::Pem => String::from_utf8(record.public_key)
                .unwrap_or_else(|e| STANDARD.encode(e.into_bytes())),
            KeyFormat::Der => STANDARD.encode(&record.public_key),
        };

        Self {
            id: record.id,
            key,
            format: record.format,
            modulus_bits: record.modulus_bits,
            created_at: record.created_at,
        }
    }
}

/// Turn the `key` field into the bytes handed to the registry
///
/// PEM text is submitted verbatim and anything else is decoded as base64.
/// Text that is not base64 is passed on as-is; the registry rejects it as a
/// bad key once the id has been checked.
fn decode_key_field(key: &str) -> Vec<u8> {
    if key.trim_start().starts_with(PEM_PREFIX) {
        return key.as_bytes().to_vec();
    }

    let compact: String = key.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Key field is not base64");
            key.as_bytes().to_vec()
        }
    }
}

/// Register a public key
///
/// POST /api/keys/add
///
/// The id is write-once: a second submission for the same id is rejected
/// with 409 and the stored key is left as it was.
pub async fn add_key(
    State(state): State<Arc<AppState>>,
    action: Result<Path<String>, PathRejection>,
    payload: Result<Json<AddKeyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddKeyResponse>), ApiError> {
    let Path(action) = action?;
    if action != ADD_ACTION {
        return Err(ApiError::ResourceNotFound(format!("/api/keys/{}", action)));
    }

    let Json(request) = payload?;

    let key_bytes = decode_key_field(&request.key);
    let record = state.registry.submit(&request.id, &key_bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddKeyResponse {
            id: record.id,
            message: "Public key registered successfully".into(),
        }),
    ))
}

/// Fetch a public key by id
///
/// GET /api/keys/{id}
pub async fn get_key(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<KeyResponse>, ApiError> {
    let Path(id) = id?;
    let record = state.registry.fetch(&id).await?;
    Ok(Json(KeyResponse::from(record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_passed_through() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert_eq!(decode_key_field(pem), pem.as_bytes());
    }

    #[test]
    fn test_base64_decoded() {
        assert_eq!(decode_key_field("AAEC"), vec![0x00, 0x01, 0x02]);
        assert_eq!(decode_key_field("AA\nEC\n"), vec![0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_empty_key_is_empty_bytes() {
        assert!(decode_key_field("").is_empty());
    }

    #[test]
    fn test_invalid_base64_passed_through() {
        assert_eq!(decode_key_field("not base64!"), b"not base64!");
    }

    #[test]
    fn test_der_rendered_as_base64() {
        let record = KeyRecord {
            id: "d".into(),
            public_key: vec![0x00, 0x01, 0x02],
            format: KeyFormat::Der,
            modulus_bits: 2048,
            created_at: Utc::now(),
        };
        assert_eq!(KeyResponse::from(record).key, "AAEC");
    }
}
