//! API error types and responses
//!
//! Every API error renders as the same envelope: `{"status": .., "message": ..}`.
//! Registry errors map to statuses by variant, never by message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::keys::RegistryError;

/// API error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Malformed JSON payload: {0}")]
    BadJson(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No payload")]
    NoPayload,

    #[error("Invalid public key: {0}")]
    BadPublicKey(String),

    #[error("Duplicated id: {0}")]
    DuplicatedId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Request under `/api/` that matches no resource
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadJson(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoPayload | ApiError::BadPublicKey(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DuplicatedId(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ResourceNotFound(_) => StatusCode::IM_A_TEAPOT,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never carries internal detail
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadJson(_) => "Expect valid json payload",
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::NoPayload => "No payload",
            ApiError::BadPublicKey(_) => "Error validating payload, bad public key",
            ApiError::DuplicatedId(_) => "Duplicated Id",
            ApiError::NotFound(_) => "Not Found",
            ApiError::ResourceNotFound(_) => "Resource Not Found",
            ApiError::MethodNotAllowed => "Method Not Allowed",
            ApiError::Unavailable(_) => "Service Unavailable",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidId(reason) => ApiError::BadRequest(reason),
            RegistryError::EmptyPayload => ApiError::NoPayload,
            RegistryError::InvalidKeyEncoding(reason) => ApiError::BadPublicKey(reason),
            RegistryError::DuplicateId(id) => ApiError::DuplicatedId(id),
            RegistryError::NotFound(id) => ApiError::NotFound(id),
            RegistryError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::BadJson(err.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(err: axum::extract::rejection::PathRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_mapping() {
        let cases = [
            (RegistryError::InvalidId("empty".into()), StatusCode::BAD_REQUEST),
            (RegistryError::EmptyPayload, StatusCode::UNPROCESSABLE_ENTITY),
            (RegistryError::InvalidKeyEncoding("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (RegistryError::DuplicateId("a".into()), StatusCode::CONFLICT),
            (RegistryError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (RegistryError::Storage("io".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = ApiError::from(RegistryError::Storage("/var/lib/keys.db: I/O error".into()));
        assert_eq!(err.message(), "Internal Server Error");
    }

    #[test]
    fn test_resource_not_found_is_teapot() {
        let err = ApiError::ResourceNotFound("/api/nothing".into());
        assert_eq!(err.status().as_u16(), 418);
        assert_eq!(err.message(), "Resource Not Found");
    }
}
