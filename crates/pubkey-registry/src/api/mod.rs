//! API module for the key registry server

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use error::ApiError;
use handlers::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub key_count: usize,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: pubkey_core::VERSION.into(),
    })
}

/// Readiness check endpoint; fails when the store cannot be read
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Result<Json<ReadyResponse>, ApiError> {
    let key_count = state
        .registry
        .count()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok(Json(ReadyResponse {
        ready: true,
        key_count,
    }))
}

/// API paths get JSON error envelopes, everything else plain text
pub fn is_api_path(path: &str) -> bool {
    let mut path = path.to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    path.contains("/api/")
}

async fn not_found(uri: Uri) -> Response {
    if is_api_path(uri.path()) {
        ApiError::ResourceNotFound(uri.path().to_string()).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

async fn method_not_allowed(uri: Uri) -> Response {
    if is_api_path(uri.path()) {
        ApiError::MethodNotAllowed.into_response()
    } else {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response()
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Key endpoints
        // `add` is dispatched inside the POST handler so that a record whose
        // id is literally "add" stays reachable through GET
        .route(
            "/api/keys/{id}",
            get(handlers::get_key).post(handlers::add_key),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path_detection() {
        assert!(is_api_path("/api/keys/x"));
        assert!(is_api_path("/api"));
        assert!(is_api_path("/v2/api/"));
        assert!(!is_api_path("/"));
        assert!(!is_api_path("/apix"));
        assert!(!is_api_path("/health"));
    }
}
