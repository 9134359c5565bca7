//! HTTP middleware for the API layer.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::app::AppState;

/// Constant-time comparison of two byte slices to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// API key authentication middleware for admin routes.
/// Requires a valid `x-api-key` header on every wrapped request.
/// Uses constant-time comparison (via SHA-256 digest) to prevent timing attacks.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    let Some(provided) = api_key_header else {
        warn!("API auth failed: missing x-api-key header");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    let expected = state.api_auth_key.expose_secret().as_bytes();

    // Compare via SHA-256 digests so the comparison length never depends
    // on the secret.
    let expected_hash = Sha256::digest(expected);
    let provided_hash = Sha256::digest(provided.as_bytes());

    if !constant_time_eq(expected_hash.as_slice(), provided_hash.as_slice()) {
        warn!("API auth failed: invalid x-api-key");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    next.run(request).await
}
