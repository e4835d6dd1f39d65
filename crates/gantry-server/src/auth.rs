//! API-key authentication.
//!
//! Accounts authenticate with a `gk_`-prefixed API key sent as
//! `Authorization: Bearer gk_<token>`. Keys are SHA-256 hashed before
//! storage (never stored plaintext); the middleware hashes the presented
//! key and resolves it to an account.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity of the authenticated caller, injected into request extensions.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
}

/// Hash an API key with SHA-256 for storage/lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

/// Generate a new API key string.
///
/// Format: `gk_<32 hex chars>` (128 bits of randomness from UUID v4).
#[must_use]
pub fn generate_api_key() -> String {
    let id = Uuid::new_v4();
    format!("gk_{}", id.as_simple())
}

/// Extract the key prefix for display (first 12 chars).
#[must_use]
pub fn key_prefix(key: &str) -> String {
    let end = key.len().min(12);
    format!("{}...", &key[..end])
}

/// Minimal shape check for signup emails: something before the `@`, a dot
/// somewhere inside the domain.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Axum middleware that authenticates API requests.
///
/// Injects [`Identity`] into request extensions on success.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] if the `Authorization` header is
/// missing, malformed, or does not resolve to an account.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let Some(header) = auth_header else {
        return Err(ApiError::Unauthorized(
            "missing Authorization header".to_owned(),
        ));
    };

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized("Authorization header must use Bearer scheme".to_owned())
    })?;

    let token_hash = hash_token(token);
    let account = state
        .store
        .account_by_token_hash(&token_hash)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid API key".to_owned()))?;

    req.extensions_mut().insert(Identity {
        account_id: account.id,
        email: account.email,
    });

    Ok(next.run(req).await)
}
