//! Signup and session info routes.
//!
//! Signup mints the account's API key and returns it exactly once; only
//! the SHA-256 hash and a display prefix are stored. `/me` reports the
//! identity resolved by the auth middleware.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gantry_core::models::Account;

use crate::auth::{Identity, generate_api_key, hash_token, key_prefix, valid_email};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
}

/// Response for signup (includes the plaintext API key — shown only once).
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub account_id: Uuid,
    pub email: String,
    /// The plaintext API key. Store it securely — it cannot be retrieved again.
    pub api_key: String,
    pub key_prefix: String,
}

/// Response for the `/me` endpoint.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account_id: Uuid,
    pub email: String,
}

/// Build the public auth router (no API key required).
pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/signup", post(signup))
}

/// Build the authenticated auth router.
pub fn router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// `POST /v1/auth/signup` — create an account and mint its API key.
///
/// Returns the plaintext key exactly once. It cannot be retrieved again.
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let email = body.email.trim();
    if !valid_email(email) {
        return Err(ApiError::BadRequest(
            "a valid email address is required".to_owned(),
        ));
    }
    if state.store.account_by_email(email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_owned()));
    }

    let api_key = generate_api_key();
    let account = Account {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        token_hash: hash_token(&api_key),
        token_prefix: key_prefix(&api_key),
        created_at: Utc::now(),
    };
    // A concurrent signup with the same email loses here on the unique
    // constraint and surfaces as the same 409.
    state.store.insert_account(&account).await?;

    tracing::info!(account_id = %account.id, "account created");

    Ok(Json(SignupResponse {
        account_id: account.id,
        email: account.email,
        api_key,
        key_prefix: account.token_prefix,
    }))
}

/// `GET /v1/auth/me` — the authenticated caller's identity.
async fn me(Extension(identity): Extension<Identity>) -> Result<Json<MeResponse>, ApiError> {
    Ok(Json(MeResponse {
        account_id: identity.account_id,
        email: identity.email,
    }))
}
