//! Environment variable routes.
//!
//! List and create are app-scoped; get, patch, and delete address a
//! record by its own id. Encrypted values come back masked, with the
//! decoded plaintext in `decrypted_value` for edit forms.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gantry_core::models::{EnvVarPatch, EnvVarView, ImportOutcome, NewEnvVar};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for variable listing.
#[derive(Debug, Deserialize)]
pub struct EnvVarQuery {
    pub environment: Option<String>,
}

/// Request body for bulk import.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub variables: Vec<NewEnvVar>,
}

/// Response for variable creation.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Response for variable listing.
#[derive(Debug, Serialize)]
pub struct EnvVarListResponse {
    pub variables: Vec<EnvVarView>,
}

/// Response for bulk import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub results: Vec<ImportOutcome>,
}

/// Build the environment variables router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/apps/{app_id}/env-vars",
            post(create_env_var).get(list_env_vars),
        )
        .route("/apps/{app_id}/env-vars/import", post(import_env_vars))
        .route(
            "/env-vars/{env_var_id}",
            get(get_env_var).patch(update_env_var).delete(delete_env_var),
        )
}

/// `POST /v1/apps/{app_id}/env-vars` — create one variable.
async fn create_env_var(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Json(body): Json<NewEnvVar>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let id = state
        .env_vars
        .create(identity.account_id, app_id, body)
        .await?;
    Ok(Json(CreatedResponse { id }))
}

/// `GET /v1/apps/{app_id}/env-vars` — list variables, optionally narrowed
/// to one environment.
async fn list_env_vars(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<EnvVarQuery>,
) -> Result<Json<EnvVarListResponse>, ApiError> {
    let variables = state
        .env_vars
        .list(identity.account_id, app_id, query.environment.as_deref())
        .await?;
    Ok(Json(EnvVarListResponse { variables }))
}

/// `POST /v1/apps/{app_id}/env-vars/import` — bulk upsert keyed by
/// (key, environment).
///
/// Entries apply in order; a failing entry aborts the rest of the batch
/// but keeps what was already applied.
async fn import_env_vars(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let results = state
        .env_vars
        .bulk_import(identity.account_id, app_id, body.variables)
        .await?;
    Ok(Json(ImportResponse { results }))
}

/// `GET /v1/env-vars/{env_var_id}` — get one variable's masked view.
async fn get_env_var(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(env_var_id): Path<Uuid>,
) -> Result<Json<EnvVarView>, ApiError> {
    let view = state.env_vars.get(identity.account_id, env_var_id).await?;
    Ok(Json(view))
}

/// `PATCH /v1/env-vars/{env_var_id}` — apply a partial update.
async fn update_env_var(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(env_var_id): Path<Uuid>,
    Json(patch): Json<EnvVarPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .env_vars
        .update(identity.account_id, env_var_id, patch)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `DELETE /v1/env-vars/{env_var_id}` — delete one variable.
async fn delete_env_var(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(env_var_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .env_vars
        .remove(identity.account_id, env_var_id)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
