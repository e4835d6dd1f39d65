//! App management routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gantry_core::models::App;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating an app.
#[derive(Debug, Deserialize)]
pub struct CreateAppRequest {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for updating an app.
#[derive(Debug, Deserialize)]
pub struct UpdateAppRequest {
    pub name: Option<String>,
    pub region: Option<String>,
}

/// Response for app listing.
#[derive(Debug, Serialize)]
pub struct AppListResponse {
    pub apps: Vec<App>,
}

/// Build the apps router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apps", post(create_app).get(list_apps))
        .route(
            "/apps/{app_id}",
            get(get_app).patch(update_app).delete(delete_app),
        )
}

/// `POST /v1/apps` — create a new app.
async fn create_app(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateAppRequest>,
) -> Result<Json<App>, ApiError> {
    let app = state
        .apps
        .create(identity.account_id, &body.name, &body.region, body.description)
        .await?;
    Ok(Json(app))
}

/// `GET /v1/apps` — list the caller's apps, newest first.
async fn list_apps(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<AppListResponse>, ApiError> {
    let apps = state.apps.list(identity.account_id).await?;
    Ok(Json(AppListResponse { apps }))
}

/// `GET /v1/apps/{app_id}` — get one app.
///
/// Responds 404 whether the app is missing or owned by another account.
async fn get_app(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<App>, ApiError> {
    let app = state
        .apps
        .get(identity.account_id, app_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("app not found".to_owned()))?;
    Ok(Json(app))
}

/// `PATCH /v1/apps/{app_id}` — rename the app or move it to another region.
async fn update_app(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Json(body): Json<UpdateAppRequest>,
) -> Result<Json<App>, ApiError> {
    let app = state
        .apps
        .update_info(identity.account_id, app_id, body.name, body.region)
        .await?;
    Ok(Json(app))
}

/// `DELETE /v1/apps/{app_id}` — delete the app and everything scoped to it.
async fn delete_app(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.apps.delete(identity.account_id, app_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
