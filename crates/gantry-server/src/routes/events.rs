//! Analytics event routes.

use axum::extract::{Path, Query, State};
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gantry_core::models::{AnalyticsEvent, EventFilter};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for recording an event.
#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    pub event_type: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub deployment_id: Option<Uuid>,
}

/// Query parameters for event listing. `start`/`end` are RFC 3339
/// timestamps bounding the range (closed on both ends) inside the store
/// query, before the limit.
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Response for event listing.
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<AnalyticsEvent>,
}

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new().route("/apps/{app_id}/events", post(track_event).get(list_events))
}

/// `POST /v1/apps/{app_id}/events` — record one event.
///
/// The event is stamped server-side and rolled into the daily metric
/// bucket in the same call.
async fn track_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Json(body): Json<TrackEventRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .events
        .track(
            identity.account_id,
            app_id,
            &body.event_type,
            body.metadata,
            body.user_id,
            body.deployment_id,
        )
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `GET /v1/apps/{app_id}/events` — list events, newest first.
async fn list_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<EventQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let filter = EventFilter {
        event_type: query.event_type,
        limit: query.limit,
        start: query.start,
        end: query.end,
    };
    let events = state
        .events
        .list(identity.account_id, app_id, filter)
        .await?;
    Ok(Json(EventListResponse { events }))
}
