//! Analytics metrics routes.
//!
//! `/metrics` serves the daily rollup rows for charting; `/metrics/summary`
//! recomputes a point-in-time report from raw events.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gantry_core::models::{AnalyticsMetric, UsageSummary};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for metric listing.
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub metric_type: Option<String>,
    pub days: Option<u32>,
}

/// Query parameters for the usage summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<u32>,
}

/// Response for metric listing.
#[derive(Debug, Serialize)]
pub struct MetricListResponse {
    pub metrics: Vec<AnalyticsMetric>,
}

/// Build the metrics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apps/{app_id}/metrics", get(list_metrics))
        .route("/apps/{app_id}/metrics/summary", get(usage_summary))
}

/// `GET /v1/apps/{app_id}/metrics` — daily rollup rows in the trailing
/// window (default 30 days).
async fn list_metrics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricListResponse>, ApiError> {
    let metrics = state
        .metrics
        .list(
            identity.account_id,
            app_id,
            query.metric_type.as_deref(),
            query.days,
        )
        .await?;
    Ok(Json(MetricListResponse { metrics }))
}

/// `GET /v1/apps/{app_id}/metrics/summary` — usage report over the
/// trailing window, recomputed from raw events.
async fn usage_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<UsageSummary>, ApiError> {
    let summary = state
        .metrics
        .summarize(identity.account_id, app_id, query.days)
        .await?;
    Ok(Json(summary))
}
