//! Domain records for the gantry control plane.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant-scoped project container. Apps own environment variables,
/// deployments, and analytics data; the owning account is the sole
/// authorized mutator of everything beneath them.
#[derive(Debug, Clone, Serialize)]
pub struct App {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub region: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An API-key account. The key itself is shown once at signup; only its
/// SHA-256 hash and a display prefix are stored.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub token_hash: String,
    pub token_prefix: String,
    pub created_at: DateTime<Utc>,
}

/// A per-app, per-environment key/value record. `value` holds either the
/// plaintext or, when `is_encrypted` is set, the codec-encoded form.
#[derive(Debug, Clone)]
pub struct EnvVar {
    pub id: Uuid,
    pub app_id: Uuid,
    pub key: String,
    pub value: String,
    pub is_encrypted: bool,
    pub environment: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Masked projection of an [`EnvVar`] for list and display contexts.
///
/// For encrypted records `value` carries a fixed placeholder while
/// `decrypted_value` carries the decoded plaintext for edit forms. For
/// plaintext records the two fields are identical.
#[derive(Debug, Clone, Serialize)]
pub struct EnvVarView {
    pub id: Uuid,
    pub app_id: Uuid,
    pub key: String,
    pub value: String,
    pub decrypted_value: String,
    pub is_encrypted: bool,
    pub environment: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating one environment variable, also the entry shape for
/// bulk import.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEnvVar {
    pub key: String,
    pub value: String,
    pub environment: String,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update for an environment variable. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvVarPatch {
    pub key: Option<String>,
    pub value: Option<String>,
    pub is_encrypted: Option<bool>,
    pub environment: Option<String>,
    pub description: Option<String>,
}

/// What happened to one bulk-import entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    Updated,
}

/// Per-entry result of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub key: String,
    pub action: ImportAction,
}

/// One immutable record of domain activity, scoped to an app and
/// optionally to a user or deployment.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub app_id: Uuid,
    pub event_type: String,
    pub metadata: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub deployment_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// Filter for event listing. `start`/`end` bound the timestamp range
/// (closed on both ends) inside the store query, before the limit.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// One daily counter row. Exactly one exists per (app, metric type, date)
/// bucket; `value` only ever grows.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsMetric {
    pub id: Uuid,
    pub app_id: Uuid,
    pub metric_type: String,
    pub date: NaiveDate,
    pub value: i64,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time usage report over a trailing window, recomputed from raw
/// events rather than the daily rollups.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub total_api_calls: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    pub active_users: u64,
    pub total_deployments: u64,
    pub active_deployments: u64,
}

/// A deployed instance of an app. Lifecycle management lives outside this
/// system; records exist so usage summaries can report real counts.
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub region: String,
    pub url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle states stored in [`Deployment::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Active,
    Stopped,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown deployment status: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deployment_status_round_trips_through_strings() {
        for status in [
            DeploymentStatus::Active,
            DeploymentStatus::Stopped,
            DeploymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<DeploymentStatus>().unwrap(), status);
        }
        assert!("paused".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn import_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ImportAction::Created).unwrap(),
            "\"created\""
        );
        assert_eq!(
            serde_json::to_string(&ImportAction::Updated).unwrap(),
            "\"updated\""
        );
    }
}
