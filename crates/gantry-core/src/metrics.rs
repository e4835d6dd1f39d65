//! Daily metric rollups and windowed usage reporting.
//!
//! Rollups are maintained synchronously: every event append bumps exactly
//! one (app, metric type, UTC day) counter through the store's atomic
//! upsert. The summary path deliberately ignores the rollups and re-scans
//! raw events, so it is always consistent with the log; the rollups are a
//! separate, eventually-identical view used for charting trends.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::apps::require_owner;
use crate::error::CoreError;
use crate::models::{AnalyticsMetric, DeploymentStatus, UsageSummary};
use crate::store::Store;

/// Trailing window applied when a range call passes no explicit day count.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Maps a raw event type to the rollup vocabulary. Types outside the table
/// roll up under their own name.
pub fn metric_type_for(event_type: &str) -> &str {
    match event_type {
        "api_call" => "api_calls",
        "error" => "errors",
        "user_login" => "active_users",
        "deployment_created" => "deployments",
        other => other,
    }
}

/// Maintains one counter row per (app, metric type, UTC day) and serves
/// the windowed read paths.
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn Store>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Counts one occurrence of `event_type` in today's UTC bucket.
    pub async fn record_occurrence(&self, app_id: Uuid, event_type: &str) -> Result<(), CoreError> {
        self.record_occurrence_on(app_id, event_type, Utc::now().date_naive())
            .await
    }

    /// Counts one occurrence in an explicit day bucket. Backfill tooling
    /// uses this; [`record_occurrence`](Self::record_occurrence) is the
    /// normal path.
    pub async fn record_occurrence_on(
        &self,
        app_id: Uuid,
        event_type: &str,
        day: NaiveDate,
    ) -> Result<(), CoreError> {
        let metric_type = metric_type_for(event_type);
        self.store.bump_metric(app_id, metric_type, day).await?;
        Ok(())
    }

    /// Rollup rows in the trailing `days` window (default
    /// [`DEFAULT_WINDOW_DAYS`]), optionally narrowed to one metric type,
    /// ordered by date then metric type.
    pub async fn list(
        &self,
        caller: Uuid,
        app_id: Uuid,
        metric_type: Option<&str>,
        days: Option<u32>,
    ) -> Result<Vec<AnalyticsMetric>, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        let since = window_start(days.unwrap_or(DEFAULT_WINDOW_DAYS));
        Ok(self.store.metrics_for_app(app_id, metric_type, since).await?)
    }

    /// Point-in-time report over the trailing window (default
    /// [`DEFAULT_WINDOW_DAYS`]), recomputed from raw events. Deployment
    /// counts are structural, not windowed.
    pub async fn summarize(
        &self,
        caller: Uuid,
        app_id: Uuid,
        days: Option<u32>,
    ) -> Result<UsageSummary, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let since = Utc::now()
            .checked_sub_signed(chrono::Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let events = self.store.events_since(app_id, since).await?;

        let mut total_api_calls = 0u64;
        let mut total_errors = 0u64;
        let mut users: HashSet<Uuid> = HashSet::new();
        for event in &events {
            match event.event_type.as_str() {
                "api_call" => total_api_calls += 1,
                "error" => total_errors += 1,
                _ => {}
            }
            if let Some(user_id) = event.user_id {
                users.insert(user_id);
            }
        }
        let error_rate = if total_api_calls > 0 {
            (total_errors as f64) / (total_api_calls as f64) * 100.0
        } else {
            0.0
        };

        let deployments = self.store.deployments_for_app(app_id).await?;
        let active_deployments = deployments
            .iter()
            .filter(|d| d.status == DeploymentStatus::Active.as_str())
            .count() as u64;

        Ok(UsageSummary {
            total_api_calls,
            total_errors,
            error_rate,
            active_users: users.len() as u64,
            total_deployments: deployments.len() as u64,
            active_deployments,
        })
    }
}

fn window_start(days: u32) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    use crate::events::EventLog;
    use crate::memory::MemoryStore;
    use crate::models::{AnalyticsEvent, App, Deployment};

    struct Fixture {
        owner: Uuid,
        app_id: Uuid,
        store: Arc<dyn Store>,
        aggregator: MetricsAggregator,
        log: EventLog,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let aggregator = MetricsAggregator::new(Arc::clone(&store));
        let log = EventLog::new(Arc::clone(&store), aggregator.clone());
        let owner = Uuid::new_v4();
        let app = App {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "api".to_owned(),
            region: "eu-central".to_owned(),
            description: None,
            created_at: Utc::now(),
        };
        store.insert_app(&app).await.unwrap();
        Fixture {
            owner,
            app_id: app.id,
            store,
            aggregator,
            log,
        }
    }

    fn event_with_user(
        app_id: Uuid,
        event_type: &str,
        user_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    ) -> AnalyticsEvent {
        AnalyticsEvent {
            id: Uuid::new_v4(),
            app_id,
            event_type: event_type.to_owned(),
            metadata: None,
            user_id,
            deployment_id: None,
            timestamp,
        }
    }

    fn deployment(app_id: Uuid, status: DeploymentStatus) -> Deployment {
        Deployment {
            id: Uuid::new_v4(),
            app_id,
            name: "api-prod".to_owned(),
            region: "eu-central".to_owned(),
            url: "https://api-prod.example.dev".to_owned(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_types_map_to_rollup_vocabulary() {
        assert_eq!(metric_type_for("api_call"), "api_calls");
        assert_eq!(metric_type_for("error"), "errors");
        assert_eq!(metric_type_for("user_login"), "active_users");
        assert_eq!(metric_type_for("deployment_created"), "deployments");
        assert_eq!(metric_type_for("env_var_created"), "env_var_created");
    }

    #[tokio::test]
    async fn sequential_occurrences_share_one_bucket() {
        let f = fixture().await;
        let day = Utc::now().date_naive();
        for _ in 0..5 {
            f.aggregator
                .record_occurrence_on(f.app_id, "api_call", day)
                .await
                .unwrap();
        }
        let rows = f
            .aggregator
            .list(f.owner, f.app_id, Some("api_calls"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 5);
        assert_eq!(rows[0].date, day);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_occurrences_do_not_lose_updates() {
        let f = fixture().await;
        let day = Utc::now().date_naive();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let aggregator = f.aggregator.clone();
            let app_id = f.app_id;
            handles.push(tokio::spawn(async move {
                aggregator.record_occurrence_on(app_id, "api_call", day).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = f
            .aggregator
            .list(f.owner, f.app_id, Some("api_calls"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 32);
    }

    #[tokio::test]
    async fn adjacent_days_land_in_distinct_buckets() {
        let f = fixture().await;
        // One second to midnight and one second past it.
        let before: DateTime<Utc> = "2026-03-01T23:59:59Z".parse().unwrap();
        let after: DateTime<Utc> = "2026-03-02T00:00:01Z".parse().unwrap();
        assert_ne!(before.date_naive(), after.date_naive());

        f.aggregator
            .record_occurrence_on(f.app_id, "api_call", before.date_naive())
            .await
            .unwrap();
        f.aggregator
            .record_occurrence_on(f.app_id, "api_call", after.date_naive())
            .await
            .unwrap();

        let rows = f
            .store
            .metrics_for_app(f.app_id, Some("api_calls"), before.date_naive())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.value == 1));
    }

    #[tokio::test]
    async fn list_window_excludes_old_buckets() {
        let f = fixture().await;
        let today = Utc::now().date_naive();
        let stale = today.checked_sub_days(Days::new(40)).unwrap();
        f.aggregator
            .record_occurrence_on(f.app_id, "api_call", today)
            .await
            .unwrap();
        f.aggregator
            .record_occurrence_on(f.app_id, "api_call", stale)
            .await
            .unwrap();

        let rows = f.aggregator.list(f.owner, f.app_id, None, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, today);

        let rows = f
            .aggregator
            .list(f.owner, f.app_id, None, Some(60))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn list_filters_by_metric_type() {
        let f = fixture().await;
        let day = Utc::now().date_naive();
        f.aggregator
            .record_occurrence_on(f.app_id, "api_call", day)
            .await
            .unwrap();
        f.aggregator
            .record_occurrence_on(f.app_id, "error", day)
            .await
            .unwrap();

        let rows = f
            .aggregator
            .list(f.owner, f.app_id, Some("errors"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric_type, "errors");
    }

    #[tokio::test]
    async fn summary_matches_event_counts() {
        let f = fixture().await;
        f.log.append(f.app_id, "api_call", None, None, None).await.unwrap();
        f.log.append(f.app_id, "api_call", None, None, None).await.unwrap();
        f.log.append(f.app_id, "error", None, None, None).await.unwrap();

        let summary = f.aggregator.summarize(f.owner, f.app_id, None).await.unwrap();
        assert_eq!(summary.total_api_calls, 2);
        assert_eq!(summary.total_errors, 1);
        assert!((summary.error_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn summary_error_rate_is_zero_without_api_calls() {
        let f = fixture().await;
        f.log.append(f.app_id, "error", None, None, None).await.unwrap();
        let summary = f.aggregator.summarize(f.owner, f.app_id, None).await.unwrap();
        assert_eq!(summary.total_errors, 1);
        assert!((summary.error_rate - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn summary_counts_distinct_users_across_all_types() {
        let f = fixture().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = Utc::now();
        for (event_type, user) in [
            ("user_login", Some(alice)),
            ("api_call", Some(alice)),
            ("user_created", Some(bob)),
            ("api_call", None),
        ] {
            f.store
                .insert_event(&event_with_user(f.app_id, event_type, user, now))
                .await
                .unwrap();
        }
        let summary = f.aggregator.summarize(f.owner, f.app_id, None).await.unwrap();
        assert_eq!(summary.active_users, 2);
    }

    #[tokio::test]
    async fn summary_reports_structural_deployment_counts() {
        let f = fixture().await;
        for status in [
            DeploymentStatus::Active,
            DeploymentStatus::Stopped,
            DeploymentStatus::Active,
        ] {
            f.store
                .insert_deployment(&deployment(f.app_id, status))
                .await
                .unwrap();
        }
        let summary = f.aggregator.summarize(f.owner, f.app_id, None).await.unwrap();
        assert_eq!(summary.total_deployments, 3);
        assert_eq!(summary.active_deployments, 2);
    }

    #[tokio::test]
    async fn summary_window_excludes_old_events() {
        let f = fixture().await;
        let stale = Utc::now() - Duration::days(40);
        f.store
            .insert_event(&event_with_user(f.app_id, "api_call", None, stale))
            .await
            .unwrap();
        f.log.append(f.app_id, "api_call", None, None, None).await.unwrap();

        let summary = f.aggregator.summarize(f.owner, f.app_id, None).await.unwrap();
        assert_eq!(summary.total_api_calls, 1);

        let summary = f
            .aggregator
            .summarize(f.owner, f.app_id, Some(60))
            .await
            .unwrap();
        assert_eq!(summary.total_api_calls, 2);
    }

    #[tokio::test]
    async fn oversized_windows_clamp_instead_of_failing() {
        let f = fixture().await;
        let stale = Utc::now() - Duration::days(40);
        f.store
            .insert_event(&event_with_user(f.app_id, "api_call", None, stale))
            .await
            .unwrap();
        f.log.append(f.app_id, "api_call", None, None, None).await.unwrap();

        // A day count past the representable date range floors the window
        // instead of erroring out of the call.
        let summary = f
            .aggregator
            .summarize(f.owner, f.app_id, Some(u32::MAX))
            .await
            .unwrap();
        assert_eq!(summary.total_api_calls, 2);

        let rows = f
            .aggregator
            .list(f.owner, f.app_id, Some("api_calls"), Some(u32::MAX))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn reads_reject_foreign_callers() {
        let f = fixture().await;
        let stranger = Uuid::new_v4();
        let err = f.aggregator.list(stranger, f.app_id, None, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        let err = f.aggregator.summarize(stranger, f.app_id, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }
}
