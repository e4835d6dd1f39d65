//! Append-only event log with synchronous metric rollups.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::apps::require_owner;
use crate::error::CoreError;
use crate::metrics::MetricsAggregator;
use crate::models::{AnalyticsEvent, EventFilter};
use crate::store::Store;

/// Page size applied when a list call passes no explicit limit.
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

/// Append-only record of domain activity per app.
///
/// [`append`](Self::append) is the collaborator surface used by other
/// domain mutations that already verified their caller; it performs no
/// ownership check of its own. [`track`](Self::track) is the public entry
/// point and does.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn Store>,
    aggregator: MetricsAggregator,
}

impl EventLog {
    pub fn new(store: Arc<dyn Store>, aggregator: MetricsAggregator) -> Self {
        Self { store, aggregator }
    }

    /// Inserts one immutable event stamped now, then rolls the occurrence
    /// into the daily metric bucket. The event insert happens before the
    /// rollup; a rollup failure fails the whole append.
    pub async fn append(
        &self,
        app_id: Uuid,
        event_type: &str,
        metadata: Option<Value>,
        user_id: Option<Uuid>,
        deployment_id: Option<Uuid>,
    ) -> Result<(), CoreError> {
        let event = AnalyticsEvent {
            id: Uuid::new_v4(),
            app_id,
            event_type: event_type.to_owned(),
            metadata,
            user_id,
            deployment_id,
            timestamp: Utc::now(),
        };
        self.store.insert_event(&event).await?;
        self.aggregator.record_occurrence(app_id, event_type).await?;
        Ok(())
    }

    /// Ownership-checked wrapper over [`append`](Self::append) for callers
    /// outside the core.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unauthorized`] for foreign apps and
    /// [`CoreError::Validation`] for an empty event type.
    pub async fn track(
        &self,
        caller: Uuid,
        app_id: Uuid,
        event_type: &str,
        metadata: Option<Value>,
        user_id: Option<Uuid>,
        deployment_id: Option<Uuid>,
    ) -> Result<(), CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        if event_type.trim().is_empty() {
            return Err(CoreError::Validation("event type must not be empty".to_owned()));
        }
        self.append(app_id, event_type, metadata, user_id, deployment_id)
            .await
    }

    /// Events for the app, newest first. Type and timestamp-range filters
    /// apply inside the store query, before the limit (default
    /// [`DEFAULT_EVENT_LIMIT`]), so a narrow range never under-returns.
    pub async fn list(
        &self,
        caller: Uuid,
        app_id: Uuid,
        filter: EventFilter,
    ) -> Result<Vec<AnalyticsEvent>, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        Ok(self.store.events_for_app(app_id, &filter).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use serde_json::json;

    use crate::memory::MemoryStore;
    use crate::models::App;

    struct Fixture {
        owner: Uuid,
        app_id: Uuid,
        store: Arc<dyn Store>,
        log: EventLog,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let aggregator = MetricsAggregator::new(Arc::clone(&store));
        let log = EventLog::new(Arc::clone(&store), aggregator);
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
            log,
        }
    }

    fn event_at(app_id: Uuid, event_type: &str, timestamp: DateTime<Utc>) -> AnalyticsEvent {
        AnalyticsEvent {
            id: Uuid::new_v4(),
            app_id,
            event_type: event_type.to_owned(),
            metadata: None,
            user_id: None,
            deployment_id: None,
            timestamp,
        }
    }

    #[tokio::test]
    async fn append_rolls_each_occurrence_into_one_bucket() {
        let f = fixture().await;
        for _ in 0..4 {
            f.log.append(f.app_id, "api_call", None, None, None).await.unwrap();
        }
        let rows = f
            .store
            .metrics_for_app(f.app_id, None, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric_type, "api_calls");
        assert_eq!(rows[0].value, 4);
    }

    #[tokio::test]
    async fn track_requires_ownership_and_a_type() {
        let f = fixture().await;
        let err = f
            .log
            .track(Uuid::new_v4(), f.app_id, "api_call", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        let err = f
            .log
            .track(f.owner, f.app_id, "  ", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        f.log
            .track(f.owner, f.app_id, "user_created", Some(json!({"plan": "free"})), None, None)
            .await
            .unwrap();
        let events = f
            .log
            .list(f.owner, f.app_id, EventFilter::default())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.as_ref().unwrap()["plan"], "free");
    }

    #[tokio::test]
    async fn list_returns_newest_first_with_limit() {
        let f = fixture().await;
        let base = Utc::now();
        for i in 0..5 {
            f.store
                .insert_event(&event_at(f.app_id, "api_call", base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        let filter = EventFilter {
            limit: Some(2),
            ..EventFilter::default()
        };
        let events = f.log.list(f.owner, f.app_id, filter).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, base + Duration::seconds(4));
        assert_eq!(events[1].timestamp, base + Duration::seconds(3));
    }

    #[tokio::test]
    async fn list_filters_by_exact_type() {
        let f = fixture().await;
        let base = Utc::now();
        f.store
            .insert_event(&event_at(f.app_id, "api_call", base))
            .await
            .unwrap();
        f.store
            .insert_event(&event_at(f.app_id, "error", base + Duration::seconds(1)))
            .await
            .unwrap();
        let filter = EventFilter {
            event_type: Some("error".to_owned()),
            ..EventFilter::default()
        };
        let events = f.log.list(f.owner, f.app_id, filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "error");
    }

    #[tokio::test]
    async fn date_range_bounds_the_query_not_the_page() {
        let f = fixture().await;
        let base = Utc::now() - Duration::minutes(10);
        for i in 0..6 {
            f.store
                .insert_event(&event_at(f.app_id, "api_call", base + Duration::minutes(i)))
                .await
                .unwrap();
        }
        // The two oldest events fall inside the range. A small limit must
        // not starve them out in favor of newer, out-of-range rows.
        let filter = EventFilter {
            event_type: None,
            limit: Some(3),
            start: Some(base),
            end: Some(base + Duration::minutes(1)),
        };
        let events = f.log.list(f.owner, f.app_id, filter).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.timestamp <= base + Duration::minutes(1)));
    }

    #[tokio::test]
    async fn range_bounds_are_closed() {
        let f = fixture().await;
        let base = Utc::now();
        for i in 0..3 {
            f.store
                .insert_event(&event_at(f.app_id, "api_call", base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        let filter = EventFilter {
            event_type: None,
            limit: None,
            start: Some(base),
            end: Some(base + Duration::seconds(2)),
        };
        let events = f.log.list(f.owner, f.app_id, filter).await.unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn list_rejects_foreign_callers() {
        let f = fixture().await;
        let err = f
            .log
            .list(Uuid::new_v4(), f.app_id, EventFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }
}
