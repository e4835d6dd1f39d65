//! Persistence seam for the control plane.
//!
//! [`Store`] is a domain-shaped trait: engines call it with records, not
//! bytes, and every backend (in-memory here, PostgreSQL in
//! `gantry-storage`) implements the same contracts for uniqueness,
//! ordering, and atomicity documented on each method.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    Account, AnalyticsEvent, AnalyticsMetric, App, Deployment, EnvVar, EventFilter,
};

/// Error surface of a [`Store`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed to execute the operation.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Backing store for accounts, apps, environment variables, events, daily
/// metric rollups, and deployments.
///
/// Implementations must be safe to share across async tasks behind an
/// `Arc`. List methods document their ordering; engines rely on it.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // --- accounts

    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the email or token hash is
    /// already registered.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Resolves the account holding a given API-key hash. The hot path of
    /// request authentication.
    async fn account_by_token_hash(&self, token_hash: &str)
    -> Result<Option<Account>, StoreError>;

    // --- apps

    async fn insert_app(&self, app: &App) -> Result<(), StoreError>;

    async fn app(&self, app_id: Uuid) -> Result<Option<App>, StoreError>;

    /// All apps owned by one account, newest first.
    async fn apps_by_owner(&self, owner_id: Uuid) -> Result<Vec<App>, StoreError>;

    /// Replaces the stored app row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when no row with the app's id exists.
    async fn update_app(&self, app: &App) -> Result<(), StoreError>;

    /// Deletes the app and every record scoped to it: environment
    /// variables, events, metrics, and deployments. Returns whether the
    /// app existed.
    async fn delete_app(&self, app_id: Uuid) -> Result<bool, StoreError>;

    // --- environment variables

    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the (app, key, environment)
    /// triple is already taken.
    async fn insert_env_var(&self, var: &EnvVar) -> Result<(), StoreError>;

    async fn env_var(&self, env_var_id: Uuid) -> Result<Option<EnvVar>, StoreError>;

    /// Exact-match lookup by the unique (app, key, environment) triple.
    async fn env_var_by_key(
        &self,
        app_id: Uuid,
        key: &str,
        environment: &str,
    ) -> Result<Option<EnvVar>, StoreError>;

    /// The app's variables, optionally narrowed to one environment value,
    /// ordered by key then environment.
    async fn env_vars_for_app(
        &self,
        app_id: Uuid,
        environment: Option<&str>,
    ) -> Result<Vec<EnvVar>, StoreError>;

    /// Replaces the stored row. Uniqueness of a moved (key, environment)
    /// pair is the engine's concern; backends only persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when no row with the record's id
    /// exists.
    async fn update_env_var(&self, var: &EnvVar) -> Result<(), StoreError>;

    /// Returns whether a row was deleted.
    async fn delete_env_var(&self, env_var_id: Uuid) -> Result<bool, StoreError>;

    // --- analytics events

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StoreError>;

    /// Events for the app, newest first; ties broken by insertion recency.
    /// Type and timestamp-range filters apply inside the query, before the
    /// limit (default [`crate::events::DEFAULT_EVENT_LIMIT`]).
    async fn events_for_app(
        &self,
        app_id: Uuid,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEvent>, StoreError>;

    /// All events stamped at or after `since`, oldest first. Feeds the
    /// usage summary fold.
    async fn events_since(
        &self,
        app_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, StoreError>;

    // --- daily metric rollups

    /// Creates the (app, metric type, day) bucket with `value = 1` or
    /// increments it by exactly 1, refreshing `updated_at`.
    ///
    /// This must be a single atomic step: concurrent calls on one bucket
    /// must not lose increments.
    async fn bump_metric(
        &self,
        app_id: Uuid,
        metric_type: &str,
        day: NaiveDate,
    ) -> Result<(), StoreError>;

    /// Rollup rows with `date >= since`, optionally narrowed to one metric
    /// type, ordered by date then metric type.
    async fn metrics_for_app(
        &self,
        app_id: Uuid,
        metric_type: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<AnalyticsMetric>, StoreError>;

    // --- deployments

    async fn insert_deployment(&self, deployment: &Deployment) -> Result<(), StoreError>;

    /// The app's deployments, oldest first.
    async fn deployments_for_app(&self, app_id: Uuid) -> Result<Vec<Deployment>, StoreError>;
}
