//! In-memory [`Store`] backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::DEFAULT_EVENT_LIMIT;
use crate::models::{
    Account, AnalyticsEvent, AnalyticsMetric, App, Deployment, EnvVar, EventFilter,
};
use crate::store::{Store, StoreError};

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<Uuid, Account>,
    apps: BTreeMap<Uuid, App>,
    env_vars: BTreeMap<Uuid, EnvVar>,
    events: Vec<AnalyticsEvent>,
    metrics: BTreeMap<(Uuid, String, NaiveDate), AnalyticsMetric>,
    deployments: BTreeMap<Uuid, Deployment>,
}

/// Non-persistent store for tests and single-node development.
///
/// Every table lives behind one `RwLock`, which makes `bump_metric` atomic
/// by construction: the whole read-modify-write runs under a single write
/// guard.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .accounts
            .values()
            .any(|a| a.email == account.email || a.token_hash == account.token_hash)
        {
            return Err(StoreError::Conflict(format!(
                "account {} already registered",
                account.email
            )));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn account_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.token_hash == token_hash)
            .cloned())
    }

    async fn insert_app(&self, app: &App) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn app(&self, app_id: Uuid) -> Result<Option<App>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.apps.get(&app_id).cloned())
    }

    async fn apps_by_owner(&self, owner_id: Uuid) -> Result<Vec<App>, StoreError> {
        let tables = self.tables.read().await;
        let mut apps: Vec<App> = tables
            .apps
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn update_app(&self, app: &App) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.apps.contains_key(&app.id) {
            return Err(StoreError::Backend(format!("app {} not present", app.id)));
        }
        tables.apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn delete_app(&self, app_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let existed = tables.apps.remove(&app_id).is_some();
        if existed {
            tables.env_vars.retain(|_, v| v.app_id != app_id);
            tables.events.retain(|e| e.app_id != app_id);
            tables.metrics.retain(|(app, _, _), _| *app != app_id);
            tables.deployments.retain(|_, d| d.app_id != app_id);
        }
        Ok(existed)
    }

    async fn insert_env_var(&self, var: &EnvVar) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.env_vars.values().any(|v| {
            v.app_id == var.app_id && v.key == var.key && v.environment == var.environment
        }) {
            return Err(StoreError::Conflict(format!(
                "environment variable {} already exists for {}",
                var.key, var.environment
            )));
        }
        tables.env_vars.insert(var.id, var.clone());
        Ok(())
    }

    async fn env_var(&self, env_var_id: Uuid) -> Result<Option<EnvVar>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.env_vars.get(&env_var_id).cloned())
    }

    async fn env_var_by_key(
        &self,
        app_id: Uuid,
        key: &str,
        environment: &str,
    ) -> Result<Option<EnvVar>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .env_vars
            .values()
            .find(|v| v.app_id == app_id && v.key == key && v.environment == environment)
            .cloned())
    }

    async fn env_vars_for_app(
        &self,
        app_id: Uuid,
        environment: Option<&str>,
    ) -> Result<Vec<EnvVar>, StoreError> {
        let tables = self.tables.read().await;
        let mut vars: Vec<EnvVar> = tables
            .env_vars
            .values()
            .filter(|v| v.app_id == app_id)
            .filter(|v| environment.is_none_or(|env| v.environment == env))
            .cloned()
            .collect();
        vars.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.environment.cmp(&b.environment)));
        Ok(vars)
    }

    async fn update_env_var(&self, var: &EnvVar) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.env_vars.contains_key(&var.id) {
            return Err(StoreError::Backend(format!(
                "environment variable {} not present",
                var.id
            )));
        }
        tables.env_vars.insert(var.id, var.clone());
        Ok(())
    }

    async fn delete_env_var(&self, env_var_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.env_vars.remove(&env_var_id).is_some())
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.events.push(event.clone());
        Ok(())
    }

    async fn events_for_app(
        &self,
        app_id: Uuid,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEvent>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<AnalyticsEvent> = tables
            .events
            .iter()
            .filter(|e| e.app_id == app_id)
            .filter(|e| {
                filter
                    .event_type
                    .as_deref()
                    .is_none_or(|t| e.event_type == t)
            })
            .filter(|e| filter.start.is_none_or(|start| e.timestamp >= start))
            .filter(|e| filter.end.is_none_or(|end| e.timestamp <= end))
            .cloned()
            .collect();
        // Stable sort, then reverse: equal timestamps come back most
        // recently inserted first.
        events.sort_by_key(|e| e.timestamp);
        events.reverse();
        events.truncate(filter.limit.unwrap_or(DEFAULT_EVENT_LIMIT) as usize);
        Ok(events)
    }

    async fn events_since(
        &self,
        app_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<AnalyticsEvent> = tables
            .events
            .iter()
            .filter(|e| e.app_id == app_id && e.timestamp >= since)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn bump_metric(
        &self,
        app_id: Uuid,
        metric_type: &str,
        day: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables
            .metrics
            .entry((app_id, metric_type.to_owned(), day))
            .and_modify(|m| {
                m.value += 1;
                m.updated_at = now;
            })
            .or_insert_with(|| AnalyticsMetric {
                id: Uuid::new_v4(),
                app_id,
                metric_type: metric_type.to_owned(),
                date: day,
                value: 1,
                updated_at: now,
            });
        Ok(())
    }

    async fn metrics_for_app(
        &self,
        app_id: Uuid,
        metric_type: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<AnalyticsMetric>, StoreError> {
        let tables = self.tables.read().await;
        let mut metrics: Vec<AnalyticsMetric> = tables
            .metrics
            .values()
            .filter(|m| m.app_id == app_id && m.date >= since)
            .filter(|m| metric_type.is_none_or(|t| m.metric_type == t))
            .cloned()
            .collect();
        metrics.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.metric_type.cmp(&b.metric_type))
        });
        Ok(metrics)
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.deployments.insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn deployments_for_app(&self, app_id: Uuid) -> Result<Vec<Deployment>, StoreError> {
        let tables = self.tables.read().await;
        let mut deployments: Vec<Deployment> = tables
            .deployments
            .values()
            .filter(|d| d.app_id == app_id)
            .cloned()
            .collect();
        deployments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(deployments)
    }
}
