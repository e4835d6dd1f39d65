//! PostgreSQL [`Store`] backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gantry_core::events::DEFAULT_EVENT_LIMIT;
use gantry_core::models::{
    Account, AnalyticsEvent, AnalyticsMetric, App, Deployment, EnvVar, EventFilter,
};
use gantry_core::store::{Store, StoreError};

/// Statements run at connect time. Each is idempotent, so reconnecting
/// against an existing database is a no-op.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        token_hash TEXT NOT NULL UNIQUE,
        token_prefix TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS apps (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        region TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_apps_owner ON apps (owner_id)",
    "CREATE TABLE IF NOT EXISTS environment_variables (
        id UUID PRIMARY KEY,
        app_id UUID NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        is_encrypted BOOLEAN NOT NULL,
        environment TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        UNIQUE (app_id, key, environment)
    )",
    "CREATE TABLE IF NOT EXISTS analytics_events (
        id UUID PRIMARY KEY,
        seq BIGSERIAL,
        app_id UUID NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL,
        metadata JSONB,
        user_id UUID,
        deployment_id UUID,
        timestamp TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_events_app_type_time
        ON analytics_events (app_id, event_type, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_events_app_time
        ON analytics_events (app_id, timestamp)",
    "CREATE TABLE IF NOT EXISTS analytics_metrics (
        id UUID NOT NULL,
        app_id UUID NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
        metric_type TEXT NOT NULL,
        date DATE NOT NULL,
        value BIGINT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (app_id, metric_type, date)
    )",
    "CREATE TABLE IF NOT EXISTS deployments (
        id UUID PRIMARY KEY,
        app_id UUID NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        region TEXT NOT NULL,
        url TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_deployments_app ON deployments (app_id)",
];

/// A [`Store`] backed by PostgreSQL.
///
/// Thread-safe via `PgPool`; all operations are fully async.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Connects to PostgreSQL and bootstraps the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the connection or any schema
    /// statement fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(format!("connection failed: {e}")))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StoreError::Backend(format!("schema bootstrap failed: {e}")))?;
        }
        tracing::debug!(statements = SCHEMA.len(), "schema bootstrap complete");

        Ok(Self { pool })
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db.message().to_owned())
        }
        _ => StoreError::Backend(format!("database error: {err}")),
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    token_hash: String,
    token_prefix: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            token_hash: row.token_hash,
            token_prefix: row.token_prefix,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AppRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    region: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AppRow> for App {
    fn from(row: AppRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            region: row.region,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EnvVarRow {
    id: Uuid,
    app_id: Uuid,
    key: String,
    value: String,
    is_encrypted: bool,
    environment: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EnvVarRow> for EnvVar {
    fn from(row: EnvVarRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            key: row.key,
            value: row.value,
            is_encrypted: row.is_encrypted,
            environment: row.environment,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    app_id: Uuid,
    event_type: String,
    metadata: Option<serde_json::Value>,
    user_id: Option<Uuid>,
    deployment_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
}

impl From<EventRow> for AnalyticsEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            event_type: row.event_type,
            metadata: row.metadata,
            user_id: row.user_id,
            deployment_id: row.deployment_id,
            timestamp: row.timestamp,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    id: Uuid,
    app_id: Uuid,
    metric_type: String,
    date: NaiveDate,
    value: i64,
    updated_at: DateTime<Utc>,
}

impl From<MetricRow> for AnalyticsMetric {
    fn from(row: MetricRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            metric_type: row.metric_type,
            date: row.date,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: Uuid,
    app_id: Uuid,
    name: String,
    region: String,
    url: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<DeploymentRow> for Deployment {
    fn from(row: DeploymentRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            name: row.name,
            region: row.region,
            url: row.url,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO accounts (id, email, token_hash, token_prefix, created_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.token_hash)
        .bind(&account.token_prefix)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Account::from))
    }

    async fn account_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Account::from))
    }

    async fn insert_app(&self, app: &App) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO apps (id, owner_id, name, region, description, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(app.id)
        .bind(app.owner_id)
        .bind(&app.name)
        .bind(&app.region)
        .bind(&app.description)
        .bind(app.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn app(&self, app_id: Uuid) -> Result<Option<App>, StoreError> {
        let row = sqlx::query_as::<_, AppRow>("SELECT * FROM apps WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(App::from))
    }

    async fn apps_by_owner(&self, owner_id: Uuid) -> Result<Vec<App>, StoreError> {
        let rows = sqlx::query_as::<_, AppRow>(
            "SELECT * FROM apps WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(App::from).collect())
    }

    async fn update_app(&self, app: &App) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE apps SET name = $2, region = $3, description = $4 WHERE id = $1",
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.region)
        .bind(&app.description)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("app {} not present", app.id)));
        }
        Ok(())
    }

    async fn delete_app(&self, app_id: Uuid) -> Result<bool, StoreError> {
        // Child rows go with the app via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(app_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_env_var(&self, var: &EnvVar) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO environment_variables
                  (id, app_id, key, value, is_encrypted, environment, description,
                   created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(var.id)
        .bind(var.app_id)
        .bind(&var.key)
        .bind(&var.value)
        .bind(var.is_encrypted)
        .bind(&var.environment)
        .bind(&var.description)
        .bind(var.created_at)
        .bind(var.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn env_var(&self, env_var_id: Uuid) -> Result<Option<EnvVar>, StoreError> {
        let row =
            sqlx::query_as::<_, EnvVarRow>("SELECT * FROM environment_variables WHERE id = $1")
                .bind(env_var_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(EnvVar::from))
    }

    async fn env_var_by_key(
        &self,
        app_id: Uuid,
        key: &str,
        environment: &str,
    ) -> Result<Option<EnvVar>, StoreError> {
        let row = sqlx::query_as::<_, EnvVarRow>(
            r"SELECT * FROM environment_variables
              WHERE app_id = $1 AND key = $2 AND environment = $3",
        )
        .bind(app_id)
        .bind(key)
        .bind(environment)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(EnvVar::from))
    }

    async fn env_vars_for_app(
        &self,
        app_id: Uuid,
        environment: Option<&str>,
    ) -> Result<Vec<EnvVar>, StoreError> {
        let rows = sqlx::query_as::<_, EnvVarRow>(
            r"SELECT * FROM environment_variables
              WHERE app_id = $1 AND ($2::text IS NULL OR environment = $2)
              ORDER BY key, environment",
        )
        .bind(app_id)
        .bind(environment)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(EnvVar::from).collect())
    }

    async fn update_env_var(&self, var: &EnvVar) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE environment_variables
              SET key = $2, value = $3, is_encrypted = $4, environment = $5,
                  description = $6, updated_at = $7
              WHERE id = $1",
        )
        .bind(var.id)
        .bind(&var.key)
        .bind(&var.value)
        .bind(var.is_encrypted)
        .bind(&var.environment)
        .bind(&var.description)
        .bind(var.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!(
                "environment variable {} not present",
                var.id
            )));
        }
        Ok(())
    }

    async fn delete_env_var(&self, env_var_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM environment_variables WHERE id = $1")
            .bind(env_var_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO analytics_events
                  (id, app_id, event_type, metadata, user_id, deployment_id, timestamp)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id)
        .bind(event.app_id)
        .bind(&event.event_type)
        .bind(&event.metadata)
        .bind(event.user_id)
        .bind(event.deployment_id)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn events_for_app(
        &self,
        app_id: Uuid,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEvent>, StoreError> {
        // Filters are bound into the query so the limit applies after
        // them; `seq` breaks timestamp ties by insertion recency.
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, app_id, event_type, metadata, user_id, deployment_id, timestamp
              FROM analytics_events
              WHERE app_id = $1
                AND ($2::text IS NULL OR event_type = $2)
                AND ($3::timestamptz IS NULL OR timestamp >= $3)
                AND ($4::timestamptz IS NULL OR timestamp <= $4)
              ORDER BY timestamp DESC, seq DESC
              LIMIT $5",
        )
        .bind(app_id)
        .bind(filter.event_type.as_deref())
        .bind(filter.start)
        .bind(filter.end)
        .bind(i64::from(filter.limit.unwrap_or(DEFAULT_EVENT_LIMIT)))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(AnalyticsEvent::from).collect())
    }

    async fn events_since(
        &self,
        app_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, app_id, event_type, metadata, user_id, deployment_id, timestamp
              FROM analytics_events
              WHERE app_id = $1 AND timestamp >= $2
              ORDER BY timestamp, seq",
        )
        .bind(app_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(AnalyticsEvent::from).collect())
    }

    async fn bump_metric(
        &self,
        app_id: Uuid,
        metric_type: &str,
        day: NaiveDate,
    ) -> Result<(), StoreError> {
        // One statement, so concurrent bumps on the same bucket serialize
        // inside PostgreSQL instead of racing a read-then-write.
        sqlx::query(
            r"INSERT INTO analytics_metrics (id, app_id, metric_type, date, value, updated_at)
              VALUES ($1, $2, $3, $4, 1, now())
              ON CONFLICT (app_id, metric_type, date) DO UPDATE SET
                value = analytics_metrics.value + 1,
                updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(app_id)
        .bind(metric_type)
        .bind(day)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn metrics_for_app(
        &self,
        app_id: Uuid,
        metric_type: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<AnalyticsMetric>, StoreError> {
        let rows = sqlx::query_as::<_, MetricRow>(
            r"SELECT * FROM analytics_metrics
              WHERE app_id = $1
                AND ($2::text IS NULL OR metric_type = $2)
                AND date >= $3
              ORDER BY date, metric_type",
        )
        .bind(app_id)
        .bind(metric_type)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(AnalyticsMetric::from).collect())
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO deployments (id, app_id, name, region, url, status, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(deployment.id)
        .bind(deployment.app_id)
        .bind(&deployment.name)
        .bind(&deployment.region)
        .bind(&deployment.url)
        .bind(&deployment.status)
        .bind(deployment.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn deployments_for_app(&self, app_id: Uuid) -> Result<Vec<Deployment>, StoreError> {
        let rows = sqlx::query_as::<_, DeploymentRow>(
            "SELECT * FROM deployments WHERE app_id = $1 ORDER BY created_at",
        )
        .bind(app_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Deployment::from).collect())
    }
}
