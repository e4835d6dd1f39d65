//! App directory and the shared ownership guard.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::App;
use crate::store::Store;

/// Confirms that `caller` owns `app_id` and returns the app.
///
/// Missing app and foreign app collapse into the same `Unauthorized`:
/// callers cannot probe for the existence of apps they do not own. Every
/// app-scoped operation calls this before touching data.
///
/// # Errors
///
/// Returns [`CoreError::Unauthorized`] unless the app exists and is owned
/// by `caller`.
pub async fn require_owner(
    store: &dyn Store,
    app_id: Uuid,
    caller: Uuid,
) -> Result<App, CoreError> {
    match store.app(app_id).await? {
        Some(app) if app.owner_id == caller => Ok(app),
        _ => Err(CoreError::Unauthorized(
            "caller does not own this app".to_owned(),
        )),
    }
}

/// CRUD surface for apps themselves.
///
/// Note the absence semantics: unlike the app-scoped engines, which report
/// `Unauthorized` through [`require_owner`], the directory's own lookups
/// treat a foreign app exactly like a missing one (`None` from [`get`],
/// `NotFound` from the mutations). Neither path confirms that a foreign
/// app exists.
///
/// [`get`]: AppDirectory::get
#[derive(Clone)]
pub struct AppDirectory {
    store: Arc<dyn Store>,
}

impl AppDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when `name` or `region` is empty.
    pub async fn create(
        &self,
        owner: Uuid,
        name: &str,
        region: &str,
        description: Option<String>,
    ) -> Result<App, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("app name must not be empty".to_owned()));
        }
        if region.trim().is_empty() {
            return Err(CoreError::Validation("region must not be empty".to_owned()));
        }
        let app = App {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: name.to_owned(),
            region: region.to_owned(),
            description,
            created_at: Utc::now(),
        };
        self.store.insert_app(&app).await?;
        Ok(app)
    }

    /// The caller's apps, newest first.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<App>, CoreError> {
        Ok(self.store.apps_by_owner(owner).await?)
    }

    /// Returns `None` when the app does not exist or belongs to another
    /// account.
    pub async fn get(&self, caller: Uuid, app_id: Uuid) -> Result<Option<App>, CoreError> {
        let app = self.store.app(app_id).await?;
        Ok(app.filter(|a| a.owner_id == caller))
    }

    /// Renames the app or moves it to another region.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when the app is missing or foreign,
    /// [`CoreError::Validation`] when a provided field is empty.
    pub async fn update_info(
        &self,
        caller: Uuid,
        app_id: Uuid,
        name: Option<String>,
        region: Option<String>,
    ) -> Result<App, CoreError> {
        let mut app = self.owned_app(caller, app_id).await?;
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(CoreError::Validation("app name must not be empty".to_owned()));
            }
            app.name = name;
        }
        if let Some(region) = region {
            if region.trim().is_empty() {
                return Err(CoreError::Validation("region must not be empty".to_owned()));
            }
            app.region = region;
        }
        self.store.update_app(&app).await?;
        Ok(app)
    }

    /// Deletes the app along with every record scoped to it: environment
    /// variables, events, metrics, and deployments.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when the app is missing or foreign.
    pub async fn delete(&self, caller: Uuid, app_id: Uuid) -> Result<(), CoreError> {
        let app = self.owned_app(caller, app_id).await?;
        self.store.delete_app(app_id).await?;
        tracing::info!(app_id = %app_id, name = %app.name, "app deleted with all scoped records");
        Ok(())
    }

    async fn owned_app(&self, caller: Uuid, app_id: Uuid) -> Result<App, CoreError> {
        match self.store.app(app_id).await? {
            Some(app) if app.owner_id == caller => Ok(app),
            _ => Err(CoreError::NotFound("app not found".to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::EventFilter;

    fn directory() -> (AppDirectory, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (AppDirectory::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn create_and_list() {
        let (apps, _) = directory();
        let owner = Uuid::new_v4();
        apps.create(owner, "api", "eu-central", None).await.unwrap();
        apps.create(owner, "worker", "us-east", Some("queue draining".to_owned()))
            .await
            .unwrap();
        let listed = apps.list(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(apps.list(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_empty_fields() {
        let (apps, _) = directory();
        let owner = Uuid::new_v4();
        let err = apps.create(owner, "  ", "eu-central", None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = apps.create(owner, "api", "", None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn get_hides_foreign_and_missing_apps_alike() {
        let (apps, _) = directory();
        let owner = Uuid::new_v4();
        let app = apps.create(owner, "api", "eu-central", None).await.unwrap();

        assert!(apps.get(owner, app.id).await.unwrap().is_some());
        assert!(apps.get(Uuid::new_v4(), app.id).await.unwrap().is_none());
        assert!(apps.get(owner, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_info_reports_not_found_for_foreign_apps() {
        let (apps, _) = directory();
        let owner = Uuid::new_v4();
        let app = apps.create(owner, "api", "eu-central", None).await.unwrap();

        let renamed = apps
            .update_info(owner, app.id, Some("api-v2".to_owned()), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "api-v2");
        assert_eq!(renamed.region, "eu-central");

        let err = apps
            .update_info(Uuid::new_v4(), app.id, Some("stolen".to_owned()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_scoped_records() {
        let (apps, store) = directory();
        let owner = Uuid::new_v4();
        let app = apps.create(owner, "api", "eu-central", None).await.unwrap();

        let now = Utc::now();
        store
            .insert_env_var(&crate::models::EnvVar {
                id: Uuid::new_v4(),
                app_id: app.id,
                key: "DB_URL".to_owned(),
                value: "v".to_owned(),
                is_encrypted: false,
                environment: "production".to_owned(),
                description: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        store.bump_metric(app.id, "api_calls", now.date_naive()).await.unwrap();

        apps.delete(owner, app.id).await.unwrap();

        assert!(apps.get(owner, app.id).await.unwrap().is_none());
        assert!(store.env_vars_for_app(app.id, None).await.unwrap().is_empty());
        assert!(
            store
                .events_for_app(app.id, &EventFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn require_owner_rejects_foreign_and_missing() {
        let (apps, store) = directory();
        let owner = Uuid::new_v4();
        let app = apps.create(owner, "api", "eu-central", None).await.unwrap();

        let ok = require_owner(store.as_ref(), app.id, owner).await.unwrap();
        assert_eq!(ok.id, app.id);

        let err = require_owner(store.as_ref(), app.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        let err = require_owner(store.as_ref(), Uuid::new_v4(), owner)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }
}
