//! Environment variable management: CRUD, masked views, and bulk import.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::apps::require_owner;
use crate::codec;
use crate::error::CoreError;
use crate::events::EventLog;
use crate::models::{EnvVar, EnvVarPatch, EnvVarView, ImportAction, ImportOutcome, NewEnvVar};
use crate::store::{Store, StoreError};

/// Placeholder shown in place of an encrypted value in list and display
/// views.
pub const MASKED_VALUE: &str = "••••••••";

/// Per-app, per-environment key/value store with optional value
/// obfuscation.
///
/// Every operation verifies app ownership before reading or writing, and
/// every mutation emits an audit event through the [`EventLog`].
#[derive(Clone)]
pub struct EnvVarStore {
    store: Arc<dyn Store>,
    events: EventLog,
}

impl EnvVarStore {
    pub fn new(store: Arc<dyn Store>, events: EventLog) -> Self {
        Self { store, events }
    }

    /// The app's variables as masked views, optionally narrowed to one
    /// environment, ordered by key then environment.
    pub async fn list(
        &self,
        caller: Uuid,
        app_id: Uuid,
        environment: Option<&str>,
    ) -> Result<Vec<EnvVarView>, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        let vars = self.store.env_vars_for_app(app_id, environment).await?;
        Ok(vars.into_iter().map(masked_view).collect())
    }

    /// One record's masked view, `decrypted_value` included.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when the id does not resolve,
    /// [`CoreError::Unauthorized`] when the resolving app is foreign.
    pub async fn get(&self, caller: Uuid, env_var_id: Uuid) -> Result<EnvVarView, CoreError> {
        let var = self.fetch_owned(caller, env_var_id).await?;
        Ok(masked_view(var))
    }

    /// Creates one variable and returns its id. The stored value is
    /// codec-encoded when `is_encrypted` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] when the (key, environment)
    /// pair is already taken within the app.
    pub async fn create(
        &self,
        caller: Uuid,
        app_id: Uuid,
        new: NewEnvVar,
    ) -> Result<Uuid, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        validate_entry(&new)?;
        if self
            .store
            .env_var_by_key(app_id, &new.key, &new.environment)
            .await?
            .is_some()
        {
            return Err(CoreError::DuplicateKey {
                key: new.key,
                environment: new.environment,
            });
        }
        let now = Utc::now();
        let var = EnvVar {
            id: Uuid::new_v4(),
            app_id,
            key: new.key,
            value: stored_value(&new.value, new.is_encrypted),
            is_encrypted: new.is_encrypted,
            environment: new.environment,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_env_var(&var).await {
            Ok(()) => {}
            // Lost the race between the lookup above and the insert.
            Err(StoreError::Conflict(_)) => {
                return Err(CoreError::DuplicateKey {
                    key: var.key,
                    environment: var.environment,
                });
            }
            Err(err) => return Err(err.into()),
        }
        self.events
            .append(
                app_id,
                "env_var_created",
                Some(json!({"key": &var.key, "environment": &var.environment})),
                None,
                None,
            )
            .await?;
        Ok(var.id)
    }

    /// Applies a partial update. When `value` is present, the effective
    /// encryption state is `patch.is_encrypted` if given, else the
    /// record's current flag; the value is re-encoded accordingly and the
    /// flag updated to match. `updated_at` refreshes on every call.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Unauthorized` as in [`get`](Self::get);
    /// [`CoreError::DuplicateKey`] when the patch would move the record
    /// onto a (key, environment) pair held by another record.
    pub async fn update(
        &self,
        caller: Uuid,
        env_var_id: Uuid,
        patch: EnvVarPatch,
    ) -> Result<(), CoreError> {
        let var = self.fetch_owned(caller, env_var_id).await?;
        let mut updated = var.clone();

        if let Some(key) = patch.key {
            if key.trim().is_empty() {
                return Err(CoreError::Validation("key must not be empty".to_owned()));
            }
            updated.key = key;
        }
        if let Some(environment) = patch.environment {
            if environment.trim().is_empty() {
                return Err(CoreError::Validation(
                    "environment must not be empty".to_owned(),
                ));
            }
            updated.environment = environment;
        }
        if let Some(description) = patch.description {
            updated.description = Some(description);
        }
        if let Some(is_encrypted) = patch.is_encrypted {
            updated.is_encrypted = is_encrypted;
        }
        if let Some(value) = patch.value {
            if value.is_empty() {
                return Err(CoreError::Validation("value must not be empty".to_owned()));
            }
            let encrypt = patch.is_encrypted.unwrap_or(var.is_encrypted);
            updated.value = stored_value(&value, encrypt);
            updated.is_encrypted = encrypt;
        }

        if updated.key != var.key || updated.environment != var.environment {
            // Moving onto a pair held by another record would break the
            // per-app uniqueness invariant.
            if let Some(existing) = self
                .store
                .env_var_by_key(var.app_id, &updated.key, &updated.environment)
                .await?
            {
                if existing.id != var.id {
                    return Err(CoreError::DuplicateKey {
                        key: updated.key,
                        environment: updated.environment,
                    });
                }
            }
        }

        updated.updated_at = Utc::now();
        self.store.update_env_var(&updated).await?;
        // The audit entry names the key as it was when the action ran,
        // even if this call renamed it.
        self.events
            .append(
                var.app_id,
                "env_var_updated",
                Some(json!({"key": &var.key})),
                None,
                None,
            )
            .await?;
        Ok(())
    }

    /// Deletes one variable.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Unauthorized` as in [`get`](Self::get).
    pub async fn remove(&self, caller: Uuid, env_var_id: Uuid) -> Result<(), CoreError> {
        let var = self.fetch_owned(caller, env_var_id).await?;
        self.store.delete_env_var(env_var_id).await?;
        self.events
            .append(
                var.app_id,
                "env_var_deleted",
                Some(json!({"key": &var.key})),
                None,
                None,
            )
            .await?;
        Ok(())
    }

    /// Upserts a batch keyed by (key, environment), sequentially and in
    /// order. Existing records get their value, encryption flag,
    /// description, and `updated_at` overwritten; missing ones are
    /// created. A failing entry aborts the remainder of the batch without
    /// rolling back entries already applied.
    ///
    /// Emits exactly one `env_vars_bulk_imported` summary event for the
    /// batch (count 0 for an empty batch), never per-entry events.
    pub async fn bulk_import(
        &self,
        caller: Uuid,
        app_id: Uuid,
        entries: Vec<NewEnvVar>,
    ) -> Result<Vec<ImportOutcome>, CoreError> {
        require_owner(self.store.as_ref(), app_id, caller).await?;
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            validate_entry(&entry)?;
            let key = entry.key.clone();
            let existing = self
                .store
                .env_var_by_key(app_id, &entry.key, &entry.environment)
                .await?;
            let now = Utc::now();
            let action = if let Some(mut current) = existing {
                current.value = stored_value(&entry.value, entry.is_encrypted);
                current.is_encrypted = entry.is_encrypted;
                current.description = entry.description;
                current.updated_at = now;
                self.store.update_env_var(&current).await?;
                ImportAction::Updated
            } else {
                let var = EnvVar {
                    id: Uuid::new_v4(),
                    app_id,
                    key: entry.key,
                    value: stored_value(&entry.value, entry.is_encrypted),
                    is_encrypted: entry.is_encrypted,
                    environment: entry.environment,
                    description: entry.description,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_env_var(&var).await?;
                ImportAction::Created
            };
            outcomes.push(ImportOutcome { key, action });
        }
        let count = outcomes.len();
        self.events
            .append(
                app_id,
                "env_vars_bulk_imported",
                Some(json!({"count": count})),
                None,
                None,
            )
            .await?;
        tracing::debug!(app_id = %app_id, count, "bulk import applied");
        Ok(outcomes)
    }

    async fn fetch_owned(&self, caller: Uuid, env_var_id: Uuid) -> Result<EnvVar, CoreError> {
        let Some(var) = self.store.env_var(env_var_id).await? else {
            return Err(CoreError::NotFound(
                "environment variable not found".to_owned(),
            ));
        };
        require_owner(self.store.as_ref(), var.app_id, caller).await?;
        Ok(var)
    }
}

fn stored_value(plain: &str, encrypt: bool) -> String {
    if encrypt {
        codec::encode(plain)
    } else {
        plain.to_owned()
    }
}

fn masked_view(var: EnvVar) -> EnvVarView {
    let decrypted_value = if var.is_encrypted {
        codec::decode(&var.value)
    } else {
        var.value.clone()
    };
    let value = if var.is_encrypted {
        MASKED_VALUE.to_owned()
    } else {
        var.value
    };
    EnvVarView {
        id: var.id,
        app_id: var.app_id,
        key: var.key,
        value,
        decrypted_value,
        is_encrypted: var.is_encrypted,
        environment: var.environment,
        description: var.description,
        created_at: var.created_at,
        updated_at: var.updated_at,
    }
}

fn validate_entry(entry: &NewEnvVar) -> Result<(), CoreError> {
    if entry.key.trim().is_empty() {
        return Err(CoreError::Validation("key must not be empty".to_owned()));
    }
    if entry.value.is_empty() {
        return Err(CoreError::Validation("value must not be empty".to_owned()));
    }
    if entry.environment.trim().is_empty() {
        return Err(CoreError::Validation(
            "environment must not be empty".to_owned(),
        ));
    }
    Ok(())
}
