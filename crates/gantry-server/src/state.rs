//! Shared application state.
//!
//! One [`AppState`] is built at startup and cloned into every handler. It
//! holds the storage backend plus the four domain engines; cloning is
//! cheap because the engines share the store behind `Arc`.

use std::sync::Arc;

use gantry_core::apps::AppDirectory;
use gantry_core::env_vars::EnvVarStore;
use gantry_core::events::EventLog;
use gantry_core::metrics::MetricsAggregator;
use gantry_core::store::Store;

/// Shared application state passed to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend, used directly by the auth paths.
    pub store: Arc<dyn Store>,
    /// App CRUD and ownership root.
    pub apps: AppDirectory,
    /// Environment variable engine.
    pub env_vars: EnvVarStore,
    /// Append-only event log.
    pub events: EventLog,
    /// Daily rollups and usage summaries.
    pub metrics: MetricsAggregator,
}

impl AppState {
    /// Wire the engines over one shared store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        let metrics = MetricsAggregator::new(Arc::clone(&store));
        let events = EventLog::new(Arc::clone(&store), metrics.clone());
        let env_vars = EnvVarStore::new(Arc::clone(&store), events.clone());
        let apps = AppDirectory::new(Arc::clone(&store));
        Self {
            store,
            apps,
            env_vars,
            events,
            metrics,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
