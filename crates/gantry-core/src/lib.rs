//! Core library for gantry, a multi-tenant app control plane.
//!
//! Contains the domain model, the obfuscation codec, the environment
//! variable store, the event log, the metrics aggregator, and the [`store::Store`]
//! persistence trait with its in-memory backend. This crate knows nothing
//! about HTTP or any concrete database; `gantry-storage` provides the
//! PostgreSQL backend and `gantry-server` the API surface.

pub mod apps;
pub mod codec;
pub mod env_vars;
pub mod error;
pub mod events;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod store;
