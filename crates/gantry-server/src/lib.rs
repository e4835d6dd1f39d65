//! Gantry HTTP server.
//!
//! Wires the core engines and a storage backend into an Axum server. All
//! API routes live under `/v1` and speak JSON; every route except signup
//! requires an API key via `Authorization: Bearer`.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
