//! Server configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// PostgreSQL persistent storage.
    Postgres { url: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GANTRY_BIND_ADDR` — full bind address (overrides `PORT`, default: `0.0.0.0:8200`)
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `GANTRY_STORAGE` — `memory` or `postgres` (default: `memory`)
    /// - `DATABASE_URL` — PostgreSQL connection string (required when `GANTRY_STORAGE=postgres`)
    /// - `GANTRY_LOG` — log filter (default: `info`)
    #[must_use]
    pub fn from_env() -> Self {
        // Priority: GANTRY_BIND_ADDR > PORT > default 0.0.0.0:8200
        let bind_addr = if let Ok(addr) = std::env::var("GANTRY_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8200)))
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8200);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([0, 0, 0, 0], 8200))
        };

        let storage_backend = match std::env::var("GANTRY_STORAGE")
            .unwrap_or_else(|_| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => {
                let url = std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/gantry".to_owned());
                StorageBackendType::Postgres { url }
            }
            _ => StorageBackendType::Memory,
        };

        let log_level = std::env::var("GANTRY_LOG").unwrap_or_else(|_| "info".to_owned());

        Self {
            bind_addr,
            storage_backend,
            log_level,
        }
    }
}
