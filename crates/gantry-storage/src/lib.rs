//! PostgreSQL storage backend for gantry.
//!
//! Implements the [`gantry_core::store::Store`] trait over a `sqlx`
//! connection pool. The schema is bootstrapped at connect time; foreign
//! keys carry `ON DELETE CASCADE` so deleting an app sweeps every scoped
//! record, and the metric rollup table's composite primary key backs the
//! atomic upsert-increment.
//!
//! The in-memory backend lives next to the trait in `gantry-core`; this
//! crate only exists so the core stays free of database dependencies.

mod postgres;

pub use postgres::PostgresStore;
