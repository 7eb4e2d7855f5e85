//! Repository backend implementations.
//!
//! The in-memory backend is always available; Postgres support is compiled
//! in with the `postgres-repo` feature. Which backend a process actually
//! uses is decided by the factory at startup.

pub mod local;

#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;

#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
