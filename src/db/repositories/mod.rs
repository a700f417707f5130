//! Repository implementations.
//!
//! - `local`: in-memory backend for unit testing and local development
//! - `postgres`: PostgreSQL backend with Diesel (feature `postgres-repo`)

pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
