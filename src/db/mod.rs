//! Storage module for pipeline data.
//!
//! Database operations go through the Repository pattern so storage
//! backends can be swapped:
//!
//! - `repository`: trait definitions and error types
//! - `repositories::local`: in-memory backend for unit testing and local
//!   development
//! - `repositories::postgres`: Postgres backend with Diesel
//!   (feature `postgres-repo`)
//! - `services`: business logic functions handlers are wired against
//! - `factory`: creates repository instances from configuration

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;
pub mod services;


pub use factory::{RepositoryFactory, RepositoryType};
pub use repository::{FullRepository, RepositoryError, RepositoryResult};
