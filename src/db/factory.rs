//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration. The selected
//! instance is handed to the application as an `Arc<dyn FullRepository>`;
//! there is no process-wide registry.

use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::{PostgresConfig, PostgresRepository};
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Repository backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Select the backend from the environment.
    ///
    /// Reads `REPOSITORY_TYPE`; otherwise Postgres when `DATABASE_URL` is
    /// present, Local when it is not.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }
        if std::env::var("DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

/// Factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Backend to create
    /// * `database_url` - Connection string for the Postgres backend;
    ///   falls back to the environment when `None`
    pub fn create(
        repo_type: RepositoryType,
        database_url: Option<&str>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => {
                let config = match database_url {
                    Some(url) => PostgresConfig::with_url(url),
                    None => PostgresConfig::from_env().map_err(RepositoryError::configuration)?,
                };
                Ok(Arc::new(PostgresRepository::new(config)?))
            }
            #[cfg(not(feature = "postgres-repo"))]
            RepositoryType::Postgres => {
                let _ = database_url;
                Err(RepositoryError::configuration(
                    "postgres backend requested but the postgres-repo feature is not enabled",
                ))
            }
        }
    }

    /// Create an in-memory repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_type_parses_known_names() {
        assert_eq!("local".parse::<RepositoryType>(), Ok(RepositoryType::Local));
        assert_eq!("pg".parse::<RepositoryType>(), Ok(RepositoryType::Postgres));
        assert!("bolt".parse::<RepositoryType>().is_err());
    }

    #[test]
    fn local_factory_yields_empty_repository() {
        let repo = RepositoryFactory::create(RepositoryType::Local, None).unwrap();
        // A fresh repository reports healthy.
        let healthy = futures::executor::block_on(repo.health_check()).unwrap();
        assert!(healthy);
    }
}
