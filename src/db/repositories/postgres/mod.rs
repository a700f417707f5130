//! PostgreSQL repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{max, min};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::api::{Consumer, PipelineId, PipelineStatistic};
use crate::db::repository::{
    assemble_statistic, DatapointRepository, ErrorContext, PipelineRecord, PipelineRepository,
    RepositoryError, RepositoryResult, DATAPOINT_BATCH_SIZE, STATISTICS_WINDOW_DAYS,
};

mod models;
mod schema;

use models::*;
use schema::{consumers, datapoints, pipeline_intake, pipelines};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let parse = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse("PG_POOL_MAX", 10) as u32,
            min_pool_size: parse("PG_POOL_MIN", 1) as u32,
            connection_timeout_sec: parse("PG_CONN_TIMEOUT_SEC", 30),
            max_retries: parse("PG_MAX_RETRIES", 3) as u32,
            retry_delay_ms: parse("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    /// Execute a database operation with automatic retry for transient
    /// failures, off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl PipelineRepository for PostgresRepository {
    async fn list_pipelines(&self) -> RepositoryResult<Vec<PipelineRecord>> {
        let rows = self
            .with_conn(|conn| {
                Ok(pipelines::table
                    .order(pipelines::id.asc())
                    .select(PipelineRow::as_select())
                    .load::<PipelineRow>(conn)?)
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_pipeline(&self, id: &PipelineId) -> RepositoryResult<PipelineRecord> {
        let pid = id.value().to_string();
        self.with_conn(move |conn| {
            let row = pipelines::table
                .find(pid.clone())
                .select(PipelineRow::as_select())
                .first::<PipelineRow>(conn)
                .optional()?;
            row.map(Into::into).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("pipeline {} not found", pid),
                    ErrorContext::new("get_pipeline")
                        .with_entity("pipeline")
                        .with_entity_id(&pid),
                )
            })
        })
        .await
    }

    async fn insert_pipeline(&self, record: &PipelineRecord) -> RepositoryResult<()> {
        let row = NewPipelineRow::from(record);
        self.with_conn(move |conn| {
            diesel::insert_into(pipelines::table)
                .values(&row)
                .on_conflict(pipelines::id)
                .do_update()
                .set((
                    pipelines::name.eq(excluded(pipelines::name)),
                    pipelines::description.eq(excluded(pipelines::description)),
                    pipelines::active.eq(excluded(pipelines::active)),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn update_pipeline(
        &self,
        id: &PipelineId,
        name: &str,
        description: &str,
    ) -> RepositoryResult<PipelineRecord> {
        let pid = id.value().to_string();
        let name = name.to_string();
        let description = description.to_string();
        self.with_conn(move |conn| {
            let updated = diesel::update(pipelines::table.find(pid.clone()))
                .set((
                    pipelines::name.eq(name.clone()),
                    pipelines::description.eq(description.clone()),
                ))
                .returning(PipelineRow::as_returning())
                .get_result::<PipelineRow>(conn)
                .optional()?;
            updated.map(Into::into).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("pipeline {} not found", pid),
                    ErrorContext::new("update_pipeline")
                        .with_entity("pipeline")
                        .with_entity_id(&pid),
                )
            })
        })
        .await
    }

    async fn delete_pipeline(&self, id: &PipelineId) -> RepositoryResult<bool> {
        let pid = id.value().to_string();
        self.with_conn(move |conn| {
            conn.transaction::<bool, RepositoryError, _>(|conn| {
                let deleted = diesel::delete(pipelines::table.find(pid.clone())).execute(conn)?;
                diesel::delete(
                    pipeline_intake::table.filter(pipeline_intake::pipeline_id.eq(&pid)),
                )
                .execute(conn)?;
                diesel::delete(datapoints::table.filter(datapoints::pipeline_id.eq(&pid)))
                    .execute(conn)?;
                diesel::delete(consumers::table.filter(consumers::pipeline_id.eq(&pid)))
                    .execute(conn)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn retrieve_statistics(
        &self,
        id: &PipelineId,
        today: NaiveDate,
    ) -> RepositoryResult<PipelineStatistic> {
        let pid = id.value().to_string();
        self.with_conn(move |conn| {
            let start = today - chrono::Days::new((STATISTICS_WINDOW_DAYS - 1) as u64);
            let rows: Vec<(NaiveDate, i64)> = pipeline_intake::table
                .filter(pipeline_intake::pipeline_id.eq(&pid))
                .filter(pipeline_intake::day.between(start, today))
                .select((pipeline_intake::day, pipeline_intake::intake))
                .load(conn)?;
            let counters: HashMap<NaiveDate, i64> = rows.into_iter().collect();
            Ok(assemble_statistic(today, |date| {
                counters.get(&date).copied().unwrap_or(0)
            }))
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }
}

#[async_trait]
impl DatapointRepository for PostgresRepository {
    async fn push_datapoint(
        &self,
        id: &PipelineId,
        value: &str,
        day: NaiveDate,
    ) -> RepositoryResult<i64> {
        let pid = id.value().to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<i64, RepositoryError, _>(|conn| {
                // Unknown pipelines are created on the fly for dynamically
                // addressed queues.
                diesel::insert_into(pipelines::table)
                    .values(&NewPipelineRow {
                        id: pid.clone(),
                        name: pid.clone(),
                        description: "Dynamically generated pipeline".to_string(),
                        active: true,
                    })
                    .on_conflict(pipelines::id)
                    .do_nothing()
                    .execute(conn)?;

                let head: i64 = datapoints::table
                    .filter(datapoints::pipeline_id.eq(&pid))
                    .select(max(datapoints::idx))
                    .first::<Option<i64>>(conn)?
                    .unwrap_or(0);
                let index = head + 1;

                diesel::insert_into(datapoints::table)
                    .values(&NewDatapointRow {
                        pipeline_id: pid.clone(),
                        idx: index,
                        value: value.clone(),
                    })
                    .execute(conn)?;

                diesel::insert_into(pipeline_intake::table)
                    .values(&NewIntakeRow {
                        pipeline_id: pid.clone(),
                        day,
                        intake: 1,
                    })
                    .on_conflict((pipeline_intake::pipeline_id, pipeline_intake::day))
                    .do_update()
                    .set(pipeline_intake::intake.eq(pipeline_intake::intake + 1_i64))
                    .execute(conn)?;

                Ok(index)
            })
        })
        .await
    }

    async fn pop_datapoints(
        &self,
        id: &PipelineId,
        consumer_id: &str,
    ) -> RepositoryResult<Vec<String>> {
        let pid = id.value().to_string();
        let cid = consumer_id.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<Vec<String>, RepositoryError, _>(|conn| {
                let head: i64 = datapoints::table
                    .filter(datapoints::pipeline_id.eq(&pid))
                    .select(max(datapoints::idx))
                    .first::<Option<i64>>(conn)?
                    .unwrap_or(0);

                let existing: Option<i64> = consumers::table
                    .find((pid.clone(), cid.clone()))
                    .select(consumers::pointer)
                    .first(conn)
                    .optional()?;

                let pointer = match existing {
                    Some(pointer) => pointer,
                    None => {
                        // New consumers start at the first retained datapoint.
                        let first: i64 = datapoints::table
                            .filter(datapoints::pipeline_id.eq(&pid))
                            .select(min(datapoints::idx))
                            .first::<Option<i64>>(conn)?
                            .map(|lowest| lowest - 1)
                            .unwrap_or(0);
                        diesel::insert_into(consumers::table)
                            .values(&NewConsumerRow {
                                pipeline_id: pid.clone(),
                                consumer_id: cid.clone(),
                                pointer: first,
                            })
                            .execute(conn)?;
                        first
                    }
                };

                let readable = head - pointer;
                if readable <= 0 {
                    return Ok(Vec::new());
                }
                let taken = readable.min(DATAPOINT_BATCH_SIZE as i64);

                let values: Vec<String> = datapoints::table
                    .filter(datapoints::pipeline_id.eq(&pid))
                    .filter(datapoints::idx.gt(pointer))
                    .order(datapoints::idx.asc())
                    .limit(taken)
                    .select(datapoints::value)
                    .load(conn)?;

                diesel::update(consumers::table.find((pid.clone(), cid.clone())))
                    .set(consumers::pointer.eq(pointer + taken))
                    .execute(conn)?;

                Ok(values)
            })
        })
        .await
    }

    async fn list_consumers(&self, id: &PipelineId) -> RepositoryResult<Vec<Consumer>> {
        let pid = id.value().to_string();
        self.with_conn(move |conn| {
            let head: i64 = datapoints::table
                .filter(datapoints::pipeline_id.eq(&pid))
                .select(max(datapoints::idx))
                .first::<Option<i64>>(conn)?
                .unwrap_or(0);

            let rows: Vec<ConsumerRow> = consumers::table
                .filter(consumers::pipeline_id.eq(&pid))
                .order(consumers::consumer_id.asc())
                .select((consumers::consumer_id, consumers::pointer))
                .load(conn)?;

            Ok(rows
                .into_iter()
                .map(|row| Consumer {
                    id: row.consumer_id,
                    unread_elements: head - row.pointer,
                })
                .collect())
        })
        .await
    }
}
